//! # Sett Snapshots
//!
//! Before/after state snapshots for vault and strategy tests.
//!
//! ## Core Concepts
//!
//! - **Snapshots**: Immutable maps of balances and contract state, all read at one block
//! - **Resolvers**: Per-strategy policy for which fields to read and what each action must change
//! - **Entities**: Aliased accounts whose balances are tracked (roles, destinations, users)
//! - **Reports**: Diffs between two snapshots, scaled for reading
//!
//! ## Example
//!
//! ```ignore
//! use sett_snapshots::{ManagerConfig, Overrides, SnapshotManager};
//!
//! let manager = SnapshotManager::new(chain, system, "native.renCrv", ManagerConfig::default())?;
//!
//! // Deposit, then check the vault and user balances moved as expected
//! let outcome = manager.sett_deposit(amount, &Overrides::from(user), true)?;
//!
//! // Show what changed
//! manager.print_compare(&outcome.before, &outcome.after)?;
//! ```

pub mod chain;
pub mod config;
pub mod entities;
pub mod error;
pub mod manager;
pub mod multicall;
pub mod report;
pub mod resolvers;
pub mod snapshot;
pub mod types;

// Re-exports
pub use chain::{BatchResult, Call, Chain, Overrides, ProtocolSystem, Receipt, Transaction};
pub use config::ManagerConfig;
pub use entities::{EntityRegistry, Role, TrackedUsers};
pub use error::{Result, SnapshotError};
pub use manager::{ActionOutcome, SnapshotManager};
pub use multicall::Multicall;
pub use report::{CompareReport, CompareRow, ValueFormatter};
pub use resolvers::{
    resolver_for, Resolver, SettContext, SettCoreResolver, StrategyKind, StrategyProfile,
    StrategyResolver,
};
pub use snapshot::Snapshot;
pub use types::*;

pub use alloy_primitives::{Address, U256};
