//! Snapshot orchestration for one vault.
//!
//! The manager resolves which fields to capture for a vault's strategy,
//! captures them in single batched reads, and wraps each mutating vault or
//! strategy action in a before/after snapshot pair:
//!
//! ```text
//! snap(before) -> send action -> snap(after) -> resolver confirmation
//! ```
//!
//! # Example
//!
//! ```ignore
//! let manager = SnapshotManager::new(chain, system, "native.renCrv", ManagerConfig::default())?;
//!
//! let outcome = manager.sett_deposit(amount, &Overrides::from(user), true)?;
//! manager.print_compare(&outcome.before, &outcome.after)?;
//! ```

mod actions;
mod snapshots;

pub use actions::ActionOutcome;
pub use snapshots::SnapshotManager;
