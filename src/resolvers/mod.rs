//! Strategy-type-specific snapshot policy.
//!
//! A resolver decides which fields a snapshot captures for one kind of
//! strategy and which invariants a before/after pair must satisfy for each
//! action. Resolvers are selected from the strategy's declared name through
//! a closed [`StrategyKind`] table; unknown names are rejected up front.

mod sett_core;
mod strategies;

pub use sett_core::SettCoreResolver;
pub use strategies::{StrategyProfile, StrategyResolver};

use crate::chain::{Chain, Receipt};
use crate::entities::EntityRegistry;
use crate::error::{Result, SnapshotError};
use crate::multicall::Multicall;
use crate::snapshot::Snapshot;
use crate::types::ActionParams;
use alloy_primitives::Address;
use std::collections::BTreeMap;
use std::fmt;

/// Addresses resolved once when a manager is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettContext {
    /// Key of the vault in the protocol system.
    pub key: String,
    pub sett: Address,
    pub strategy: Address,
    pub controller: Address,
    pub want: Address,
}

/// Snapshot policy for one strategy type.
pub trait Resolver {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Contracts the strategy deposits into, keyed by alias.
    fn strategy_destinations(&self) -> &BTreeMap<String, Address>;

    /// Queue a balance read for every (token, entity) pair of interest.
    fn add_balances_snap(&self, calls: &mut Multicall, entities: &EntityRegistry);

    /// Queue vault-level state reads.
    fn add_sett_snap(&self, calls: &mut Multicall);

    /// Queue strategy-level state reads.
    fn add_strategy_snap(&self, calls: &mut Multicall);

    fn confirm_tend(&self, before: &Snapshot, after: &Snapshot) -> Result<()>;

    fn confirm_harvest(&self, before: &Snapshot, after: &Snapshot, receipt: &Receipt) -> Result<()>;

    fn confirm_deposit(&self, before: &Snapshot, after: &Snapshot, params: &ActionParams) -> Result<()>;

    fn confirm_withdraw(&self, before: &Snapshot, after: &Snapshot, params: &ActionParams) -> Result<()>;

    fn confirm_earn(&self, before: &Snapshot, after: &Snapshot, params: &ActionParams) -> Result<()>;
}

/// Every strategy type the snapshot tooling understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    HarvestMetaFarm,
    BadgerRewards,
    BadgerLpMetaFarm,
    /// All curve gauge variants (renBTC, sBTC, tBTC, ...).
    CurveGauge,
    SushiBadgerWbtc,
    SushiLpOptimizer,
    DiggRewards,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::HarvestMetaFarm,
        StrategyKind::BadgerRewards,
        StrategyKind::BadgerLpMetaFarm,
        StrategyKind::CurveGauge,
        StrategyKind::SushiBadgerWbtc,
        StrategyKind::SushiLpOptimizer,
        StrategyKind::DiggRewards,
    ];

    /// Map a strategy's `getName()` to its kind.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "StrategyHarvestMetaFarm" => Ok(StrategyKind::HarvestMetaFarm),
            "StrategyBadgerRewards" => Ok(StrategyKind::BadgerRewards),
            "StrategyBadgerLpMetaFarm" => Ok(StrategyKind::BadgerLpMetaFarm),
            "StrategyCurveGauge"
            | "StrategyCurveGaugeRenBtcCrv"
            | "StrategyCurveGaugeSbtcCrv"
            | "StrategyCurveGaugeTbtcCrv"
            | "StrategyCurveGaugex" => Ok(StrategyKind::CurveGauge),
            "StrategySushiBadgerWbtc" => Ok(StrategyKind::SushiBadgerWbtc),
            "StrategySushiLpOptimizer" => Ok(StrategyKind::SushiLpOptimizer),
            "StrategyDiggRewards" => Ok(StrategyKind::DiggRewards),
            other => Err(SnapshotError::UnknownStrategy(other.to_string())),
        }
    }

    /// Canonical contract name.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::HarvestMetaFarm => "StrategyHarvestMetaFarm",
            StrategyKind::BadgerRewards => "StrategyBadgerRewards",
            StrategyKind::BadgerLpMetaFarm => "StrategyBadgerLpMetaFarm",
            StrategyKind::CurveGauge => "StrategyCurveGauge",
            StrategyKind::SushiBadgerWbtc => "StrategySushiBadgerWbtc",
            StrategyKind::SushiLpOptimizer => "StrategySushiLpOptimizer",
            StrategyKind::DiggRewards => "StrategyDiggRewards",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the resolver for `kind`, reading its destinations from the chain.
pub fn resolver_for<C: Chain + ?Sized>(
    kind: StrategyKind,
    ctx: SettContext,
    chain: &C,
) -> Result<Box<dyn Resolver>> {
    let profile = StrategyProfile::of(kind);
    Ok(Box::new(StrategyResolver::load(kind, profile, ctx, chain)?))
}
