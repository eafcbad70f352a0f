//! Per-strategy additions on top of the core vault resolver.

use super::sett_core::{delta, ensure, SettCoreResolver};
use super::{Resolver, SettContext, StrategyKind};
use crate::chain::{Call, Chain, Receipt};
use crate::entities::EntityRegistry;
use crate::error::Result;
use crate::multicall::Multicall;
use crate::snapshot::Snapshot;
use crate::types::{ActionParams, Delta, SnapshotKey};
use alloy_primitives::Address;
use std::collections::BTreeMap;

/// What a strategy type adds to the core snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyProfile {
    /// Contracts the strategy deposits into: (alias, strategy getter).
    pub destinations: &'static [(&'static str, &'static str)],
    /// Reward tokens tracked alongside want: (token name, strategy getter).
    pub reward_tokens: &'static [(&'static str, &'static str)],
    /// Harvest converts every reward token, leaving none idle on the strategy.
    pub sells_rewards_on_harvest: bool,
}

impl StrategyProfile {
    pub fn of(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::HarvestMetaFarm => StrategyProfile {
                destinations: &[
                    ("harvestVault", "harvestVault()"),
                    ("vaultFarm", "vaultFarm()"),
                    ("metaFarm", "metaFarm()"),
                ],
                reward_tokens: &[("farm", "farm()")],
                sells_rewards_on_harvest: true,
            },
            StrategyKind::BadgerRewards => StrategyProfile {
                destinations: &[("stakingRewards", "geyser()")],
                reward_tokens: &[],
                sells_rewards_on_harvest: false,
            },
            StrategyKind::BadgerLpMetaFarm => StrategyProfile {
                destinations: &[("stakingRewards", "geyser()")],
                reward_tokens: &[("badger", "badger()")],
                sells_rewards_on_harvest: false,
            },
            StrategyKind::CurveGauge => StrategyProfile {
                destinations: &[("gauge", "gauge()"), ("mintr", "mintr()")],
                reward_tokens: &[("crv", "crv()")],
                sells_rewards_on_harvest: true,
            },
            StrategyKind::SushiBadgerWbtc | StrategyKind::SushiLpOptimizer => StrategyProfile {
                destinations: &[("badgerTree", "badgerTree()"), ("chef", "chef()")],
                reward_tokens: &[("sushi", "sushi()"), ("xsushi", "xsushi()")],
                sells_rewards_on_harvest: false,
            },
            StrategyKind::DiggRewards => StrategyProfile {
                destinations: &[("stakingRewards", "geyser()")],
                reward_tokens: &[],
                sells_rewards_on_harvest: false,
            },
        }
    }
}

/// Resolver for one of the known strategy kinds.
#[derive(Clone, Debug)]
pub struct StrategyResolver {
    kind: StrategyKind,
    profile: StrategyProfile,
    core: SettCoreResolver,
    destinations: BTreeMap<String, Address>,
    reward_tokens: BTreeMap<String, Address>,
}

impl StrategyResolver {
    /// Resolve the profile's destination and reward-token getters on chain.
    pub fn load<C: Chain + ?Sized>(
        kind: StrategyKind,
        profile: StrategyProfile,
        ctx: SettContext,
        chain: &C,
    ) -> Result<Self> {
        let destinations = read_getters(chain, ctx.strategy, profile.destinations)?;
        let reward_tokens = read_getters(chain, ctx.strategy, profile.reward_tokens)?;

        Ok(Self {
            kind,
            profile,
            core: SettCoreResolver::new(ctx),
            destinations,
            reward_tokens,
        })
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn reward_tokens(&self) -> &BTreeMap<String, Address> {
        &self.reward_tokens
    }
}

fn read_getters<C: Chain + ?Sized>(
    chain: &C,
    strategy: Address,
    getters: &[(&str, &str)],
) -> Result<BTreeMap<String, Address>> {
    getters
        .iter()
        .map(|(alias, getter)| {
            let addr = chain.read_address(&Call::new(strategy, *getter))?;
            Ok((alias.to_string(), addr))
        })
        .collect()
}

impl Resolver for StrategyResolver {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn strategy_destinations(&self) -> &BTreeMap<String, Address> {
        &self.destinations
    }

    fn add_balances_snap(&self, calls: &mut Multicall, entities: &EntityRegistry) {
        self.core.add_balances_snap(calls, entities);
        for (token, token_addr) in &self.reward_tokens {
            for (alias, holder) in entities.iter() {
                calls.push(
                    SnapshotKey::balance(token.as_str(), alias),
                    Call::balance_of(*token_addr, holder),
                );
            }
        }
    }

    fn add_sett_snap(&self, calls: &mut Multicall) {
        self.core.add_sett_snap(calls);
    }

    fn add_strategy_snap(&self, calls: &mut Multicall) {
        self.core.add_strategy_snap(calls);
    }

    fn confirm_tend(&self, before: &Snapshot, after: &Snapshot) -> Result<()> {
        self.core.confirm_tend(before, after)
    }

    fn confirm_harvest(&self, before: &Snapshot, after: &Snapshot, receipt: &Receipt) -> Result<()> {
        self.core.confirm_harvest(before, after, receipt)?;
        if !self.profile.sells_rewards_on_harvest {
            return Ok(());
        }
        for token in self.reward_tokens.keys() {
            let idle = after.balance_of(token, "strategy")?;
            ensure("harvest", idle.is_zero(), || {
                format!("{} left idle on strategy: {}", token, idle)
            })?;
        }
        Ok(())
    }

    fn confirm_deposit(&self, before: &Snapshot, after: &Snapshot, params: &ActionParams) -> Result<()> {
        self.core.confirm_deposit(before, after, params)
    }

    fn confirm_withdraw(&self, before: &Snapshot, after: &Snapshot, params: &ActionParams) -> Result<()> {
        self.core.confirm_withdraw(before, after, params)
    }

    fn confirm_earn(&self, before: &Snapshot, after: &Snapshot, params: &ActionParams) -> Result<()> {
        self.core.confirm_earn(before, after, params)?;
        // Earned want must land in a destination, not sit on the strategy.
        if self.destinations.is_empty() {
            return Ok(());
        }
        let idle = delta(before, after, &SnapshotKey::balance("want", "strategy"))?;
        ensure("earn", !matches!(idle, Delta::Increase(_)), || {
            format!("want accumulated on strategy: {}", idle)
        })
    }
}
