//! Fields and checks shared by every vault regardless of strategy.

use super::{Resolver, SettContext};
use crate::chain::{Call, Receipt};
use crate::entities::EntityRegistry;
use crate::error::{Result, SnapshotError};
use crate::multicall::Multicall;
use crate::snapshot::Snapshot;
use crate::types::{ActionParams, Delta, SettType, SnapshotKey};
use alloy_primitives::{Address, U256};
use std::collections::BTreeMap;

/// Vault-level fields: (snapshot field, getter).
const SETT_FIELDS: [(&str, &str); 4] = [
    ("available", "available()"),
    ("pricePerFullShare", "getPricePerFullShare()"),
    ("totalSupply", "totalSupply()"),
    ("balance", "balance()"),
];

/// Strategy-level fields: (snapshot field, getter).
const STRATEGY_FIELDS: [(&str, &str); 3] = [
    ("balanceOf", "balanceOf()"),
    ("balanceOfPool", "balanceOfPool()"),
    ("balanceOfWant", "balanceOfWant()"),
];

/// Tracks the want token and vault shares of every entity, plus the core
/// vault and strategy accounting.
#[derive(Clone, Debug)]
pub struct SettCoreResolver {
    ctx: SettContext,
    no_destinations: BTreeMap<String, Address>,
}

impl SettCoreResolver {
    pub fn new(ctx: SettContext) -> Self {
        Self {
            ctx,
            no_destinations: BTreeMap::new(),
        }
    }

    pub fn context(&self) -> &SettContext {
        &self.ctx
    }

    /// Tokens whose balances are captured: the want and the vault share.
    pub fn tokens(&self) -> [(&'static str, Address); 2] {
        [("want", self.ctx.want), ("sett", self.ctx.sett)]
    }
}

/// Change of `key` between two snapshots.
pub(crate) fn delta(before: &Snapshot, after: &Snapshot, key: &SnapshotKey) -> Result<Delta> {
    Ok(Delta::between(before.get(key)?, after.get(key)?))
}

/// Fail the confirmation of `action` unless `ok` holds.
pub(crate) fn ensure(action: &'static str, ok: bool, check: impl FnOnce() -> String) -> Result<()> {
    if ok {
        return Ok(());
    }
    let check = check();
    tracing::warn!(action, %check, "confirmation failed");
    Err(SnapshotError::ConfirmationFailed { action, check })
}

fn required_amount(action: &'static str, params: &ActionParams) -> Result<U256> {
    params.amount.ok_or_else(|| SnapshotError::ConfirmationFailed {
        action,
        check: "no amount recorded for action".to_string(),
    })
}

impl Resolver for SettCoreResolver {
    fn name(&self) -> &str {
        "SettCore"
    }

    fn strategy_destinations(&self) -> &BTreeMap<String, Address> {
        &self.no_destinations
    }

    fn add_balances_snap(&self, calls: &mut Multicall, entities: &EntityRegistry) {
        for (token, token_addr) in self.tokens() {
            for (alias, holder) in entities.iter() {
                calls.push(
                    SnapshotKey::balance(token, alias),
                    Call::balance_of(token_addr, holder),
                );
            }
        }
    }

    fn add_sett_snap(&self, calls: &mut Multicall) {
        for (field, getter) in SETT_FIELDS {
            calls.push(SnapshotKey::sett(field), Call::new(self.ctx.sett, getter));
        }
    }

    fn add_strategy_snap(&self, calls: &mut Multicall) {
        for (field, getter) in STRATEGY_FIELDS {
            calls.push(SnapshotKey::strategy(field), Call::new(self.ctx.strategy, getter));
        }
    }

    fn confirm_tend(&self, before: &Snapshot, after: &Snapshot) -> Result<()> {
        let pool = delta(before, after, &SnapshotKey::strategy("balanceOfPool"))?;
        ensure("tend", !matches!(pool, Delta::Decrease(_)), || {
            format!("strategy.balanceOfPool dropped by {}", pool)
        })
    }

    fn confirm_harvest(&self, before: &Snapshot, after: &Snapshot, receipt: &Receipt) -> Result<()> {
        tracing::debug!(block = receipt.block.0, events = receipt.events.len(), "confirming harvest");
        let ppfs = delta(before, after, &SnapshotKey::sett("pricePerFullShare"))?;
        ensure("harvest", !matches!(ppfs, Delta::Decrease(_)), || {
            format!("sett.pricePerFullShare dropped by {}", ppfs)
        })
    }

    fn confirm_deposit(&self, before: &Snapshot, after: &Snapshot, params: &ActionParams) -> Result<()> {
        const ACTION: &str = "deposit";
        let amount = required_amount(ACTION, params)?;

        let user_want = delta(before, after, &SnapshotKey::balance("want", "user"))?;
        let sett_want = delta(before, after, &SnapshotKey::balance("want", "sett"))?;
        let user_shares = delta(before, after, &SnapshotKey::balance("sett", "user"))?;
        let supply = delta(before, after, &SnapshotKey::sett("totalSupply"))?;

        match params.sett_type {
            // Rebases between blocks make fragment amounts inexact; the
            // share amount is the only rebase-stable record of the deposit.
            SettType::Digg => {
                let shares = params.shares.ok_or_else(|| SnapshotError::ConfirmationFailed {
                    action: ACTION,
                    check: "no share amount recorded for rebasing vault".to_string(),
                })?;
                ensure(ACTION, amount.is_zero() || !shares.is_zero(), || {
                    format!("{} fragments converted to zero shares", amount)
                })?;
                ensure(ACTION, matches!(user_want, Delta::Decrease(_)), || {
                    format!("user want should decrease, moved {}", user_want)
                })?;
                ensure(ACTION, matches!(sett_want, Delta::Increase(_)), || {
                    format!("sett want should increase, moved {}", sett_want)
                })?;
            }
            SettType::Default => {
                ensure(ACTION, user_want == Delta::Decrease(amount), || {
                    format!("user want moved {}, expected -{}", user_want, amount)
                })?;
                ensure(ACTION, sett_want == Delta::Increase(amount), || {
                    format!("sett want moved {}, expected {}", sett_want, amount)
                })?;
            }
        }

        ensure(ACTION, matches!(user_shares, Delta::Increase(_)), || {
            format!("user shares should increase, moved {}", user_shares)
        })?;
        ensure(ACTION, supply == user_shares, || {
            format!("total supply moved {}, user shares moved {}", supply, user_shares)
        })
    }

    fn confirm_withdraw(&self, before: &Snapshot, after: &Snapshot, params: &ActionParams) -> Result<()> {
        const ACTION: &str = "withdraw";
        let amount = required_amount(ACTION, params)?;

        let user_shares = delta(before, after, &SnapshotKey::balance("sett", "user"))?;
        let supply = delta(before, after, &SnapshotKey::sett("totalSupply"))?;
        let user_want = delta(before, after, &SnapshotKey::balance("want", "user"))?;

        ensure(ACTION, user_shares == Delta::Decrease(amount), || {
            format!("user shares moved {}, expected -{}", user_shares, amount)
        })?;
        ensure(ACTION, supply == Delta::Decrease(amount), || {
            format!("total supply moved {}, expected -{}", supply, amount)
        })?;
        ensure(ACTION, matches!(user_want, Delta::Increase(_)), || {
            format!("user want should increase, moved {}", user_want)
        })
    }

    fn confirm_earn(&self, before: &Snapshot, after: &Snapshot, _params: &ActionParams) -> Result<()> {
        const ACTION: &str = "earn";
        let sett_want = delta(before, after, &SnapshotKey::balance("want", "sett"))?;
        let invested = delta(before, after, &SnapshotKey::strategy("balanceOf"))?;

        let moved = match sett_want {
            Delta::Decrease(v) => v,
            Delta::Unchanged => U256::ZERO,
            other => {
                return ensure(ACTION, false, || format!("sett want should not increase, moved {}", other));
            }
        };
        let expected = if moved.is_zero() {
            Delta::Unchanged
        } else {
            Delta::Increase(moved)
        };
        ensure(ACTION, invested == expected, || {
            format!("strategy.balanceOf moved {}, sett released {}", invested, moved)
        })
    }
}
