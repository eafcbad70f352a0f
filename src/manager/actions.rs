//! Before/after wrappers around vault and strategy actions.

use super::SnapshotManager;
use crate::chain::{Call, Chain, Overrides, ProtocolSystem, Receipt, Transaction};
use crate::entities::TrackedUsers;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::types::{ActionParams, SettType};
use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::debug;

/// Everything observed while running one action.
#[derive(Clone, Debug)]
pub struct ActionOutcome {
    pub before: Arc<Snapshot>,
    pub after: Arc<Snapshot>,
    /// Parameters handed to confirmation; absent for tend and harvest.
    pub params: Option<ActionParams>,
    pub receipt: Receipt,
}

impl<C: Chain, P: ProtocolSystem> SnapshotManager<C, P> {
    /// Run `tend()` on the strategy.
    pub fn sett_tend(&self, overrides: &Overrides, confirm: bool) -> Result<ActionOutcome> {
        let tx = Transaction::new(overrides, self.ctx.strategy, "tend()");
        let outcome = self.around("tend", overrides, &tx, None)?;
        if confirm {
            self.resolver.confirm_tend(&outcome.before, &outcome.after)?;
        }
        Ok(outcome)
    }

    /// Run `harvest()` on the strategy.
    pub fn sett_harvest(&self, overrides: &Overrides, confirm: bool) -> Result<ActionOutcome> {
        let tx = Transaction::new(overrides, self.ctx.strategy, "harvest()");
        let outcome = self.around("harvest", overrides, &tx, None)?;
        if confirm {
            self.resolver
                .confirm_harvest(&outcome.before, &outcome.after, &outcome.receipt)?;
        }
        Ok(outcome)
    }

    /// Deposit `amount` of want into the vault.
    pub fn sett_deposit(&self, amount: U256, overrides: &Overrides, confirm: bool) -> Result<ActionOutcome> {
        let tx = Transaction::new(overrides, self.ctx.sett, "deposit(uint256)").with_arg(amount);
        let params = self.action_params(overrides.from, Some(amount))?;
        let outcome = self.around("deposit", overrides, &tx, Some(params.clone()))?;
        if confirm {
            self.resolver.confirm_deposit(&outcome.before, &outcome.after, &params)?;
        }
        Ok(outcome)
    }

    /// Deposit the sender's whole want balance.
    ///
    /// The balance is read before the "before" snapshot and recorded as the
    /// action amount.
    pub fn sett_deposit_all(&self, overrides: &Overrides, confirm: bool) -> Result<ActionOutcome> {
        let amount = self.chain.read_uint(&Call::balance_of(self.ctx.want, overrides.from))?;
        let tx = Transaction::new(overrides, self.ctx.sett, "depositAll()");
        let params = self.action_params(overrides.from, Some(amount))?;
        let outcome = self.around("depositAll", overrides, &tx, Some(params.clone()))?;
        if confirm {
            self.resolver.confirm_deposit(&outcome.before, &outcome.after, &params)?;
        }
        Ok(outcome)
    }

    /// Move idle vault want into the strategy.
    pub fn sett_earn(&self, overrides: &Overrides, confirm: bool) -> Result<ActionOutcome> {
        let tx = Transaction::new(overrides, self.ctx.sett, "earn()");
        let params = ActionParams {
            user: overrides.from,
            amount: None,
            sett_type: self.system.sett_type(),
            shares: None,
        };
        let outcome = self.around("earn", overrides, &tx, Some(params.clone()))?;
        if confirm {
            self.resolver.confirm_earn(&outcome.before, &outcome.after, &params)?;
        }
        Ok(outcome)
    }

    /// Redeem `amount` vault shares.
    pub fn sett_withdraw(&self, amount: U256, overrides: &Overrides, confirm: bool) -> Result<ActionOutcome> {
        let tx = Transaction::new(overrides, self.ctx.sett, "withdraw(uint256)").with_arg(amount);
        let params = self.action_params(overrides.from, Some(amount))?;
        let outcome = self.around("withdraw", overrides, &tx, Some(params.clone()))?;
        if confirm {
            self.resolver.confirm_withdraw(&outcome.before, &outcome.after, &params)?;
        }
        Ok(outcome)
    }

    /// Redeem every vault share the sender holds.
    pub fn sett_withdraw_all(&self, overrides: &Overrides, confirm: bool) -> Result<ActionOutcome> {
        let shares = self.chain.read_uint(&Call::balance_of(self.ctx.sett, overrides.from))?;
        let tx = Transaction::new(overrides, self.ctx.sett, "withdraw(uint256)").with_arg(shares);
        let params = self.action_params(overrides.from, Some(shares))?;
        let outcome = self.around("withdrawAll", overrides, &tx, Some(params.clone()))?;
        if confirm {
            self.resolver.confirm_withdraw(&outcome.before, &outcome.after, &params)?;
        }
        Ok(outcome)
    }

    /// Snapshot, send `tx`, snapshot again, with the sender tracked as `user`.
    fn around(
        &self,
        action: &'static str,
        overrides: &Overrides,
        tx: &Transaction,
        params: Option<ActionParams>,
    ) -> Result<ActionOutcome> {
        debug!(action, user = %overrides.from, "running action");
        let tracked = tracked_user(overrides.from);

        let before = self.snap(&tracked)?;
        let receipt = self.chain.send(tx)?;
        let after = self.snap(&tracked)?;

        debug!(action, from = before.block().0, to = after.block().0, "action captured");
        Ok(ActionOutcome {
            before,
            after,
            params,
            receipt,
        })
    }

    /// Parameter record for amount-carrying actions.
    ///
    /// Rebasing vaults also record the amount as shares, which stay fixed
    /// across rebases.
    fn action_params(&self, user: Address, amount: Option<U256>) -> Result<ActionParams> {
        let sett_type = self.system.sett_type();
        let shares = match (sett_type, amount) {
            (SettType::Digg, Some(amount)) => Some(self.system.fragments_to_shares(amount)?),
            _ => None,
        };
        Ok(ActionParams {
            user,
            amount,
            sett_type,
            shares,
        })
    }
}

fn tracked_user(user: Address) -> TrackedUsers {
    let mut tracked = TrackedUsers::new();
    tracked.insert("user".to_string(), user);
    tracked
}
