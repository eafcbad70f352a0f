//! In-memory vault, strategy and gauge used by the integration tests.

#![allow(dead_code)]

use parking_lot::RwLock;
use sett_snapshots::{
    Address, BatchResult, BlockHeight, Call, Chain, ProtocolSystem, Receipt, Result, SettType,
    SnapshotError, Transaction, Value, U256,
};
use std::collections::HashMap;

pub const SETT_KEY: &str = "native.renCrv";

/// Fixed cast of accounts.
#[derive(Clone, Copy, Debug)]
pub struct Accounts {
    pub want: Address,
    pub sett: Address,
    pub strategy: Address,
    pub controller: Address,
    pub governance: Address,
    pub rewards: Address,
    pub strategist: Address,
    pub keeper: Address,
    pub guardian: Address,
    pub gauge: Address,
    pub mintr: Address,
    pub crv: Address,
    pub user: Address,
}

impl Accounts {
    pub fn new() -> Self {
        Self {
            want: Address::with_last_byte(0x01),
            sett: Address::with_last_byte(0x02),
            strategy: Address::with_last_byte(0x03),
            controller: Address::with_last_byte(0x04),
            governance: Address::with_last_byte(0x05),
            rewards: Address::with_last_byte(0x06),
            strategist: Address::with_last_byte(0x07),
            keeper: Address::with_last_byte(0x08),
            guardian: Address::with_last_byte(0x09),
            gauge: Address::with_last_byte(0x0a),
            mintr: Address::with_last_byte(0x0b),
            crv: Address::with_last_byte(0x0c),
            user: Address::with_last_byte(0x20),
        }
    }
}

/// `n` whole tokens at 18 decimals.
pub fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18))
}

#[derive(Debug)]
struct SimState {
    block: u64,
    balances: HashMap<(Address, Address), U256>,
    strategy_name: String,
    strategy_want: Address,
    harvest_yield_bps: u64,
    /// Harvest leaves one wei of crv on the strategy.
    leak_crv_on_harvest: bool,
    batches: usize,
}

impl SimState {
    fn balance(&self, token: Address, holder: Address) -> U256 {
        self.balances.get(&(token, holder)).copied().unwrap_or(U256::ZERO)
    }

    fn credit(&mut self, token: Address, holder: Address, amount: U256) {
        *self.balances.entry((token, holder)).or_insert(U256::ZERO) += amount;
    }

    fn debit(&mut self, token: Address, holder: Address, amount: U256) -> Result<()> {
        let current = self.balance(token, holder);
        if current < amount {
            return Err(SnapshotError::Reverted(format!(
                "insufficient balance of {} for {}",
                token, holder
            )));
        }
        self.balances.insert((token, holder), current - amount);
        Ok(())
    }

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> Result<()> {
        self.debit(token, from, amount)?;
        self.credit(token, to, amount);
        Ok(())
    }
}

/// Single-threaded chain simulation. Every transaction mines one block.
pub struct SimChain {
    pub accounts: Accounts,
    state: RwLock<SimState>,
}

impl SimChain {
    pub fn new() -> Self {
        Self::with_strategy("StrategyCurveGaugeRenBtcCrv")
    }

    pub fn with_strategy(name: &str) -> Self {
        let accounts = Accounts::new();
        let state = SimState {
            block: 100,
            balances: HashMap::new(),
            strategy_name: name.to_string(),
            strategy_want: accounts.want,
            harvest_yield_bps: 100,
            leak_crv_on_harvest: false,
            batches: 0,
        };
        Self {
            accounts,
            state: RwLock::new(state),
        }
    }

    /// Give `holder` some want.
    pub fn mint_want(&self, holder: Address, amount: U256) {
        self.state.write().credit(self.accounts.want, holder, amount);
    }

    pub fn set_strategy_want(&self, want: Address) {
        self.state.write().strategy_want = want;
    }

    pub fn leak_crv_on_harvest(&self) {
        self.state.write().leak_crv_on_harvest = true;
    }

    pub fn balance(&self, token: Address, holder: Address) -> U256 {
        self.state.read().balance(token, holder)
    }

    /// Number of batched reads served so far.
    pub fn batches(&self) -> usize {
        self.state.read().batches
    }

    /// Advance the chain without a transaction.
    pub fn mine(&self) {
        self.state.write().block += 1;
    }

    fn total_supply(&self, s: &SimState) -> U256 {
        s.balances
            .iter()
            .filter(|((token, _), _)| *token == self.accounts.sett)
            .fold(U256::ZERO, |acc, (_, v)| acc + *v)
    }

    fn strategy_balance(&self, s: &SimState) -> U256 {
        let a = &self.accounts;
        s.balance(a.want, a.strategy) + s.balance(a.want, a.gauge)
    }

    fn sett_balance(&self, s: &SimState) -> U256 {
        s.balance(self.accounts.want, self.accounts.sett) + self.strategy_balance(s)
    }

    fn price_per_full_share(&self, s: &SimState) -> U256 {
        let supply = self.total_supply(s);
        if supply.is_zero() {
            return units(1);
        }
        self.sett_balance(s) * units(1) / supply
    }

    fn read_in(&self, s: &SimState, call: &Call) -> Result<Value> {
        let a = &self.accounts;
        let t = call.target;
        let value = match call.signature.as_str() {
            "balanceOf(address)" if t == a.want || t == a.sett || t == a.crv => {
                let holder = call
                    .args
                    .first()
                    .and_then(Value::as_address)
                    .ok_or_else(|| SnapshotError::Chain("balanceOf needs a holder".into()))?;
                Value::Int(s.balance(t, holder))
            }
            "controller()" if t == a.sett => Value::Address(a.controller),
            "token()" if t == a.sett => Value::Address(a.want),
            "want()" if t == a.strategy => Value::Address(s.strategy_want),
            "getName()" if t == a.strategy => Value::Text(s.strategy_name.clone()),
            "governance()" if t == a.sett || t == a.strategy => Value::Address(a.governance),
            "strategist()" if t == a.sett || t == a.strategy => Value::Address(a.strategist),
            "keeper()" if t == a.sett || t == a.strategy => Value::Address(a.keeper),
            "guardian()" if t == a.strategy => Value::Address(a.guardian),
            "rewards()" if t == a.controller => Value::Address(a.rewards),
            "gauge()" if t == a.strategy => Value::Address(a.gauge),
            "mintr()" if t == a.strategy => Value::Address(a.mintr),
            "crv()" if t == a.strategy => Value::Address(a.crv),
            "available()" if t == a.sett => Value::Int(s.balance(a.want, a.sett)),
            "getPricePerFullShare()" if t == a.sett => Value::Int(self.price_per_full_share(s)),
            "totalSupply()" if t == a.sett => Value::Int(self.total_supply(s)),
            "balance()" if t == a.sett => Value::Int(self.sett_balance(s)),
            "balanceOf()" if t == a.strategy => Value::Int(self.strategy_balance(s)),
            "balanceOfPool()" if t == a.strategy => Value::Int(s.balance(a.want, a.gauge)),
            "balanceOfWant()" if t == a.strategy => Value::Int(s.balance(a.want, a.strategy)),
            other => {
                return Err(SnapshotError::Chain(format!("no handler for {}.{}", t, other)));
            }
        };
        Ok(value)
    }

    fn apply(&self, s: &mut SimState, tx: &Transaction) -> Result<Vec<String>> {
        let a = self.accounts;
        let arg = || {
            tx.args
                .first()
                .and_then(Value::as_uint)
                .ok_or_else(|| SnapshotError::Reverted(format!("{} needs an amount", tx.signature)))
        };

        match (tx.to, tx.signature.as_str()) {
            (to, "deposit(uint256)") if to == a.sett => {
                let amount = arg()?;
                self.deposit(s, tx.from, amount)?;
                Ok(vec!["Deposit".to_string()])
            }
            (to, "depositAll()") if to == a.sett => {
                let amount = s.balance(a.want, tx.from);
                self.deposit(s, tx.from, amount)?;
                Ok(vec!["Deposit".to_string()])
            }
            (to, "withdraw(uint256)") if to == a.sett => {
                let shares = arg()?;
                if shares.is_zero() || shares > s.balance(a.sett, tx.from) {
                    return Err(SnapshotError::Reverted("withdraw exceeds shares".into()));
                }
                let supply = self.total_supply(s);
                let owed = shares * self.sett_balance(s) / supply;
                s.debit(a.sett, tx.from, shares)?;

                let idle = s.balance(a.want, a.sett);
                let from_sett = if owed < idle { owed } else { idle };
                s.transfer(a.want, a.sett, tx.from, from_sett)?;
                s.transfer(a.want, a.gauge, tx.from, owed - from_sett)?;
                Ok(vec!["Withdraw".to_string()])
            }
            (to, "earn()") if to == a.sett => {
                let idle = s.balance(a.want, a.sett);
                s.transfer(a.want, a.sett, a.gauge, idle)?;
                Ok(vec!["Earn".to_string()])
            }
            (to, "tend()") if to == a.strategy => {
                let idle = s.balance(a.want, a.strategy);
                s.transfer(a.want, a.strategy, a.gauge, idle)?;
                Ok(vec!["Tend".to_string()])
            }
            (to, "harvest()") if to == a.strategy => {
                let pool = s.balance(a.want, a.gauge);
                let gain = pool * U256::from(s.harvest_yield_bps) / U256::from(10_000u64);
                s.credit(a.want, a.gauge, gain);
                if s.leak_crv_on_harvest {
                    s.credit(a.crv, a.strategy, U256::from(1u64));
                }
                Ok(vec!["Harvest".to_string()])
            }
            (to, other) => Err(SnapshotError::Reverted(format!("{} has no {}", to, other))),
        }
    }

    fn deposit(&self, s: &mut SimState, from: Address, amount: U256) -> Result<()> {
        let a = self.accounts;
        let supply = self.total_supply(s);
        let pool = self.sett_balance(s);
        let shares = if supply.is_zero() {
            amount
        } else {
            amount * supply / pool
        };
        s.transfer(a.want, from, a.sett, amount)?;
        s.credit(a.sett, from, shares);
        Ok(())
    }
}

impl Chain for SimChain {
    fn height(&self) -> Result<BlockHeight> {
        Ok(BlockHeight(self.state.read().block))
    }

    fn read(&self, call: &Call) -> Result<Value> {
        let s = self.state.read();
        self.read_in(&s, call)
    }

    fn read_batch(&self, calls: &[Call]) -> Result<BatchResult> {
        let mut s = self.state.write();
        s.batches += 1;
        let values = calls
            .iter()
            .map(|call| self.read_in(&s, call))
            .collect::<Result<Vec<_>>>()?;
        Ok(BatchResult {
            block: BlockHeight(s.block),
            values,
        })
    }

    fn send(&self, tx: &Transaction) -> Result<Receipt> {
        let mut s = self.state.write();
        let events = self.apply(&mut s, tx)?;
        s.block += 1;
        Ok(Receipt {
            block: BlockHeight(s.block),
            gas_used: 50_000,
            events,
        })
    }
}

/// Protocol registry with one vault.
pub struct SimSystem {
    pub accounts: Accounts,
    pub sett_type: SettType,
    /// Shares per fragment for rebasing vaults.
    pub shares_per_fragment: u64,
}

impl SimSystem {
    pub fn new(accounts: Accounts) -> Self {
        Self {
            accounts,
            sett_type: SettType::Default,
            shares_per_fragment: 1,
        }
    }

    pub fn digg(accounts: Accounts, shares_per_fragment: u64) -> Self {
        Self {
            accounts,
            sett_type: SettType::Digg,
            shares_per_fragment,
        }
    }
}

impl ProtocolSystem for SimSystem {
    fn sett(&self, key: &str) -> Result<Address> {
        match key {
            SETT_KEY => Ok(self.accounts.sett),
            other => Err(SnapshotError::UnknownSett(other.to_string())),
        }
    }

    fn strategy(&self, key: &str) -> Result<Address> {
        match key {
            SETT_KEY => Ok(self.accounts.strategy),
            other => Err(SnapshotError::UnknownSett(other.to_string())),
        }
    }

    fn sett_type(&self) -> SettType {
        self.sett_type
    }

    fn fragments_to_shares(&self, fragments: U256) -> Result<U256> {
        Ok(fragments * U256::from(self.shares_per_fragment))
    }
}

/// Route library logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
