//! Seams to the chain connection and the deployed protocol system.
//!
//! Both are external collaborators: the test framework supplies the
//! implementations, this crate only observes and drives them.

use crate::error::{Result, SnapshotError};
use crate::types::{BlockHeight, SettType, Value};
use alloy_primitives::{Address, U256};

/// A read-only contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub target: Address,
    /// Function signature, e.g. `balanceOf(address)`.
    pub signature: String,
    pub args: Vec<Value>,
}

impl Call {
    pub fn new(target: Address, signature: impl Into<String>) -> Self {
        Self {
            target,
            signature: signature.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `balanceOf(holder)` on an ERC20 token.
    pub fn balance_of(token: Address, holder: Address) -> Self {
        Self::new(token, "balanceOf(address)").with_arg(holder)
    }
}

/// Values returned by one batched read, all observed at `block`.
#[derive(Clone, Debug)]
pub struct BatchResult {
    pub block: BlockHeight,
    pub values: Vec<Value>,
}

/// Sender-side options of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overrides {
    pub from: Address,
}

impl From<Address> for Overrides {
    fn from(sender: Address) -> Self {
        Self { from: sender }
    }
}

/// A state-changing contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    pub signature: String,
    pub args: Vec<Value>,
}

impl Transaction {
    pub fn new(overrides: &Overrides, to: Address, signature: impl Into<String>) -> Self {
        Self {
            from: overrides.from,
            to,
            signature: signature.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub block: BlockHeight,
    pub gas_used: u64,
    /// Names of the events emitted, in order.
    pub events: Vec<String>,
}

impl Receipt {
    pub fn emitted(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }
}

/// Connection to the chain under test.
pub trait Chain {
    /// Current chain height.
    fn height(&self) -> Result<BlockHeight>;

    /// Perform a single read at the current height.
    fn read(&self, call: &Call) -> Result<Value>;

    /// Perform all reads in one round trip.
    ///
    /// Implementations must observe every call at the same height and either
    /// return one value per call, in order, or fail as a whole.
    fn read_batch(&self, calls: &[Call]) -> Result<BatchResult>;

    /// Send a transaction and wait for its receipt.
    fn send(&self, tx: &Transaction) -> Result<Receipt>;

    /// Read a call expected to return an address.
    fn read_address(&self, call: &Call) -> Result<Address> {
        self.read(call)?
            .as_address()
            .ok_or_else(|| unexpected(call, "address"))
    }

    /// Read a call expected to return an integer.
    fn read_uint(&self, call: &Call) -> Result<U256> {
        self.read(call)?
            .as_uint()
            .ok_or_else(|| unexpected(call, "integer"))
    }

    /// Read a call expected to return a string.
    fn read_text(&self, call: &Call) -> Result<String> {
        match self.read(call)? {
            Value::Text(s) => Ok(s),
            _ => Err(unexpected(call, "string")),
        }
    }
}

fn unexpected(call: &Call, expected: &'static str) -> SnapshotError {
    SnapshotError::UnexpectedValue {
        what: format!("{}.{}", call.target, call.signature),
        expected,
    }
}

/// Handle to the deployed protocol.
pub trait ProtocolSystem {
    /// Vault registered under `key`.
    fn sett(&self, key: &str) -> Result<Address>;

    /// Strategy backing the vault registered under `key`.
    fn strategy(&self, key: &str) -> Result<Address>;

    /// Classification of the vaults this system deploys.
    fn sett_type(&self) -> SettType;

    /// Convert rebasing-token fragments to index-invariant shares.
    fn fragments_to_shares(&self, fragments: U256) -> Result<U256>;
}
