//! Diff rows and table rendering for snapshots.

use crate::config::ManagerConfig;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::types::{BlockHeight, Delta, SnapshotKey, Value};
use alloy_primitives::utils::format_units;
use alloy_primitives::Address;
use prettytable::format::{self, TableFormat};
use prettytable::{Cell, Row, Table};

/// One changed field between two snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompareRow {
    pub key: SnapshotKey,
    pub before: Value,
    pub after: Value,
    pub delta: Delta,
}

/// Every field that changed between two snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompareReport {
    pub from_block: BlockHeight,
    pub to_block: BlockHeight,
    pub rows: Vec<CompareRow>,
}

impl CompareReport {
    /// Diff `after` against `before`.
    ///
    /// Walks the keys of `before`; each must also be present in `after`.
    /// Unchanged fields produce no row.
    pub fn between(before: &Snapshot, after: &Snapshot) -> Result<Self> {
        let mut rows = Vec::new();
        for (key, a) in before.iter() {
            let b = after.get(key)?;
            if a != b {
                rows.push(CompareRow {
                    key: key.clone(),
                    before: a.clone(),
                    after: b.clone(),
                    delta: Delta::between(a, b),
                });
            }
        }
        Ok(Self {
            from_block: before.block(),
            to_block: after.block(),
            rows,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, key: &SnapshotKey) -> Option<&CompareRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Grid with one line per changed field.
    pub fn table(&self, formatter: &ValueFormatter) -> Result<Table> {
        let mut table = Table::new();
        table.set_format(grid_format());
        table.set_titles(titles(&["metric", "before", "after", "diff"]));
        for row in &self.rows {
            table.add_row(Row::new(vec![
                Cell::new(&row.key.to_string()),
                Cell::new(&formatter.value(&row.key, &row.before)?),
                Cell::new(&formatter.value(&row.key, &row.after)?),
                Cell::new(&formatter.delta(&row.key, &row.delta)?),
            ]));
        }
        Ok(table)
    }
}

/// Renders values for humans.
///
/// Integers under a key mentioning `balance`, or listed in the configured
/// scaled keys, are divided by `10^decimals`. Everything else is raw.
#[derive(Clone, Debug)]
pub struct ValueFormatter {
    decimals: u8,
    scaled_keys: Vec<SnapshotKey>,
}

impl ValueFormatter {
    pub fn new(config: &ManagerConfig) -> Self {
        Self {
            decimals: config.display_decimals,
            scaled_keys: config.scaled_keys.clone(),
        }
    }

    pub fn is_scaled(&self, key: &SnapshotKey) -> bool {
        key.to_string().contains("balance") || self.scaled_keys.contains(key)
    }

    pub fn value(&self, key: &SnapshotKey, value: &Value) -> Result<String> {
        match value {
            Value::Int(v) if self.is_scaled(key) => Ok(format_units(*v, self.decimals)?),
            other => Ok(other.to_string()),
        }
    }

    pub fn delta(&self, key: &SnapshotKey, delta: &Delta) -> Result<String> {
        if !self.is_scaled(key) {
            return Ok(delta.to_string());
        }
        match delta {
            Delta::Increase(v) => Ok(format_units(*v, self.decimals)?),
            Delta::Decrease(v) => Ok(format!("-{}", format_units(*v, self.decimals)?)),
            other => Ok(other.to_string()),
        }
    }
}

/// Single-snapshot table of every captured field.
pub fn status_table(snap: &Snapshot, hide_zero_balances: bool) -> Table {
    let mut table = Table::new();
    table.set_format(plain_format());
    table.set_titles(titles(&["metric", "value"]));
    for (key, value) in snap.iter() {
        if hide_zero_balances && key.is_balance() && value.is_zero() {
            continue;
        }
        table.add_row(Row::new(vec![
            Cell::new(&key.to_string()),
            Cell::new(&value.to_string()),
        ]));
    }
    table
}

/// Share price and the strategy's idle want.
pub fn basics_table(snap: &Snapshot) -> Result<Table> {
    let mut table = Table::new();
    table.set_format(plain_format());
    table.set_titles(titles(&["metric", "value"]));
    table.add_row(Row::new(vec![
        Cell::new("sett.pricePerFullShare"),
        Cell::new(&snap.get(&SnapshotKey::sett("pricePerFullShare"))?.to_string()),
    ]));
    table.add_row(Row::new(vec![
        Cell::new("strategy.want"),
        Cell::new(&snap.balance_of("want", "strategy")?.to_string()),
    ]));
    Ok(table)
}

/// Role holders of the vault and strategy.
pub fn permissions_table(entries: &[(String, Address)]) -> Table {
    let mut table = Table::new();
    table.set_format(plain_format());
    table.set_titles(titles(&["account", "value"]));
    for (role, holder) in entries {
        table.add_row(Row::new(vec![Cell::new(role), Cell::new(&holder.to_string())]));
    }
    table
}

fn titles(names: &[&str]) -> Row {
    Row::new(names.iter().map(|name| Cell::new(name)).collect())
}

fn grid_format() -> TableFormat {
    *format::consts::FORMAT_BOX_CHARS
}

fn plain_format() -> TableFormat {
    *format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR
}
