//! Manager construction, capture, history and reporting.

use crate::chain::{Call, Chain, ProtocolSystem};
use crate::config::ManagerConfig;
use crate::entities::{EntityRegistry, Role, TrackedUsers};
use crate::error::{Result, SnapshotError};
use crate::multicall::Multicall;
use crate::report::{self, CompareReport, ValueFormatter};
use crate::resolvers::{self, Resolver, SettContext, StrategyKind};
use crate::snapshot::Snapshot;
use crate::types::BlockHeight;
use alloy_primitives::Address;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Captures and compares snapshots of one vault and its strategy.
///
/// The resolver and the base entity registry are fixed at construction, so
/// every snapshot taken by one manager has the same field set for the same
/// tracked users.
pub struct SnapshotManager<C: Chain, P: ProtocolSystem> {
    /// Chain connection (observed, never owned state).
    pub(crate) chain: C,

    /// Deployed protocol.
    pub(crate) system: P,

    /// Addresses resolved at construction.
    pub(crate) ctx: SettContext,

    /// Field selection and confirmation policy.
    pub(crate) resolver: Box<dyn Resolver>,

    /// Roles and destinations; per-call users are overlaid, never stored.
    entities: EntityRegistry,

    /// Captured snapshots by block height.
    history: RwLock<BTreeMap<BlockHeight, Arc<Snapshot>>>,

    config: ManagerConfig,

    formatter: ValueFormatter,
}

impl<C: Chain, P: ProtocolSystem> SnapshotManager<C, P> {
    /// Build a manager for the vault registered under `key`.
    ///
    /// The resolver is chosen from the strategy's `getName()`; an
    /// unrecognised name fails here rather than on first use.
    pub fn new(chain: C, system: P, key: &str, config: ManagerConfig) -> Result<Self> {
        let ctx = resolve_context(&chain, &system, key)?;
        let name = chain.read_text(&Call::new(ctx.strategy, "getName()"))?;
        let kind = StrategyKind::from_name(&name)?;
        info!(sett = key, strategy = %name, resolver = %kind, "selected resolver");

        let resolver = resolvers::resolver_for(kind, ctx.clone(), &chain)?;
        Self::assemble(chain, system, ctx, resolver, config)
    }

    /// Build a manager around a caller-supplied resolver.
    pub fn with_resolver<F>(chain: C, system: P, key: &str, config: ManagerConfig, build: F) -> Result<Self>
    where
        F: FnOnce(&SettContext) -> Box<dyn Resolver>,
    {
        let ctx = resolve_context(&chain, &system, key)?;
        let resolver = build(&ctx);
        info!(sett = key, resolver = resolver.name(), "using injected resolver");
        Self::assemble(chain, system, ctx, resolver, config)
    }

    fn assemble(
        chain: C,
        system: P,
        ctx: SettContext,
        resolver: Box<dyn Resolver>,
        config: ManagerConfig,
    ) -> Result<Self> {
        let mut entities = EntityRegistry::new();
        for role in Role::ALL {
            let address = match role {
                Role::Sett => ctx.sett,
                Role::Strategy => ctx.strategy,
                Role::Controller => ctx.controller,
                Role::Governance => chain.read_address(&Call::new(ctx.strategy, "governance()"))?,
                Role::GovernanceRewards => chain.read_address(&Call::new(ctx.controller, "rewards()"))?,
                Role::Strategist => chain.read_address(&Call::new(ctx.strategy, "strategist()"))?,
            };
            entities.insert(role.alias(), address)?;
        }
        for (alias, destination) in resolver.strategy_destinations() {
            entities.insert(alias.as_str(), *destination)?;
        }
        debug!(entities = entities.len(), "seeded entity registry");

        let formatter = ValueFormatter::new(&config);
        Ok(Self {
            chain,
            system,
            ctx,
            resolver,
            entities,
            history: RwLock::new(BTreeMap::new()),
            config,
            formatter,
        })
    }

    // --- Capture ---

    /// Capture every resolver field for the base entities plus `tracked`.
    ///
    /// All reads go out as one batch and so observe a single block. The
    /// snapshot is also retained in the history under that block.
    pub fn snap(&self, tracked: &TrackedUsers) -> Result<Arc<Snapshot>> {
        let entities = self.entities.with_overlay(tracked)?;

        let mut calls = Multicall::new();
        self.resolver.add_balances_snap(&mut calls, &entities);
        self.resolver.add_sett_snap(&mut calls);
        self.resolver.add_strategy_snap(&mut calls);

        let fields = calls.len();
        let (block, data) = calls.execute(&self.chain)?;
        debug!(block = block.0, fields, "captured snapshot");

        let snap = Arc::new(Snapshot::new(data, block)?);
        self.retain(Arc::clone(&snap));
        Ok(snap)
    }

    fn retain(&self, snap: Arc<Snapshot>) {
        let mut history = self.history.write();
        history.insert(snap.block(), snap);
        if self.config.max_history > 0 {
            while history.len() > self.config.max_history {
                history.pop_first();
            }
        }
    }

    // --- Accessors ---

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn system(&self) -> &P {
        &self.system
    }

    pub fn context(&self) -> &SettContext {
        &self.ctx
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn snapshot_at(&self, block: BlockHeight) -> Option<Arc<Snapshot>> {
        self.history.read().get(&block).cloned()
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.history.read().values().next_back().cloned()
    }

    /// Retained snapshots, oldest first.
    pub fn history(&self) -> Vec<Arc<Snapshot>> {
        self.history.read().values().cloned().collect()
    }

    // --- Reporting ---

    /// Fields that differ between two snapshots.
    pub fn compare(&self, before: &Snapshot, after: &Snapshot) -> Result<CompareReport> {
        CompareReport::between(before, after)
    }

    /// Print the changed fields between two snapshots as a grid.
    pub fn print_compare(&self, before: &Snapshot, after: &Snapshot) -> Result<()> {
        let report = self.compare(before, after)?;
        println!(
            "=== Compare: {} Sett {} -> {} ===",
            self.ctx.key, report.from_block, report.to_block
        );
        report.table(&self.formatter)?.printstd();
        Ok(())
    }

    /// Print every field of one snapshot.
    pub fn print_table(&self, snap: &Snapshot) {
        println!("=== Status Report: {} Sett ===", self.ctx.key);
        report::status_table(snap, self.config.hide_zero_balances).printstd();
    }

    /// Print the share price and the strategy's idle want.
    pub fn print_basics(&self, snap: &Snapshot) -> Result<()> {
        println!("=== Status Report: {} Sett ===", self.ctx.key);
        report::basics_table(snap)?.printstd();
        Ok(())
    }

    /// Current role holders of the vault and the strategy.
    pub fn permissions(&self) -> Result<Vec<(String, Address)>> {
        const SETT_ROLES: [&str; 3] = ["keeper", "governance", "strategist"];
        const STRATEGY_ROLES: [&str; 4] = ["keeper", "governance", "strategist", "guardian"];

        let mut entries = Vec::with_capacity(SETT_ROLES.len() + STRATEGY_ROLES.len());
        for (prefix, target, roles) in [
            ("sett", self.ctx.sett, &SETT_ROLES[..]),
            ("strategy", self.ctx.strategy, &STRATEGY_ROLES[..]),
        ] {
            for role in roles {
                let holder = self.chain.read_address(&Call::new(target, format!("{}()", role)))?;
                entries.push((format!("{}.{}", prefix, role), holder));
            }
        }
        Ok(entries)
    }

    pub fn print_permissions(&self) -> Result<()> {
        println!("=== Permissions: {} Sett ===", self.ctx.key);
        report::permissions_table(&self.permissions()?).printstd();
        Ok(())
    }
}

/// Look up the vault and strategy and check they agree on the want token.
fn resolve_context<C: Chain, P: ProtocolSystem>(chain: &C, system: &P, key: &str) -> Result<SettContext> {
    let sett = system.sett(key)?;
    let strategy = system.strategy(key)?;
    let controller = chain.read_address(&Call::new(sett, "controller()"))?;
    let want = chain.read_address(&Call::new(sett, "token()"))?;
    let strategy_want = chain.read_address(&Call::new(strategy, "want()"))?;

    if want != strategy_want {
        return Err(SnapshotError::WantMismatch {
            sett: want,
            strategy: strategy_want,
        });
    }

    Ok(SettContext {
        key: key.to_string(),
        sett,
        strategy,
        controller,
        want,
    })
}
