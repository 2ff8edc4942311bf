use anyhow::{Context, Result};

use crate::{
    engine::{System, SystemContext},
    rng::StreamRng,
    world::World,
};

/// Fails the tick as soon as the grid or the ledger breaks an invariant.
pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut StreamRng<'_>,
    ) -> Result<()> {
        world
            .grid()
            .verify_invariants()
            .with_context(|| format!("grid invariant broken in '{}'", ctx.scenario_name))?;
        world
            .ledger()
            .verify()
            .with_context(|| format!("ledger invariant broken in '{}'", ctx.scenario_name))?;
        Ok(())
    }
}
