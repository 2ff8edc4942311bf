use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{
    rng::{RngManager, StreamRng},
    systems::{BookkeepingSystem, DiscoverySystem, ExtractionSystem},
    world::{TickStats, World},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    /// Emit an info-level progress line every this many ticks; 0 disables it.
    pub log_interval_ticks: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    /// Extraction, then frontier expansion, then invariant checks.
    pub fn standard(settings: EngineSettings) -> Self {
        Self::new(settings)
            .with_system(ExtractionSystem::new())
            .with_system(DiscoverySystem::new())
            .with_system(BookkeepingSystem::new())
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
}

impl Engine {
    /// Runs every system once, in order, and returns what the tick did.
    /// A failing system aborts the tick; the world is left as that system
    /// left it.
    pub fn advance_tick(&mut self, world: &mut World) -> Result<TickStats> {
        world.stats = TickStats::default();
        let current_tick = world.tick() + 1;
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick: current_tick,
                scenario_name: &self.settings.scenario_name,
            };
            system
                .run(&ctx, world, &mut rng_stream)
                .with_context(|| format!("system '{}' failed on tick {current_tick}", system.name()))?;
        }
        world.advance_time();

        let stats = world.last_tick().clone();
        debug!(
            tick = current_tick,
            depleted = stats.depleted.len(),
            explored = stats.explored.len(),
            "tick complete"
        );
        let interval = self.settings.log_interval_ticks;
        if interval > 0 && current_tick % interval == 0 {
            info!(
                scenario = %self.settings.scenario_name,
                tick = current_tick,
                explored = world.explored_count(),
                depleted = world.depleted_count(),
                pollution = world.ledger().pollution(),
                "progress"
            );
        }
        Ok(stats)
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_, _| {})
    }

    /// Like [`Engine::run`], calling `hook` after every tick. The hook may
    /// mutate the world, e.g. to purchase research between ticks.
    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&mut World, &TickStats),
    {
        for _ in 0..ticks {
            let stats = self.advance_tick(world)?;
            hook(world, &stats);
        }
        Ok(())
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub scenario_name: &'a str,
}

/// One stage of the tick pipeline. Each system receives its own random
/// stream, keyed by its name and derived from `EngineSettings::seed`, so a
/// stochastic system added later stays reproducible without disturbing the
/// draws of any other system. The built-in systems are deterministic and
/// leave their stream untouched.
pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut StreamRng<'_>,
    ) -> Result<()>;
}
