use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    grid::TileId,
    rng::StreamRng,
    world::World,
};

/// Retires exhausted tiles and pushes the frontier through their open
/// passages. Walls stop the frontier: only connected neighbors are explored.
pub struct DiscoverySystem;

impl DiscoverySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DiscoverySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DiscoverySystem {
    fn name(&self) -> &str {
        "discovery"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut StreamRng<'_>,
    ) -> Result<()> {
        let discovered = *world.discovered();
        let exhausted: Vec<TileId> = world
            .grid()
            .tiles()
            .filter(|(_, t)| t.is_explored() && !t.is_occupied() && !t.is_depleted())
            .filter(|(_, t)| t.is_exhausted(&discovered))
            .map(|(id, _)| id)
            .collect();

        // Every depletion of this pass is booked before any tile is explored,
        // so newly explored tiles wait for the next tick.
        let mut reached = Vec::new();
        for id in exhausted {
            world.grid_mut().tile_mut(id).mark_depleted();
            debug!(tick = ctx.tick, tile = %world.grid().tile(id).coord(), "tile depleted");
            reached.extend(world.grid().unexplored_passages(id));
            world.stats.depleted.push(id);
        }
        for id in reached {
            if world.explore(id) {
                world.stats.explored.push(id);
            }
        }
        Ok(())
    }
}
