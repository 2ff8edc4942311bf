use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    grid::TileId,
    resource::ResourceKind,
    rng::StreamRng,
    world::World,
};

/// Mines every explored tile once per tick, in row-major order. Depleted
/// tiles still yield kinds discovered after they ran dry.
pub struct ExtractionSystem;

impl ExtractionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExtractionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ExtractionSystem {
    fn name(&self) -> &str {
        "extraction"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut StreamRng<'_>,
    ) -> Result<()> {
        let kinds: Vec<ResourceKind> = world.discovered_kinds().collect();
        let multipliers = *world.multipliers();
        let producing: Vec<TileId> = world
            .grid()
            .tiles()
            .filter(|(_, t)| t.is_explored() && !t.is_occupied())
            .map(|(id, _)| id)
            .collect();

        for id in producing {
            for &kind in &kinds {
                let taken = world
                    .grid_mut()
                    .tile_mut(id)
                    .extract(kind, multipliers[kind]);
                if taken > 0.0 {
                    world.ledger_mut().record_extraction(kind, taken);
                    world.stats.extracted[kind] += taken;
                }
            }
        }
        Ok(())
    }
}
