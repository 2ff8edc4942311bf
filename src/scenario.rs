use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    grid::{Coord, Grid, StockProfile},
    maze::MazeGenerator,
    research::{load_research_file, ResearchCatalog},
    resource::ResourceKind,
    rng::RngManager,
    world::{AffordabilityBasis, World, DEFAULT_BASE_EXTRACTION_RATE},
};

fn default_radius() -> usize {
    6
}

fn default_base_extraction_rate() -> f64 {
    DEFAULT_BASE_EXTRACTION_RATE
}

fn default_discovered() -> Vec<ResourceKind> {
    vec![
        ResourceKind::Wood,
        ResourceKind::Water,
        ResourceKind::Livestock,
    ]
}

fn default_log_interval_ticks() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_radius")]
    pub radius: usize,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_base_extraction_rate")]
    pub base_extraction_rate: f64,
    #[serde(default)]
    pub stock: StockProfile,
    #[serde(default = "default_discovered")]
    pub discovered: Vec<ResourceKind>,
    #[serde(default)]
    pub maze: MazeSettings,
    #[serde(default)]
    pub affordability: AffordabilityBasis,
    /// Research definitions, relative to the scenario file.
    #[serde(default)]
    pub research: Option<PathBuf>,
    #[serde(default = "default_log_interval_ticks")]
    pub log_interval_ticks: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MazeSettings {
    /// Extra carving seeds as `[row, column]`, grown alongside the settlement.
    #[serde(default)]
    pub extra_seeds: Vec<[usize; 2]>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let mut scenario = Scenario::from_yaml(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if let (Some(research), Some(dir)) = (scenario.research.as_ref(), path.parent()) {
            scenario.research = Some(dir.join(research));
        }
        Ok(scenario)
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("scenario must define a name");
        }
        if self.radius == 0 {
            bail!("radius must be at least 1");
        }
        if !(self.base_extraction_rate.is_finite() && self.base_extraction_rate >= 0.0) {
            bail!("base_extraction_rate must be a non-negative number");
        }
        let stock = &self.stock;
        if !(stock.min >= 0.0 && stock.max >= stock.min) {
            bail!("stock range [{}, {}) is invalid", stock.min, stock.max);
        }
        if !(0.0..=1.0).contains(&stock.presence) {
            bail!("stock presence must lie in [0, 1]");
        }
        Ok(())
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(1_000)
    }

    /// Builds the grid, scatters stock, carves passages and opens the first
    /// frontier. Terrain and maze draw from separate streams of `seed`.
    pub fn build_world(&self, seed: u64) -> Result<World> {
        let mut rng = RngManager::new(seed);
        let mut grid = Grid::new(self.radius)?;
        grid.scatter_deposits(&mut rng.stream("terrain"), &self.stock);

        let mut maze = MazeGenerator::around_settlement(&grid);
        for &[row, col] in &self.maze.extra_seeds {
            let coord = Coord::new(row, col);
            let Some(id) = grid.id_at(coord) else {
                bail!("maze seed {coord} lies outside a grid of radius {}", self.radius);
            };
            maze = maze.with_seed(id);
        }
        let report = maze.carve(&mut grid, &mut rng.stream("maze"));
        if report.visited != grid.len() {
            warn!(
                visited = report.visited,
                tiles = grid.len(),
                "maze left tiles unreachable"
            );
        }

        let mut world = World::new(grid, self.base_extraction_rate)
            .with_affordability(self.affordability);
        for &kind in &self.discovered {
            world.discover_resource(kind);
        }
        world.seed_frontier();
        world.grid().verify_invariants()?;

        info!(
            scenario = %self.name,
            radius = self.radius,
            tiles = world.grid().len(),
            passages = report.passages,
            "world generated"
        );
        Ok(world)
    }

    /// Loads the research catalog named by the scenario, or an empty one.
    /// Skipped entries have already been logged by the loader.
    pub fn load_research(&self) -> Result<ResearchCatalog> {
        let Some(path) = &self.research else {
            return Ok(ResearchCatalog::default());
        };
        let load = load_research_file(path)?;
        info!(
            researches = load.catalog.len(),
            skipped = load.warnings.len(),
            "research catalog loaded"
        );
        Ok(load.catalog)
    }
}
