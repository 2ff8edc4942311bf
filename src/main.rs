use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hexsettle::{
    engine::{EngineBuilder, EngineSettings},
    research::load_research_file,
    scenario::ScenarioLoader,
    view::{AsciiMap, WorldSnapshot},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless hex settlement simulation")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/frontier.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Research definitions to use instead of the scenario's
    #[arg(long)]
    research: Option<PathBuf>,

    /// Buy the first affordable research after every tick
    #[arg(long)]
    auto_research: bool,

    /// Print the final world snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Print the final map
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    let seed = cli.seed.unwrap_or(scenario.seed);
    let ticks = scenario.ticks(cli.ticks);

    let catalog = match &cli.research {
        Some(path) => load_research_file(path)?.catalog,
        None => scenario.load_research()?,
    };
    let mut world = scenario.build_world(seed)?.with_catalog(catalog);

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed,
        log_interval_ticks: scenario.log_interval_ticks,
    };
    let mut engine = EngineBuilder::standard(settings).build();

    let auto_research = cli.auto_research;
    engine.run_with_hook(&mut world, ticks, |world, _| {
        if !auto_research {
            return;
        }
        let next = world
            .available_research()
            .first()
            .map(|r| r.name().to_string());
        if let Some(name) = next {
            world.purchase(&name);
        }
    })?;

    info!(
        scenario = %scenario.name,
        ticks,
        explored = world.explored_count(),
        depleted = world.depleted_count(),
        "run complete"
    );
    if cli.map {
        println!("{}", AsciiMap(world.grid()));
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&WorldSnapshot::capture(&world))?);
    } else {
        for line in WorldSnapshot::capture(&world).resources {
            println!("{:<18} {:>12.2} (mined {:.2})", line.label, line.available, line.mined);
        }
    }
    Ok(())
}
