use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use arbor::{
    engine::EngineBuilder,
    scenario::ScenarioLoader,
    web::{self, WebServerConfig},
    world::InputEvent,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Arbor procedural tree garden")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, global = true, default_value = "scenarios/default_garden.yaml")]
    scenario: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the garden headless for a fixed number of frames
    Simulate {
        /// Override frame count (uses scenario default when omitted)
        #[arg(long)]
        frames: Option<u64>,

        /// Override snapshot interval in frames
        #[arg(long)]
        snapshot_interval: Option<u64>,

        /// Directory for frame snapshots
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,

        /// Water the tree every N frames
        #[arg(long)]
        water_every: Option<u64>,
    },
    /// Serve the garden in the browser
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 3000)]
        port: u16,

        /// Override snapshot interval in frames
        #[arg(long)]
        snapshot_interval: Option<u64>,

        /// Directory for frame snapshots
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    match &scenario.description {
        Some(description) => log::info!("loaded '{}': {description}", scenario.name),
        None => log::info!("loaded '{}'", scenario.name),
    }

    match cli.command {
        Command::Simulate {
            frames,
            snapshot_interval,
            snapshot_dir,
            water_every,
        } => {
            let mut world = scenario.build_world()?;
            let frames = scenario.frames(frames);
            let snapshot_dir = snapshot_dir.unwrap_or_else(|| PathBuf::from("snapshots"));
            let mut engine =
                EngineBuilder::new(scenario.engine_settings(snapshot_interval, snapshot_dir))
                    .with_garden_systems()
                    .build();

            for frame in 1..=frames {
                if water_every.is_some_and(|every| every > 0 && frame % every == 0) {
                    world.queue_input(InputEvent::Water);
                }
                engine.frame(&mut world, scenario.frame_ms)?;
            }

            let hud = world.hud();
            println!(
                "Scenario '{}' ran {} frames: {} ({}), growth {}%, age {}, generation {}",
                scenario.name,
                frames,
                world.stage().label(),
                hud.mood,
                hud.growth_percent,
                hud.age,
                world.generation()
            );
        }
        Command::Serve {
            host,
            port,
            snapshot_interval,
            snapshot_dir,
        } => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
            runtime.block_on(web::run(WebServerConfig {
                scenario,
                snapshot_interval,
                snapshot_dir: snapshot_dir.unwrap_or_else(|| PathBuf::from("snapshots")),
                host,
                port,
            }))?;
        }
    }
    Ok(())
}
