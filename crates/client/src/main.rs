//! Headless ability-cast simulation binary.
//!
//! # Examples
//!
//! ```bash
//! # Run the scripted scenario for the default hero
//! cargo run -p cast-sim -- run
//!
//! # Another hero, ten simulated seconds, JSON lines on stdout
//! cargo run -p cast-sim -- run --hero Skirmisher --seconds 10 --json
//!
//! # List the content in a data directory
//! cargo run -p cast-sim -- --data-dir ./data list
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use cast_runtime::Runtime;
use cast_sim::{Content, ScenarioPlan, ScenarioReport, SimConfig, logging, run_scenario};
use clap::{Args, Parser, Subcommand};

/// Headless ability-cast simulation
#[derive(Parser)]
#[command(name = "cast-sim")]
#[command(about = "Runs scripted ability casts against the in-memory runtime", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding cast.toml, abilities.ron and heroes.ron
    #[arg(long, env = "CAST_DATA_DIR", default_value = "crates/game/content/data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scripted cast scenario for one hero
    Run(RunArgs),

    /// List the abilities and heroes in the data directory
    List,
}

#[derive(Args)]
struct RunArgs {
    /// Hero name from the roster
    #[arg(long, default_value = "Arcanist")]
    hero: String,

    /// Simulated seconds to step after the opening casts
    #[arg(long, default_value_t = 6.0)]
    seconds: f32,

    /// Print events and the report as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = SimConfig::from_env();
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    let content = Content::load(&cli.data_dir)?;
    match cli.command {
        Command::Run(args) => run(config, content, args).await,
        Command::List => {
            list(&content);
            Ok(())
        }
    }
}

async fn run(config: SimConfig, content: Content, args: RunArgs) -> Result<()> {
    let template = content.hero(&args.hero)?.clone();
    let runtime = Runtime::builder()
        .config(config.runtime_config(content.config.clone()))
        .catalog(content.catalog)
        .build()
        .await
        .context("building runtime")?;

    tracing::info!(
        hero = %template.name,
        seconds = args.seconds,
        frame_dt = config.frame_dt,
        "starting scenario"
    );
    let plan = ScenarioPlan::for_duration(args.seconds, config.frame_dt);
    let report = run_scenario(&runtime.handle(), &template, &plan).await?;

    if args.json {
        print_json(&report)?;
    } else {
        print_summary(&report);
    }

    runtime.shutdown().await?;
    Ok(())
}

fn list(content: &Content) {
    println!("Abilities:");
    for definition in content.catalog.iter() {
        println!(
            "  {:<12} {:<14} cooldown {:>4.1}s  cast {:>4.1}s  mana {:>5.1}",
            definition.id.to_string(),
            definition.name,
            definition.cooldown,
            definition.cast_time,
            definition.mana_cost
        );
    }
    println!("Heroes:");
    for hero in &content.heroes {
        let spells: Vec<String> = hero.spells.iter().map(ToString::to_string).collect();
        println!(
            "  {:<12} level {:<2} spells [{}]",
            hero.name,
            hero.level,
            spells.join(", ")
        );
    }
}

fn print_json(report: &ScenarioReport) -> Result<()> {
    for event in &report.events {
        println!("{}", serde_json::to_string(event)?);
    }
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}

fn print_summary(report: &ScenarioReport) {
    println!(
        "{} ran {} frames ({:.2}s), {} events",
        report.hero.name,
        report.frames,
        report.clock,
        report.events.len()
    );
    for event in &report.events {
        println!("  {:?}", event);
    }
    if let Some(point) = report.ground_point {
        println!("Ground point: ({:.1}, {:.1}, {:.1})", point.x, point.y, point.z);
    }
    println!("Swept: {:?}", report.swept);
    println!("Recast slots: {:?}", report.recast);
    println!(
        "Health {:.0}/{:.0}  Mana {:.0}/{:.0}",
        report.hero.health, report.hero.max_health, report.hero.mana, report.hero.max_mana
    );
    for slot in &report.hero.slots {
        println!(
            "  slot {} {:<10} cooldown {:.2}s ({:.0}%)",
            slot.slot,
            slot.state.to_string(),
            slot.cooldown,
            slot.cooldown_fraction * 100.0
        );
    }
}
