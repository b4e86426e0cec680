#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs gem battle encounters headlessly.

mod autopilot;
mod encounter_file;
mod report;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gem_battle_core::{Command, Event};
use gem_battle_world::{self as world, query, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    autopilot::Autopilot,
    report::{EventPrinter, OutputFormat},
};

const CAST_TICK: Duration = Duration::from_millis(100);

/// Command-line arguments accepted by the `gem-battle` binary.
#[derive(Debug, Parser)]
#[command(name = "gem-battle", version, about = "Match-3 battle engine runner")]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays an encounter with the autopilot and prints every event.
    Play(PlayArgs),
    /// Validates an encounter file and lists the roster.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// Encounter file; the built-in encounter is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for every random draw.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Turn limit after which the run stops.
    #[arg(long, default_value_t = 200)]
    max_turns: u32,
    /// Emits one JSON object per event instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Encounter file; the built-in encounter is checked when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Entry point for the gem battle command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        CliCommand::Play(args) => play(&args),
        CliCommand::Check(args) => check(&args),
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn play(args: &PlayArgs) -> Result<()> {
    let config = encounter_file::load(args.config.as_deref())?;
    let mut world = World::new(&config, args.seed).context("invalid encounter configuration")?;
    let mut autopilot = Autopilot::new(args.seed);
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let mut printer = EventPrinter::new(format, std::io::stdout().lock());
    let mut events = Vec::new();

    printer.intro(&world)?;
    info!(seed = args.seed, max_turns = args.max_turns, "encounter started");

    while query::turn(&world) < args.max_turns && query::outcome(&world).is_none() {
        for slot in autopilot.skills_to_cast(&world) {
            submit(&mut world, Command::InvokeSkill { slot }, &mut events);
        }
        while !query::casts_idle(&world) && query::outcome(&world).is_none() {
            submit(&mut world, Command::Tick { dt: CAST_TICK }, &mut events);
        }
        printer.print_all(&events)?;
        events.clear();

        let (from, to) = autopilot.choose_swap(query::grid(&world));
        submit(&mut world, Command::Swap { from, to }, &mut events);
        submit(&mut world, Command::Release, &mut events);
        printer.print_all(&events)?;
        events.clear();
        printer.status(&world)?;
    }

    printer.summary(&world)
}

fn submit(world: &mut World, command: Command, events: &mut Vec<Event>) {
    world::apply(world, command, events);
}

fn check(args: &CheckArgs) -> Result<()> {
    let config = encounter_file::load(args.config.as_deref())?;
    let world = World::new(&config, 0).context("invalid encounter configuration")?;

    println!("party: {} hp, dp {}", config.party.max_hp, config.party_dp());
    for (slot, (ally, state)) in config
        .roster
        .iter()
        .zip(query::skill_slots(&world))
        .enumerate()
    {
        match (state.definition(), state.error()) {
            (Some(skill), _) => println!(
                "slot {slot}: {} ({}) - {} [cooldown {}]",
                ally.name,
                ally.element,
                skill.description(),
                skill.cooldown
            ),
            (None, Some(error)) => println!("slot {slot}: {} - disabled: {error}", ally.name),
            (None, None) => println!("slot {slot}: {}", ally.name),
        }
    }
    for (index, enemy) in config.enemies.iter().enumerate() {
        println!(
            "enemy {index}: {} ({}) hp {} ap {} dp {}",
            enemy.name, enemy.element, enemy.max_hp, enemy.ap, enemy.dp
        );
    }
    println!("configuration ok");
    Ok(())
}
