// SPDX-License-Identifier: PMPL-1.0-or-later

//! forward-kb: run forward-chaining knowledge base programs
//!
//! Loads a JSON or YAML program of facts, rules and assert/ask/retract
//! steps, saturates the knowledge base, and reports answers, retractions
//! and the final state.

use anyhow::Result;
use clap::{Parser, Subcommand};
use forward_kb::kanren::{KnowledgeBase, Program};
use forward_kb::report::{self, KbFormatter, SnapshotFormat};
use forward_kb::types::{EngineConfig, Verbosity};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "forward-kb")]
#[command(version)]
#[command(about = "Forward-chaining knowledge base with justification-aware retraction")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program and print the resulting knowledge base
    Run {
        /// Program file (JSON, or YAML by extension)
        #[arg(value_name = "PROGRAM")]
        program: PathBuf,

        /// Report inference attempts as well (repeatable)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Suppress engine logging
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Engine verbosity (quiet, normal, detailed); overrides the program
        #[arg(long, value_parser = parse_verbosity, conflicts_with_all = ["verbose", "quiet"])]
        verbosity: Option<Verbosity>,

        /// Write a snapshot of the final knowledge base
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Snapshot format (default: from the output extension)
        #[arg(short, long, value_enum)]
        format: Option<SnapshotFormat>,

        /// Skip printing the final knowledge base
        #[arg(long)]
        no_kb: bool,
    },

    /// Load and validate a program without running it
    Check {
        /// Program file (JSON, or YAML by extension)
        #[arg(value_name = "PROGRAM")]
        program: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            program: program_path,
            verbose,
            quiet,
            verbosity,
            output,
            format,
            no_kb,
        } => {
            let program = Program::load(&program_path)?;

            let mut config = program.engine_config();
            if let Some(verbosity) = verbosity {
                config.verbosity = verbosity;
            } else if quiet {
                config = EngineConfig::quiet();
            } else if verbose > 0 {
                config.verbosity = Verbosity::from_count(verbose);
            }
            init_tracing(config.verbosity);

            println!("Running program: {}", program_path.display());
            let mut kb = KnowledgeBase::new(config);
            let outcomes = program.run(&mut kb)?;

            let formatter = KbFormatter::new();
            for outcome in &outcomes {
                formatter.print_outcome(&kb, outcome);
            }

            if !no_kb {
                report::print_kb(&kb);
            }

            if let Some(output_path) = output {
                let format = format.unwrap_or_else(|| SnapshotFormat::from_path(&output_path));
                report::save_snapshot(&kb, &output_path, format)?;
                println!("\nSnapshot saved to: {}", output_path.display());
            }
        }

        Commands::Check {
            program: program_path,
        } => {
            let program = Program::load(&program_path)?;
            program.validate()?;

            println!("Program OK: {}", program_path.display());
            println!("  Facts: {}", program.facts.len());
            println!("  Rules: {}", program.rules.len());
            println!("  Steps: {}", program.steps.len());
            println!("  Verbosity: {}", program.engine_config().verbosity);
        }
    }

    Ok(())
}

fn parse_verbosity(value: &str) -> Result<Verbosity, String> {
    Verbosity::from_str(value).ok_or_else(|| format!("unknown verbosity '{}'", value))
}

fn init_tracing(verbosity: Verbosity) {
    let level = match verbosity {
        Verbosity::Quiet => LevelFilter::OFF,
        Verbosity::Normal => LevelFilter::INFO,
        Verbosity::Detailed => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
