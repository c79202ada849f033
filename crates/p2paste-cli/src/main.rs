//! p2paste binary.
//!
//! # Usage
//!
//! ```bash
//! # Create a room and copy its link
//! p2paste new --base-url https://paste.example
//!
//! # Check a link someone read out to you
//! p2paste join blue otter degk
//!
//! # Watch three simulated participants converge
//! p2paste demo --peers 3 --chaos
//! ```

use std::io::Write;

use clap::{Parser, Subcommand};
use p2paste_cli::{DemoOptions, SystemEnv, demo, join_room, new_room, system_chain};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Peer-to-peer pastebin rooms
#[derive(Parser, Debug)]
#[command(name = "p2paste")]
#[command(about = "Create and join p2paste rooms")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new room name
    New {
        /// Origin to prefix the room path with
        #[arg(long)]
        base_url: Option<String>,

        /// Do not touch the clipboard
        #[arg(long)]
        no_copy: bool,
    },

    /// Check a hand-typed room name and print its path
    Join {
        /// First word
        first: String,
        /// Second word
        second: String,
        /// Four-letter code
        code: String,
    },

    /// Run a simulated room in-process
    Demo {
        /// Number of participants
        #[arg(long, default_value_t = 3)]
        peers: usize,

        /// Seed for the simulation
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Duplicate, reorder and corrupt messages
        #[arg(long)]
        chaos: bool,

        /// Delay session starts to absorb double mounts
        #[arg(long)]
        settle_delay: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut out = std::io::stdout().lock();
    match args.command {
        Command::New { base_url, no_copy } => {
            let mut chain = system_chain();
            let clipboard = if no_copy { None } else { Some(&mut chain) };
            new_room(&SystemEnv::new(), base_url.as_deref(), clipboard, &mut out)?;
        },
        Command::Join { first, second, code } => {
            join_room(&first, &second, &code, &mut out)?;
        },
        Command::Demo { peers, seed, chaos, settle_delay } => {
            demo(&DemoOptions { peers, seed, chaos, settle_delay }, &mut out)?;
        },
    }
    out.flush()?;

    Ok(())
}
