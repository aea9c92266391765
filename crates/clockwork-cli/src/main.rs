use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clockwork_core::DaemonPaths;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "clockwork-cli", version, about = "Clockwork CLI")]
struct Cli {
    /// Signal file polled by the daemon
    #[arg(long, global = true, value_name = "PATH")]
    signal_file: Option<PathBuf>,
    /// Status file published by the daemon
    #[arg(long, global = true, value_name = "PATH")]
    status_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer daemon in the foreground
    Run {
        /// Disable desktop notifications and sounds
        #[arg(long)]
        quiet: bool,
    },
    /// Send a control command to the running daemon
    Send {
        /// pomo-toggle, pomo-work, pomo-short, pomo-long, pomo-reset,
        /// timer-toggle, timer-reset, sw-toggle, sw-lap, sw-reset, show
        command: String,
    },
    /// Print the published status record
    Status {
        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },
    /// Print the saved session as it would be restored now
    Session {
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Show the current time in the configured and extra zones
    Clock {
        /// Extra IANA zone to show (repeatable)
        #[arg(long = "zone", value_name = "ZONE")]
        zones: Vec<String>,
    },
}

impl Cli {
    fn paths(&self) -> DaemonPaths {
        let defaults = DaemonPaths::default();
        DaemonPaths {
            signal: self.signal_file.clone().unwrap_or(defaults.signal),
            status: self.status_file.clone().unwrap_or(defaults.status),
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("CLOCKWORK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let is_daemon = matches!(cli.command, Commands::Run { .. });
    init_tracing(if is_daemon { "info" } else { "warn" });

    let paths = cli.paths();
    let result = match cli.command {
        Commands::Run { quiet } => commands::run::run(paths, quiet),
        Commands::Send { command } => commands::send::run(&paths, &command),
        Commands::Status { json } => commands::status::run(&paths, json),
        Commands::Session { json } => commands::session::run(json),
        Commands::Config { action } => commands::config::run(action),
        Commands::Clock { zones } => commands::clock::run(&zones),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
