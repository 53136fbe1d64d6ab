mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pastefocus_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pastefocus")]
#[command(about = "Inspect how the paste-focus page script sees a chat page", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file (defaults apply when absent)
    #[arg(short, long = "config-file", global = true)]
    config_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run input discovery against saved page markup
    Probe {
        /// HTML file to load
        file: PathBuf,

        /// Page URL, used for platform detection and navigation tracking
        #[arg(long, default_value = "https://example.org/")]
        url: String,

        /// Simulate the paste shortcut after loading
        #[arg(long)]
        paste: bool,

        /// Element id that holds focus before the shortcut
        #[arg(long)]
        active_id: Option<String>,

        /// Simulate a client-side navigation to this URL
        #[arg(long, requires = "next")]
        navigate: Option<String>,

        /// Markup that replaces the page body on navigation
        #[arg(long, requires = "navigate")]
        next: Option<PathBuf>,
    },

    /// List the candidate patterns in search order
    Patterns,

    /// Show the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = Config::load_or_default(cli.config_file.as_deref())?;

    match cli.command {
        Commands::Probe {
            file,
            url,
            paste,
            active_id,
            navigate,
            next,
        } => {
            let options = commands::probe::ProbeOptions {
                file,
                url,
                paste,
                active_id,
                navigation: navigate.zip(next),
            };
            commands::probe::run(&options, &config)?;
        }
        Commands::Patterns => {
            commands::patterns::run();
        }
        Commands::Config => {
            commands::config_cmd::run(&config)?;
        }
    }

    Ok(())
}
