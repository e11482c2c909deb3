//! # vHAL Lookup CLI (`vhal`)
//!
//! Command-line front end for the vehicle HAL property lookup engine.
//!
//! ## Usage
//!
//! ```bash
//! vhal --config ./config/vhal.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vhal search <keyword>` | Search the property catalog |
//! | `vhal lookup <keyword>` | Property definitions plus source locations |
//! | `vhal summarize "<question>"` | Summarize the vHAL documentation |
//! | `vhal analyze <PROPERTY>` | Analyze a property's implementation files |
//! | `vhal locate <key>` | Candidate source URLs for a resource key |
//! | `vhal serve` | Start the HTTP tool server |
//! | `vhal completions <shell>` | Print a shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! vhal search SEAT_MEMORY
//! vhal summarize "how do seat memory presets work" --validate --max-sources 3
//! vhal analyze SEAT_MEMORY_SELECT --version android14
//! vhal locate default_hal_impl --version 13
//! RUST_LOG=vhal_lookup=debug vhal lookup hvac
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vhal_lookup::config::{self, Config};
use vhal_lookup::engine::Engine;
use vhal_lookup::server;
use vhal_lookup::traits::DEFAULT_MAX_SOURCES;

/// vHAL Lookup: search, locate, and summarize Android vehicle HAL properties.
#[derive(Parser)]
#[command(
    name = "vhal",
    about = "vHAL Lookup: search, locate, and summarize Android vehicle HAL properties",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). A missing file means defaults.
    #[arg(long, global = true, default_value = "./config/vhal.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the property catalog by name, name fragment, or category.
    Search {
        keyword: String,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show matching property definitions and where their sources live.
    Lookup { keyword: String },

    /// Summarize the vHAL documentation for a question.
    Summarize {
        question: String,

        /// Probe each source and report a confidence score.
        #[arg(long)]
        validate: bool,

        /// Documentation pages to read when validating.
        #[arg(long, default_value_t = DEFAULT_MAX_SOURCES as usize)]
        max_sources: usize,
    },

    /// Fetch and analyze the Android sources behind a property.
    Analyze {
        property: String,

        /// Android version (android13..android16, main, master).
        #[arg(long)]
        version: Option<String>,

        /// Print the full analysis as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List candidate URLs for a resource key, highest priority first.
    Locate {
        key: String,

        #[arg(long)]
        version: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP tool server on `[server].bind`.
    Serve,

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "vhal", &mut std::io::stdout());
        return Ok(());
    }

    let cfg: Config = config::load_config(&cli.config)?;

    if let Commands::Serve = cli.command {
        return server::run_server(&cfg).await;
    }

    let engine = Engine::from_config(&cfg)?;

    match cli.command {
        Commands::Search { keyword, json } => {
            let records = engine.search(&keyword);
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No matching vehicle properties for '{}'.", keyword.trim());
            } else {
                for r in &records {
                    println!("{:<40} {:<8} {}", r.name, r.identifier, r.category);
                }
            }
        }
        Commands::Lookup { keyword } => {
            println!("{}", engine.lookup(&keyword));
        }
        Commands::Summarize {
            question,
            validate,
            max_sources,
        } => {
            if max_sources == 0 {
                anyhow::bail!("--max-sources must be at least 1");
            }
            let text = if validate {
                engine.summarize_validated(&question, true, max_sources).await
            } else {
                engine.summarize(&question).await
            };
            println!("{}", text);
        }
        Commands::Analyze {
            property,
            version,
            json,
        } => {
            let analysis = engine.analyze(&property, version.as_deref()).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!("{}", analysis.render());
            }
        }
        Commands::Locate { key, version, json } => {
            let located = engine.locate(&key, version.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&located)?);
            } else if located.urls.is_empty() {
                anyhow::bail!("Unknown resource key: {}", key);
            } else {
                println!("{} ({})", located.key, located.version);
                for url in &located.urls {
                    println!("  {}", url);
                }
            }
        }
        Commands::Serve | Commands::Completions { .. } => {}
    }

    Ok(())
}
