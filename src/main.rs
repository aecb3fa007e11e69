//! # docshelf CLI
//!
//! ## Usage
//!
//! ```bash
//! docshelf --config ./config/docshelf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docshelf serve` | Start the HTTP server |
//! | `docshelf search [QUERY]` | List base names matching a query |
//! | `docshelf resolve <TYPE> <NAME>` | Print the file a download would serve |
//! | `docshelf status` | Show folder diagnostics |
//! | `docshelf init` | Create missing category folders |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docshelf::config;
use docshelf::index::FileIndex;
use docshelf::{server, status};

/// docshelf — search and download parallel HTML, Excel and PDF exports.
#[derive(Parser)]
#[command(
    name = "docshelf",
    about = "docshelf — search and download parallel HTML, Excel and PDF exports",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docshelf.toml`. When the file does not exist,
    /// built-in defaults are used with the current directory as base.
    #[arg(long, global = true, default_value = "./config/docshelf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Search base names (case-insensitive substring match).
    ///
    /// With no query, every known base name is listed.
    Search {
        #[arg(default_value = "")]
        query: String,

        /// Print the same JSON the `/api/files` endpoint returns.
        #[arg(long)]
        json: bool,
    },

    /// Resolve a download to the file on disk.
    Resolve {
        /// Category: `html`, `excel` or `pdf`.
        file_type: String,
        /// Base name without extension.
        name: String,
    },

    /// Show which folders and templates exist and how many documents are indexed.
    Status,

    /// Create missing category folders.
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, json } => {
            let index = FileIndex::new(cfg.layout()?);
            let results = index.search(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No documents found.");
            } else {
                println!("{:<40} {:<6} {:<6} PDF", "NAME", "HTML", "EXCEL");
                for (name, hit) in &results {
                    println!(
                        "{:<40} {:<6} {:<6} {}",
                        name,
                        mark(hit.entry.html),
                        mark(hit.entry.excel),
                        mark(hit.entry.pdf)
                    );
                }
                println!();
                println!("{} document(s)", results.len());
            }
        }
        Commands::Resolve { file_type, name } => {
            let index = FileIndex::new(cfg.layout()?);
            let download = index.resolve_download(&file_type, &name)?;
            println!("{}", download.path.display());
        }
        Commands::Status => {
            let index = FileIndex::new(cfg.layout()?);
            status::print_status(&index)?;
        }
        Commands::Init => {
            let index = FileIndex::new(cfg.layout()?);
            index.ensure_folders()?;
            println!("Folders ready under {}", index.layout().base_dir.display());
        }
    }

    Ok(())
}

fn mark(present: bool) -> &'static str {
    if present {
        "yes"
    } else {
        "-"
    }
}
