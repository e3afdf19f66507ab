//! # docintel CLI
//!
//! ## Usage
//!
//! ```bash
//! docintel --config ./config/docintel.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docintel init` | Create the SQLite database and run schema migrations |
//! | `docintel upload <pdf>...` | Extract, chunk, embed and store PDFs |
//! | `docintel query "<question>"` | Answer a question with citations |
//! | `docintel documents` | List uploaded documents |
//! | `docintel delete <id>` | Remove a document and its chunks |
//! | `docintel stats` | Collection statistics |
//! | `docintel history` | Recent queries |
//! | `docintel reset --yes` | Remove every document and query record |
//! | `docintel dashboard` | Write HTML reports |
//! | `docintel serve` | Start the REST server and web UI |
//!
//! Logs go to stderr (`RUST_LOG`, default `docintel=info,tower_http=info`);
//! command output goes to stdout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docintel::{ask, config, dashboard, documents, migrate, server, stats};

#[derive(Parser)]
#[command(
    name = "docintel",
    about = "docintel: ask questions about your PDF documents",
    version,
    long_about = "docintel ingests PDF documents into a local vector store and answers \
    questions about them with a language model, citing the file and page each answer came from."
)]
struct Cli {
    /// Config file. Defaults to ./config/docintel.toml when it exists,
    /// otherwise built-in defaults plus environment overrides.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and run migrations.
    Init,

    /// Upload one or more PDF files.
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Ask a question about the uploaded documents.
    Query {
        question: String,

        /// Only retrieve from this source file (e.g. report.pdf).
        #[arg(long)]
        source: Option<String>,
    },

    /// List uploaded documents.
    Documents,

    /// Delete a document by id.
    Delete { id: String },

    /// Show collection statistics.
    Stats,

    /// Show recent queries, newest first.
    History {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete every document, chunk and query record.
    Reset {
        #[arg(long)]
        yes: bool,
    },

    /// Write HTML dashboard reports.
    Dashboard {
        /// Only write the metrics card.
        #[arg(long)]
        metrics_only: bool,
    },

    /// Start the REST server and web UI.
    Serve,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docintel=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!(
                "Database initialized successfully at {}",
                cfg.db_path().display()
            );
        }
        Commands::Upload { paths } => {
            documents::run_upload(&cfg, &paths).await?;
        }
        Commands::Query { question, source } => {
            ask::run_query(&cfg, &question, source.as_deref()).await?;
        }
        Commands::Documents => {
            documents::run_documents(&cfg).await?;
        }
        Commands::Delete { id } => {
            documents::run_delete(&cfg, &id).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::History { limit } => {
            ask::run_history(&cfg, limit).await?;
        }
        Commands::Reset { yes } => {
            documents::run_reset(&cfg, yes).await?;
        }
        Commands::Dashboard { metrics_only } => {
            let rag = docintel::rag_system::DocumentRag::from_config(&cfg).await?;
            let report =
                dashboard::write_reports(&rag, &cfg.dashboard.output_dir, metrics_only).await?;
            for f in report.files {
                println!("wrote {}", f);
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
