//! CLI entry point for snpdb.
//!
//! Runs the HTTP API and the batch importers against one SQLite database.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snpdb::config::{database_path, Config, ImportConfig, DEFAULT_DATABASE};
use snpdb::import::{import_genes, import_transcripts, import_variants};
use snpdb::store::{self, import_log, missing_tables, Database};

/// Variant-effect database and browser backend.
#[derive(Parser, Debug)]
#[command(name = "snpdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file (a sqlite:// prefix is accepted)
    #[arg(long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DATABASE)]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "SNPDB_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to bind
        #[arg(short = 'p', long, env = "SNPDB_PORT", default_value_t = 8000)]
        port: u16,

        /// Disable the permissive CORS layer
        #[arg(long)]
        no_cors: bool,
    },

    /// Import a variant-effect TSV file
    ImportVariants {
        /// TSV file (plain or .gz)
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Rows committed per transaction
        #[arg(long = "batch-size", default_value_t = 1000)]
        batch_size: usize,

        /// Number of parser threads (0 = auto-detect)
        #[arg(long, short = 'j', default_value_t = 0)]
        threads: usize,

        /// Reuse existing targets instead of creating them
        #[arg(long)]
        skip_targets: bool,
    },

    /// Import genes from a GTF file
    ImportGenes {
        /// GTF file (plain or .gz)
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Replace existing genes without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Import transcripts and exons from a GTF file
    ImportTranscripts {
        /// GTF file (plain or .gz)
        #[arg(short = 'f', long)]
        file: PathBuf,
    },

    /// Check that the database opens and has every table
    CheckDb,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let database = database_path(&cli.database);

    match cli.command {
        Command::Serve {
            host,
            port,
            no_cors,
        } => {
            let mut config = Config::new();
            config.set_database(&cli.database);
            config.host = host;
            config.port = port;
            config.cors = !no_cors;
            run_server(config)
        }
        Command::ImportVariants {
            file,
            batch_size,
            threads,
            skip_targets,
        } => {
            if !file.exists() {
                bail!("TSV file not found: {}", file.display());
            }

            let mut config = ImportConfig::new();
            if !config.set_batch_size(batch_size) {
                bail!("Batch size must be greater than 0");
            }
            config.threads = threads;
            config.skip_targets = skip_targets;

            let db = open(&database)?;
            let stats = import_variants(&db, &file, &config)?;
            info!(
                "Imported {} variants and {} effect values ({} rows skipped, {} errors)",
                stats.variants_imported,
                stats.effects_imported,
                stats.variants_skipped,
                stats.errors.len()
            );
            Ok(())
        }
        Command::ImportGenes { file, yes } => {
            if !file.exists() {
                bail!("GTF file not found: {}", file.display());
            }

            let db = open(&database)?;
            match import_genes(&db, &file, |_| yes || confirm_replace())? {
                Some(stats) => info!("Imported {} genes", stats.genes_imported),
                None => warn!("Existing genes kept"),
            }
            Ok(())
        }
        Command::ImportTranscripts { file } => {
            if !file.exists() {
                bail!("GTF file not found: {}", file.display());
            }

            let db = open(&database)?;
            let stats = import_transcripts(&db, &file)?;
            info!(
                "Imported {} transcripts and {} exons",
                stats.transcripts_imported, stats.exons_imported
            );
            Ok(())
        }
        Command::CheckDb => check_db(&database),
    }
}

fn open(path: &Path) -> Result<Database> {
    Database::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn run_server(config: Config) -> Result<()> {
    let db = open(&config.database)?;
    info!("Using database {}", config.database.display());

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(snpdb::api::serve(&config, db))
}

/// Ask on the terminal whether existing genes may be replaced.
fn confirm_replace() -> bool {
    eprint!("Do you want to clear existing genes and re-import? (yes/no): ");
    let _ = io::stderr().flush();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => answer.trim().eq_ignore_ascii_case("yes"),
        Err(_) => false,
    }
}

/// Import runs listed by `check-db`.
const RECENT_IMPORTS: i64 = 5;

fn check_db(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Database not found: {}", path.display());
    }

    let db = Database::connect(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    db.ping().context("Database query failed")?;

    let conn = db.connection();
    let missing = missing_tables(&conn)?;
    if !missing.is_empty() {
        bail!("Missing tables: {}", missing.join(", "));
    }

    let counts = store::counts(&conn)?;
    info!(
        "Database OK: {} variants, {} targets, {} effect values",
        counts.variants, counts.targets, counts.effects
    );

    for (import_type, status, records) in import_log::recent(&conn, RECENT_IMPORTS)? {
        info!("Import {}: {} ({} records)", import_type, status, records);
    }
    Ok(())
}
