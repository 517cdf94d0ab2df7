//! Chemstore CLI - create, inspect and query a chemstore database

use clap::{Parser, Subcommand};
use chemstore::config::{self, ChemstoreConfig};
use chemstore::storage::Database;
use chemstore::ui::{self, Icons};
use rusqlite::types::Value;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "chemstore")]
#[command(version)]
#[command(about = "SQLite store for biosynthetic gene cluster data")]
#[command(long_about = r#"
Chemstore keeps gene cluster data in a single SQLite file whose schema and
chemical class map are created on first use.

Example usage:
  chemstore init --database bgcs.db
  chemstore select --table chem_class
  chemstore classify --source antismash --type T1PKS
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open or create a database and show its contents
    Init {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show row counts per table
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Run a SELECT against one table
    Select {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Table to read from
        #[arg(short, long)]
        table: String,

        /// Raw clause appended after the table name (e.g. "WHERE name = ?")
        #[arg(short, long, default_value = "")]
        r#where: String,

        /// Positional parameter for the clause (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Column to select (repeatable, defaults to all)
        #[arg(long = "column")]
        columns: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Look up the chemical class of a source type
    Classify {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Annotation source (e.g. antismash, mibig)
        #[arg(short, long)]
        source: String,

        /// Type string reported by the source
        #[arg(short = 'T', long = "type")]
        type_source: String,
    },

    /// Show crate and schema versions
    Version,
}

fn open_database(flag: Option<PathBuf>, config: Option<&ChemstoreConfig>) -> anyhow::Result<(PathBuf, Database)> {
    let path = config::resolve_database_path(flag, config);
    config::ensure_db_dir(&path)?;
    let db = Database::open(&path)?;
    Ok((path, db))
}

/// Parameters from the command line are bound as integers when they parse as one
fn parse_param(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(i) => Value::Integer(i),
        Err(_) => Value::Text(raw.to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?;

    if let Err(e) = run(cli.command, config.as_ref()) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn run(command: Commands, config: Option<&ChemstoreConfig>) -> anyhow::Result<()> {
    match command {
        Commands::Init { database } => {
            let (path, db) = open_database(database, config)?;
            ui::header(Icons::DATABASE, &format!("Database: {}", path.display()));
            ui::info("Schema version", db.schema_version());
            println!("{}", ui::stats_table(&db.stats()?));
            db.close()?;
            ui::success("Database ready");
        }

        Commands::Stats { database } => {
            let (path, db) = open_database(database, config)?;
            let stats = db.stats()?;

            ui::header(Icons::STATS, &format!("Chemstore Statistics ({})", path.display()));
            ui::summary_row("Schema version:", &stats.schema_version);
            println!("{}", ui::stats_table(&stats));
        }

        Commands::Select { database, table, r#where, params, columns, format } => {
            let (_, db) = open_database(database, config)?;
            let params: Vec<Value> = params.iter().map(|p| parse_param(p)).collect();
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();

            tracing::debug!("SELECT from {} {} ({} params)", table, r#where, params.len());
            let records = db.select(&table, &r#where, &params, &columns)?;

            if format == "json" {
                let rows: Vec<serde_json::Value> = records.iter().map(|r| r.to_json()).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if records.is_empty() {
                println!("∅ No rows found.");
            } else {
                println!("{}", ui::records_table(&records));
                println!("{}", ui::dim(&format!("{} rows", records.len())));
            }
        }

        Commands::Classify { database, source, type_source } => {
            let (_, db) = open_database(database, config)?;

            ui::header(Icons::SEARCH, &format!("Classifying {} / {}", source, type_source));
            match db.classify(&source, &type_source)? {
                Some((class, subclass)) => {
                    ui::summary_row("Class:", &class);
                    ui::summary_row("Subclass:", &subclass);
                }
                None => {
                    ui::warn(&format!("No mapping for {} type {:?}", source, type_source));
                }
            }
        }

        Commands::Version => {
            ui::header(Icons::TAG, &format!("chemstore {}", env!("CARGO_PKG_VERSION")));
            ui::summary_row("Schema version:", &chemstore::storage::schema::expected_version()?);
        }
    }

    Ok(())
}
