use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

use erdforge::config::Settings;
use erdforge::diagram::{DetailLevel, DiagramGraph};
use erdforge::oracle::OracleOutput;
use erdforge::sink::{SqliteSink, drop_tables, execute_script};
use erdforge::validate::validate;
use erdforge::{Schema, generate, generate_drop_tables, parse_sql_with_report, pipeline, split_statements};

/// Schema engine: structured ER schemas to SQL DDL and back.
#[derive(Debug, Parser)]
#[command(name = "erdforge", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to ./erdforge.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Single-line JSON output
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a JSON schema as CREATE TABLE statements
    Generate {
        /// Schema JSON file, or - for stdin
        input: String,
    },
    /// Parse CREATE TABLE statements into a JSON schema
    Parse {
        /// SQL file, or - for stdin
        input: String,
        /// Print the diagram graph instead of the schema
        #[arg(long)]
        diagram: bool,
        /// Diagram detail level: tables, pk, pk_fk, all
        #[arg(long, default_value = "all")]
        detail: String,
    },
    /// Print each executable statement of a script
    Split {
        /// SQL file, or - for stdin
        input: String,
    },
    /// Turn an oracle response into {sql, schema}
    Normalize {
        /// Response file, or - for stdin; omitted means no response
        input: Option<String>,
    },
    /// Execute a script against the SQLite database
    Apply {
        /// SQL file, or - for stdin
        input: String,
        /// Database path (overrides config)
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Print a table (or the whole database) as a JSON schema
    Describe {
        /// Table to describe; every table when omitted
        table: Option<String>,
        /// Database path (overrides config)
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Print DROP TABLE statements, or run them with --apply
    Drop {
        /// Database path (overrides config)
        #[arg(long)]
        database: Option<PathBuf>,
        /// Execute the statements against the database
        #[arg(long)]
        apply: bool,
        /// Tables to drop; all tables in the database when omitted
        tables: Vec<String>,
    },
}

fn main() {
    if let Err(error) = run() {
        eprintln!("erdforge error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    let pretty = settings.output.pretty && !cli.compact;

    match cli.command {
        Command::Generate { input } => {
            let text = read_input(&input)?;
            let schema = Schema::from_json(&text).context("invalid schema JSON")?;
            for issue in validate(&schema) {
                warn!(%issue, "schema issue");
            }
            println!("{}", generate(&schema));
        }
        Command::Parse {
            input,
            diagram,
            detail,
        } => {
            let text = read_input(&input)?;
            let report = parse_sql_with_report(&text);
            for gap in &report.gaps {
                warn!(%gap, "skipped part of input");
            }
            if diagram {
                let Some(level) = DetailLevel::from_str(&detail) else {
                    bail!("invalid detail level: {detail}");
                };
                print_json(&DiagramGraph::from_schema(&report.schema, level), pretty)?;
            } else {
                print_json(&report.schema, pretty)?;
            }
        }
        Command::Split { input } => {
            let text = read_input(&input)?;
            for statement in split_statements(&text) {
                println!("{statement};");
            }
        }
        Command::Normalize { input } => {
            let text = input.as_deref().map(read_input).transpose()?;
            let output = text
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(OracleOutput::from_response);
            print_json(&pipeline::normalize(output), pretty)?;
        }
        Command::Apply { input, database } => {
            let text = read_input(&input)?;
            let mut sink = open_database(&database_path(database, &settings))?;
            let reports = execute_script(&mut sink, &text)?;
            print_json(&reports, pretty)?;
        }
        Command::Describe { table, database } => {
            let sink = open_database(&database_path(database, &settings))?;
            let schema = match table {
                Some(table) => sink.table_schema(&table),
                None => sink.schema(),
            }
            .context("failed to describe database")?;
            print_json(&schema, pretty)?;
        }
        Command::Drop {
            database,
            apply,
            tables,
        } => {
            if !apply && !tables.is_empty() {
                println!("{}", generate_drop_tables(&tables));
                return Ok(());
            }

            let mut sink = open_database(&database_path(database, &settings))?;
            let tables = if tables.is_empty() {
                sink.table_names().context("failed to list tables")?
            } else {
                tables
            };
            if apply {
                let reports = drop_tables(&mut sink, &tables)?;
                print_json(&reports, pretty)?;
            } else {
                println!("{}", generate_drop_tables(&tables));
            }
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("ERDFORGE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
}

fn database_path(flag: Option<PathBuf>, settings: &Settings) -> PathBuf {
    flag.unwrap_or_else(|| PathBuf::from(&settings.database.path))
}

fn open_database(path: &Path) -> anyhow::Result<SqliteSink> {
    SqliteSink::open(path).with_context(|| format!("failed to open database {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
