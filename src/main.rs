//! # Factual CLI (`factual`)
//!
//! Command-line access to the Factual tables API: inspect a schema, run
//! reads, fetch single rows, and submit input suggestions.
//!
//! ## Usage
//!
//! ```bash
//! factual --config ./config/factual.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `factual schema <table>` | Print a table's schema |
//! | `factual read <table>` | Read rows (filter, sort, search, paging) |
//! | `factual row <table> <subject_key>` | Read one row by subject key |
//! | `factual input <table> <subject_key> <field> <value>` | Suggest a value |
//! | `factual token <unique_id>` | Fetch a delegated token |
//! | `factual completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Second page of ten Californian rows, largest first
//! factual read EZ21ij --filter '{"state":"CA"}' --sort population:desc --page 2 --size 10
//!
//! # Show the request without sending it
//! factual read EZ21ij --search coffee --dry-run
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use factual::client::{Factual, InputOptions};
use factual::config::load_config;
use factual::query::{ReadParams, SortSpec};
use factual::row::Row;
use factual::wire::table_resource;

/// Factual CLI: read tables and submit input suggestions.
///
/// All commands except `completions` read a TOML configuration file
/// holding at least the API key. See the `config` module docs for the
/// recognized keys.
#[derive(Parser)]
#[command(
    name = "factual",
    about = "Factual tables API client: schema lookup, filtered reads, and input suggestions",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/factual.toml")]
    config: PathBuf,

    /// Log every request URL.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a table's schema attributes and fields.
    Schema {
        /// Table key.
        table: String,
    },

    /// Read rows from a table.
    ///
    /// Prints one JSON object per row. The total row count reported by
    /// the service goes to stderr.
    Read {
        /// Table key.
        table: String,

        /// Filter expression as JSON, e.g. `{"state":"CA"}`.
        #[arg(long)]
        filter: Option<String>,

        /// Sort spec `field[:asc|desc]`. Repeatable; the service applies
        /// the first two.
        #[arg(long = "sort")]
        sorts: Vec<SortSpec>,

        /// Free-text search term. Repeatable.
        #[arg(long = "search")]
        search: Vec<String>,

        /// Page number (1-based).
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Rows per page.
        #[arg(long)]
        size: Option<i64>,

        /// Fetch only the first matching row.
        #[arg(long)]
        one: bool,

        /// Print the request path without contacting the service.
        #[arg(long)]
        dry_run: bool,
    },

    /// Read a single row by subject key.
    Row {
        table: String,
        subject_key: String,
    },

    /// Suggest a value for one fact.
    Input {
        table: String,
        subject_key: String,
        /// Field reference.
        field: String,
        /// New value. Parsed as JSON when possible, otherwise sent as text.
        value: String,

        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        comment: Option<String>,

        /// Delegated token (see `factual token`).
        #[arg(long)]
        token: Option<String>,
    },

    /// Fetch a delegated token for a shadow account.
    Token {
        unique_id: String,
    },

    /// Print shell completions.
    Completions {
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "factual", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = load_config(&cli.config)?;
    let debug = cfg.debug || cli.debug;
    let api = Factual::new(cfg.with_debug(debug))?;

    match cli.command {
        Commands::Schema { table } => {
            let table = api.table(&table)?;
            let schema = table.schema();
            println!("--- Table {} ---", table.key());
            println!("name:            {}", schema.name.as_deref().unwrap_or("(unnamed)"));
            if let Some(ref d) = schema.description {
                println!("description:     {}", d);
            }
            if let Some(ref s) = schema.source {
                println!("source:          {}", s);
            }
            if let Some(ref c) = schema.creator {
                println!("creator:         {}", c);
            }
            if let Some(r) = schema.rating {
                println!("rating:          {}", r);
            }
            if let Some(n) = schema.total_row_count {
                println!("total_row_count: {}", n);
            }
            println!("geo_enabled:     {}", schema.geo_enabled);
            println!("downloadable:    {}", schema.downloadable);
            println!();
            println!("--- Fields ({}) ---", schema.fields().len());
            for field in schema.fields() {
                let marker = if field.is_primary { " (primary)" } else { "" };
                println!("{:>6}  {}{}", field.id, field.field_ref, marker);
            }
        }

        Commands::Read {
            table,
            filter,
            sorts,
            search,
            page,
            size,
            one,
            dry_run,
        } => {
            let filter: Value = match filter {
                Some(text) => serde_json::from_str(&text)
                    .with_context(|| format!("--filter is not valid JSON: {}", text))?,
                None => Value::Null,
            };

            if dry_run {
                let mut params = ReadParams::default();
                params.page(page, size).filter(filter).sort(sorts).search(search);
                let limit = if one { Some(1) } else { None };
                let resource = format!(
                    "{}?{}",
                    table_resource(&table, "read.jsaml"),
                    params.to_query_string(limit)?
                );
                println!("{}", api.api_path(&resource));
                return Ok(());
            }

            let table = api.table(&table)?;
            let mut query = table.query();
            query.page(page, size).filter(filter).sort(sorts).search(search);

            if one {
                match query.find_one()? {
                    Some(row) => println!("{}", row_json(&row)),
                    None => eprintln!("no matching row"),
                }
            } else {
                for row in query.each_row()? {
                    println!("{}", row_json(&row));
                }
            }
            if let Some(total) = query.total_rows() {
                eprintln!("total_rows: {}", total);
            }
        }

        Commands::Row { table, subject_key } => {
            let table = api.table(&table)?;
            match table.get_row(&subject_key)? {
                Some(row) => println!("{}", row_json(&row)),
                None => {
                    eprintln!("Error: no row with subject key {}", subject_key);
                    std::process::exit(1);
                }
            }
        }

        Commands::Input {
            table,
            subject_key,
            field,
            value,
            source,
            comment,
            token,
        } => {
            let table = api.table(&table)?;
            let row = table
                .get_row(&subject_key)?
                .with_context(|| format!("no row with subject key {}", subject_key))?;
            let fact = row
                .fact(&field)
                .with_context(|| format!("row has no non-primary field '{}'", field))?;

            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let options = InputOptions {
                source,
                comment,
                token,
            };
            if table.input_fact(fact, Some(value), &options)? {
                println!("input submitted");
            } else {
                println!("nothing to submit");
            }
        }

        Commands::Token { unique_id } => {
            println!("{}", api.get_token(&unique_id)?);
        }

        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

fn row_json(row: &Row) -> Value {
    let facts: Map<String, Value> = row
        .facts()
        .iter()
        .map(|f| (f.field_ref().to_string(), f.value().clone()))
        .collect();
    json!({
        "subject_key": row.subject_key(),
        "subject": row.subject(),
        "facts": facts,
    })
}
