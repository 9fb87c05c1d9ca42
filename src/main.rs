//! kqlforge CLI
//!
//! Command-line interface for working with visual Kusto queries:
//! - Compile a saved query file to KQL
//! - Browse cluster schema (databases, tables)
//! - Run KQL against a cluster
//! - Check cluster connectivity

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kqlforge::adx::AdxClient;
use kqlforge::config::Config;
use kqlforge::expr::{KustoQuery, QueryExpression};
use kqlforge::kql;
use kqlforge::schema::{Schema, SchemaResolver};
use kqlforge::transport::QueryTransport;

#[derive(Parser)]
#[command(name = "kqlforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Visual query builder toolkit for Azure Data Explorer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a saved query file to KQL
    Compile {
        /// Path to a saved query JSON file (full query object or bare expression)
        file: PathBuf,
        /// Optional schema document for column-type resolution
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Database to resolve columns against (default: the query's database)
        #[arg(short, long)]
        database: Option<String>,
    },

    /// List databases in the cluster
    Databases,

    /// List tables of a database
    Tables {
        /// Database name
        database: String,
    },

    /// Execute KQL against the cluster
    Run {
        /// Query text
        query: String,
        /// Database name (default: configured default database)
        #[arg(short, long)]
        database: Option<String>,
    },

    /// Check cluster connectivity
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    init_logging(&config);

    match cli.command {
        Commands::Compile {
            file,
            schema,
            database,
        } => compile_file(&config, &file, schema.as_deref(), database),
        Commands::Databases => list_databases(&config).await,
        Commands::Tables { database } => list_tables(&config, &database).await,
        Commands::Run { query, database } => run_query(&config, &query, database).await,
        Commands::Check => check(&config).await,
    }
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kqlforge={}", config.logging.level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn compile_file(
    config: &Config,
    file: &std::path::Path,
    schema_file: Option<&std::path::Path>,
    database: Option<String>,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    // Accept either the host's full query object or a bare expression.
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let query: KustoQuery = if value.get("expression").is_some() || value.get("query").is_some() {
        serde_json::from_value(value)
            .with_context(|| format!("{} is not a saved query", file.display()))?
    } else {
        let expression: QueryExpression = serde_json::from_value(value)
            .with_context(|| format!("{} is not a query expression", file.display()))?;
        KustoQuery {
            expression,
            ..Default::default()
        }
    };

    let database = database
        .or_else(|| {
            if query.database.is_empty() {
                None
            } else {
                Some(query.database.clone())
            }
        })
        .unwrap_or_else(|| config.adx.default_database.clone());

    let columns = match (schema_file, query.expression.table()) {
        (Some(path), Some(table)) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let schema: Schema = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a schema document", path.display()))?;

            schema
                .databases
                .get(&database)
                .and_then(|db| {
                    db.tables
                        .get(table)
                        .or_else(|| db.external_tables.get(table))
                })
                .map(|table| table.ordered_columns.clone())
                .unwrap_or_default()
        }
        _ => Vec::new(),
    };

    let text = kql::compile(&query.expression, &columns, &database);
    if text.is_empty() {
        bail!("expression has no source table; nothing to compile");
    }

    println!("{}", text);
    Ok(())
}

async fn list_databases(config: &Config) -> anyhow::Result<()> {
    let resolver = resolver(config);

    for database in resolver.databases().await? {
        println!("{} ({} tables)", database.name, database.all_tables().count());
    }
    Ok(())
}

async fn list_tables(config: &Config, database: &str) -> anyhow::Result<()> {
    let resolver = resolver(config);

    let tables = resolver.tables(database).await?;
    if tables.is_empty() {
        bail!("no tables found in database '{}'", database);
    }
    for table in tables {
        println!("{} ({} columns)", table.name, table.ordered_columns.len());
    }
    Ok(())
}

async fn run_query(config: &Config, query: &str, database: Option<String>) -> anyhow::Result<()> {
    let client = AdxClient::new(config.adx.clone());
    let database = database.unwrap_or_else(|| config.adx.default_database.clone());

    let result = client.execute(query, &database).await?;

    let header: Vec<&str> = result
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect();
    println!("{}", header.join("\t"));

    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        println!("{}", cells.join("\t"));
    }

    tracing::info!(rows = result.len(), "query completed");
    Ok(())
}

async fn check(config: &Config) -> anyhow::Result<()> {
    let client = AdxClient::new(config.adx.clone());

    client.connectivity_check().await?;
    println!("Successfully connected to {}", config.adx.base_url);
    Ok(())
}

fn resolver(config: &Config) -> SchemaResolver {
    SchemaResolver::new(Arc::new(AdxClient::new(config.adx.clone())))
}
