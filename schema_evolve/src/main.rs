use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};

use schema_evolve::config::{self, Config};
use schema_evolve::utils::logging::init_logging;
use schema_evolve::{ColumnDescriptor, SchemaClient, SortOrder};

#[derive(Parser)]
#[command(name = "schema_evolve", version, about = "Inspect and evolve SQLite table schemas")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, conflicts_with = "url")]
    config: Option<String>,

    /// Database URL, e.g. sqlite://data.db
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List user tables
    Tables,
    /// Print a table's schema as JSON
    Columns {
        table: String,
        /// Keep unreadable metadata flags visible instead of reading them as false
        #[arg(long)]
        raw: bool,
    },
    /// Create a table from column specs (name:type[:pk,ai,notnull,unique])
    CreateTable {
        table: String,
        #[arg(long = "column", required = true)]
        columns: Vec<String>,
    },
    /// Append a column (name:type[:flags])
    AddColumn { table: String, column: String },
    /// Remove a column by rebuilding the table
    DropColumn { table: String, column: String },
    /// Count a table's rows
    Count { table: String },
    /// Print a table's rows as JSON
    Rows {
        table: String,
        #[arg(long = "order-by")]
        order_by: Vec<String>,
        #[arg(long)]
        desc: bool,
    },
    /// Run a statement; with --query, print the rows it returns
    Exec {
        sql: String,
        #[arg(long)]
        query: bool,
    },
}

/// Parse `name:type[:flag,flag]`, flags being pk, ai, notnull and unique
fn parse_column_spec(spec: &str) -> anyhow::Result<ColumnDescriptor> {
    let mut parts = spec.splitn(3, ':');
    let name = parts.next().filter(|n| !n.is_empty()).ok_or_else(|| anyhow!("empty column spec"))?;
    let declared = parts.next().filter(|t| !t.is_empty());

    let mut column = ColumnDescriptor::from_declared(name, declared);
    for flag in parts.next().unwrap_or("").split(',').filter(|f| !f.is_empty()) {
        column = match flag.trim().to_lowercase().as_str() {
            "pk" => column.primary_key(true),
            "ai" => column.auto_increment(true),
            "notnull" => column.not_null(true),
            "unique" => column.unique(true),
            other => bail!("unknown column flag '{}' in '{}'", other, spec),
        };
    }

    Ok(column)
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match (&cli.config, &cli.url) {
        (Some(path), _) => config::load_from_file(path).with_context(|| format!("loading {}", path)),
        (None, Some(url)) => Ok(Config::for_url(url)),
        (None, None) => bail!("pass --config <file> or --url <database url>"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.logging)?;

    let client = SchemaClient::new(config).await?;

    match cli.command {
        Command::Tables => {
            for name in client.table_names().await? {
                println!("{}", name);
            }
        }
        Command::Columns { table, raw } => {
            let json = if raw {
                serde_json::to_string_pretty(&client.reader().read_column_metadata(&table).await?)?
            } else {
                serde_json::to_string_pretty(&client.reader().read_table(&table).await?)?
            };
            println!("{}", json);
        }
        Command::CreateTable { table, columns } => {
            let columns = columns
                .iter()
                .map(|spec| parse_column_spec(spec))
                .collect::<anyhow::Result<Vec<_>>>()?;
            client.create_table(&table, &columns).await?;
        }
        Command::AddColumn { table, column } => {
            client.add_column(&table, &parse_column_spec(&column)?).await?;
        }
        Command::DropColumn { table, column } => {
            client.remove_column(&table, &column).await?;
        }
        Command::Count { table } => {
            println!("{}", client.rows().row_count(&table).await?);
        }
        Command::Rows { table, order_by, desc } => {
            let order = if desc { SortOrder::Descending } else { SortOrder::Ascending };
            let columns: Vec<&str> = order_by.iter().map(String::as_str).collect();
            let rows = client.rows().get_table_ordered(&table, order, &columns).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Exec { sql, query } => {
            let executor = client.executor();
            if query {
                let rows = executor.fetch_rows(&sql, &[]).await?;
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{} row(s) affected", executor.execute(&sql, &[]).await?);
            }
        }
    }

    client.close().await?;
    Ok(())
}
