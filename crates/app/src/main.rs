use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "centime", version, about = "Statement import and spending ledger")]
struct Cli {
    /// Database file. Defaults to the platform data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a statement file (csv, xlsx, txt or pdf) and import it.
    Import {
        file: PathBuf,
        /// Header name of the date column, for files that cannot be
        /// auto-mapped. Give all three column flags together.
        #[arg(long)]
        date_col: Option<String>,
        /// Header name of the merchant/description column.
        #[arg(long)]
        merchant_col: Option<String>,
        /// Header name of the amount column.
        #[arg(long)]
        amount_col: Option<String>,
        /// Import rows flagged as duplicates instead of skipping them.
        #[arg(long)]
        keep_duplicates: bool,
    },
    /// List stored transactions.
    List {
        /// Substring match on merchant or raw description.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// purchase, transfer or income.
        #[arg(long)]
        kind: Option<String>,
        /// Earliest date, YYYY-MM-DD.
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest date, YYYY-MM-DD.
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Show stored transactions with a merchant similar to the given one.
    Similar {
        id: i64,
        #[arg(long, default_value_t = 0.70)]
        threshold: f64,
    },
    /// Re-categorize one transaction; the edit also updates the merchant
    /// cache so future imports follow it.
    SetCategory {
        id: i64,
        category: String,
        /// purchase, transfer or income. Defaults to purchase.
        #[arg(long, default_value = "purchase")]
        kind: String,
    },
    /// Delete one transaction by id.
    Delete { id: i64 },
    /// Spending totals by category, purchases only.
    Stats,
    /// Delete every stored transaction.
    Wipe {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let pool = centime_storage::create_db(&db_path)
        .await
        .with_context(|| format!("opening database at {}", db_path.display()))?;

    match cli.command {
        Command::Import {
            file,
            date_col,
            merchant_col,
            amount_col,
            keep_duplicates,
        } => {
            commands::import(&pool, &file, date_col, merchant_col, amount_col, keep_duplicates)
                .await
        }
        Command::List { search, category, kind, from, to } => {
            commands::list(&pool, search, category, kind, from, to).await
        }
        Command::Similar { id, threshold } => commands::similar(&pool, id, threshold).await,
        Command::SetCategory { id, category, kind } => {
            commands::set_category(&pool, id, &category, &kind).await
        }
        Command::Delete { id } => commands::delete(&pool, id).await,
        Command::Stats => commands::stats(&pool).await,
        Command::Wipe { yes } => commands::wipe(&pool, yes).await,
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "centime", "Centime")
        .context("no home directory available")?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    Ok(data_dir.join("centime.db"))
}
