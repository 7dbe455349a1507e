//! CLI module for promo-store.
//!
//! Administrative access to subscriber records. It can be used either as a
//! standalone binary or as a subcommand of the main promo-rs CLI.
//!
//! A `<target>` is either an SQL URL or a path ending in `.csv` (sheet backend).
//!
//! # Usage
//!
//! ```bash
//! # Initialize database schema
//! promo-store init -d sqlite:promo.db
//!
//! # List all records
//! promo-store list -d sqlite:promo.db
//!
//! # Show one record
//! promo-store show -d subscribers.csv -u 123456789
//!
//! # Move records between backends
//! promo-store export -d sqlite:promo.db -o subscribers.csv
//! promo-store import -d sqlite:promo.db -i subscribers.csv
//!
//! # Exclude a user from the promotion
//! promo-store mark-ineligible -d sqlite:promo.db -u 123456789
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::layout;
use crate::record::{StoredTime, StubOutcome, UserId, UserRecord};
use crate::sheet::SheetStore;
use crate::sql::{DatabaseType, SqlStore, SqlStoreConfig};
use crate::traits::RecordStore;

/// Promo record store management CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "promo-store",
    version,
    about = "Manage promo subscriber records"
)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub command: StoreCommands,
}

/// Store CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum StoreCommands {
    /// Initialize database schema.
    Init {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,
    },

    /// List all records.
    List {
        /// Database URL or sheet path.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// Output format (table, json, csv).
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show one record.
    Show {
        /// Database URL or sheet path.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// User ID.
        #[arg(short, long)]
        user_id: UserId,
    },

    /// Write every record to a sheet file.
    Export {
        /// Database URL or sheet path to read from.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// Output sheet path.
        #[arg(short, long)]
        output: String,
    },

    /// Load a sheet file into an SQL database, skipping users already present.
    Import {
        /// Database connection URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// Input sheet path.
        #[arg(short, long)]
        input: String,
    },

    /// Record a user as ineligible (bare record, no window).
    MarkIneligible {
        /// Database URL or sheet path.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// User ID.
        #[arg(short, long)]
        user_id: UserId,

        /// Optional display name.
        #[arg(short = 'n', long)]
        name: Option<String>,
    },
}

/// Record row for display.
#[derive(Tabled, Serialize)]
struct RecordDisplay {
    #[tabled(rename = "User ID")]
    user_id: String,
    #[tabled(rename = "Name")]
    display_name: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Issued")]
    code_issued_at: String,
    #[tabled(rename = "Joined")]
    joined_at: String,
}

impl From<&UserRecord> for RecordDisplay {
    fn from(record: &UserRecord) -> Self {
        let stamp = |t: &Option<StoredTime>| t.as_ref().map(StoredTime::to_field).unwrap_or_default();
        Self {
            user_id: record.user_id.to_string(),
            display_name: record.display_name.clone().unwrap_or_default(),
            code: record
                .code
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_default(),
            code_issued_at: stamp(&record.code_issued_at),
            joined_at: stamp(&record.joined_at),
        }
    }
}

/// Run the store CLI with the given arguments.
///
/// This is the main entry point for the store CLI, used by both the
/// standalone binary and the unified promo-rs CLI.
pub async fn run(args: StoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        StoreCommands::Init { database } => init_database(&database).await,
        StoreCommands::List { database, format } => list_records(&database, &format).await,
        StoreCommands::Show { database, user_id } => show_record(&database, user_id).await,
        StoreCommands::Export { database, output } => export_records(&database, &output).await,
        StoreCommands::Import { database, input } => import_records(&database, &input).await,
        StoreCommands::MarkIneligible {
            database,
            user_id,
            name,
        } => mark_ineligible(&database, user_id, name.as_deref()).await,
    }
}

/// Open a store from an SQL URL or a `.csv` sheet path.
pub async fn open_target(target: &str) -> Result<Box<dyn RecordStore>, Box<dyn std::error::Error>> {
    if DatabaseType::from_url(target).is_some() {
        let store = connect_sql(target).await?;
        Ok(Box::new(store))
    } else if target.ends_with(".csv") {
        Ok(Box::new(SheetStore::open(target).await?))
    } else {
        Err(format!("unrecognized store target: {target}").into())
    }
}

async fn connect_sql(url: &str) -> Result<SqlStore, Box<dyn std::error::Error>> {
    Ok(SqlStore::connect(SqlStoreConfig::new(url).max_connections(1)).await?)
}

/// Initialize database schema.
async fn init_database(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = connect_sql(url).await?;
    store.init_schema().await?;
    println!("Database schema initialized successfully.");
    Ok(())
}

/// List all records in the requested format.
async fn list_records(target: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_target(target).await?;
    let records = store.list().await?;

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    match format {
        "json" => {
            let rows: Vec<RecordDisplay> = records.iter().map(RecordDisplay::from).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "csv" => print!("{}", layout::encode(&records)?),
        _ => {
            let rows: Vec<RecordDisplay> = records.iter().map(RecordDisplay::from).collect();
            println!("{}", Table::new(rows));
        }
    }

    Ok(())
}

/// Show one record.
async fn show_record(target: &str, user_id: UserId) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_target(target).await?;
    match store.find(user_id).await? {
        Some(record) => {
            let row = RecordDisplay::from(&record);
            println!("User ID:   {}", row.user_id);
            println!("Name:      {}", row.display_name);
            println!("Code:      {}", row.code);
            println!("Issued at: {}", row.code_issued_at);
            println!("Joined at: {}", row.joined_at);
            if matches!(record.joined_at, Some(StoredTime::Malformed(_))) {
                println!("  (joined_at does not parse; treated as expired)");
            }
        }
        None => println!("No record for user {user_id}."),
    }
    Ok(())
}

/// Write every record to a sheet file.
async fn export_records(target: &str, output: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_target(target).await?;
    let records = store.list().await?;
    tokio::fs::write(output, layout::encode(&records)?).await?;
    println!("Exported {} records to {output}.", records.len());
    Ok(())
}

/// Load a sheet file into SQL without overwriting existing users.
async fn import_records(url: &str, input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = connect_sql(url).await?;
    let text = tokio::fs::read_to_string(input).await?;
    let sheet = layout::decode(&text)?;

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for record in sheet.records() {
        if store.insert_if_absent(record).await? {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    println!("Imported {inserted} records ({skipped} already present).");
    if sheet.raw_count() > 0 {
        println!(
            "{} rows without a numeric user_id were not imported.",
            sheet.raw_count()
        );
    }
    Ok(())
}

/// Insert a bare record so the user never receives a window.
async fn mark_ineligible(
    target: &str,
    user_id: UserId,
    name: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_target(target).await?;
    match store.create_stub(user_id, name).await? {
        StubOutcome::Created => println!("User {user_id} marked ineligible."),
        StubOutcome::AlreadyExists => {
            println!("User {user_id} already has a record; nothing changed.")
        }
    }
    Ok(())
}
