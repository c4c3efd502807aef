use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use data_ingest::storage::{schema, users, Database};
use ingest_sdk::{sample_records, IngestClient};

#[derive(Parser)]
#[command(name = "ingest-cli")]
#[command(about = "Management CLI for the data-ingest service", long_about = None)]
struct Cli {
    /// Base URL of a running service.
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    url: String,

    /// Static API token.
    #[arg(short, long, env = "API_TOKEN", default_value = "")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop and recreate all tables, then create one login account
    ResetDb {
        #[arg(long, env = "DATABASE_URL", default_value = "ingest.db")]
        database: String,
        #[arg(long, default_value = "admin")]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create a login account (or change its password)
    CreateUser {
        #[arg(long, env = "DATABASE_URL", default_value = "ingest.db")]
        database: String,
        username: String,
        password: String,
    },
    /// Replace the stored records with a sample batch or a JSON file
    SendTestData {
        /// JSON file holding an array of objects.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show service status
    Status,
    /// Lift a login block on a client identifier
    Unblock { identifier: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ResetDb {
            database,
            username,
            password,
        } => {
            let db = Database::open(&database)?;
            db.call_blocking(|conn| {
                schema::reset_all_tables(conn)?;
                users::upsert_user(conn, &username, &password)
            })?;
            println!("Tables recreated in {}", database);
            println!("Created user '{}'", username);
        }
        Commands::CreateUser {
            database,
            username,
            password,
        } => {
            let db = Database::open(&database)?;
            let id = db.call_blocking(|conn| users::upsert_user(conn, &username, &password))?;
            println!("User '{}' saved (id {})", username, id);
        }
        Commands::SendTestData { file } => {
            let records: Vec<Value> = match file {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => sample_records(),
            };
            let client = IngestClient::new(&cli.url)?.with_token(&cli.token);
            let summary = client.push_records(&records).await?;
            println!("{} ({} records)", summary.message, summary.total);
        }
        Commands::Status => {
            let client = IngestClient::new(&cli.url)?.with_token(&cli.token);
            print_json(&client.status().await?)?;
        }
        Commands::Unblock { identifier } => {
            let client = IngestClient::new(&cli.url)?.with_token(&cli.token);
            print_json(&client.unblock(&identifier).await?)?;
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
