use tracing::error;
use tracing_subscriber::EnvFilter;

mod config;
mod csv_export;
mod mailer;
mod models;
mod storage;
mod supabase;

use config::{DatabaseConfig, ExportConfig, SmtpConfig};
use csv_export::TableExporter;
use mailer::{DigestMailer, SmtpMailer};
use models::Result;
use storage::DiskStore;
use supabase::SupabaseClient;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("csv_digest=info".parse().unwrap()),
        )
        .init();

    // Any failure that reaches this point is run-fatal: log it and exit
    // non-zero so the scheduler can see the run went wrong.
    if let Err(e) = run().await {
        error!("Run failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let step = std::env::args().nth(1).unwrap_or_default();
    match step.as_str() {
        "export" => run_export().await,
        "send" => run_send().await,
        _ => Err("Usage: csv-digest <export|send>".into()),
    }
}

/// Step one: dump every configured table to a dated CSV file.
async fn run_export() -> Result<()> {
    let database = DatabaseConfig::from_env()?;
    let export = ExportConfig::from_env();

    let client = SupabaseClient::new(database);
    let store = DiskStore::new(&export.output_dir);

    TableExporter::new(&client, &store)
        .export_all(&export.tables)
        .await
}

/// Step two: mail everything the export step (this run or a prior one)
/// left in the output directory.
async fn run_send() -> Result<()> {
    let smtp = SmtpConfig::from_env()?;
    let export = ExportConfig::from_env();

    let store = DiskStore::new(&export.output_dir);
    let transport = SmtpMailer::new(&smtp)?;

    DigestMailer::new(&smtp, &store, &transport)
        .send_digest()
        .await
}
