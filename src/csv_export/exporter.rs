use chrono::Utc;
use tracing::{error, info};

use super::convert::records_to_csv;
use crate::models::Result;
use crate::storage::ExportStore;
use crate::supabase::TableSource;

pub const CSV_SUFFIX: &str = ".csv";

/// `<table>_<YYYY-MM-DD>.csv`, overwritten if the job reruns the same day.
pub fn artifact_name(table: &str) -> String {
    format!("{}_{}.csv", table, Utc::now().format("%Y-%m-%d"))
}

pub struct TableExporter<'a> {
    source: &'a dyn TableSource,
    store: &'a dyn ExportStore,
}

impl<'a> TableExporter<'a> {
    pub fn new(source: &'a dyn TableSource, store: &'a dyn ExportStore) -> Self {
        Self { source, store }
    }

    /// Export every listed table in order. A failed table is logged and
    /// leaves a placeholder file behind; the remaining tables still run.
    /// Only preparing the output directory can fail the whole step.
    pub async fn export_all(&self, tables: &[String]) -> Result<()> {
        info!("Starting Supabase CSV export...");

        if tables.is_empty() {
            info!("No tables configured to export, nothing to do");
            return Ok(());
        }

        info!("Tables to export: {}", tables.join(", "));
        self.store.ensure_dir().await?;

        for table in tables {
            if let Err(e) = self.export_table(table).await {
                error!("Error exporting {}: {}", table, e);
            }
        }

        info!("CSV export completed");
        Ok(())
    }

    /// A query failure is recovered here: the artifact gets a single-line
    /// error marker in place of CSV content. Only the file write itself can
    /// escape, and `export_all` swallows that too.
    async fn export_table(&self, table: &str) -> Result<()> {
        info!("Exporting table: {}", table);
        let filename = artifact_name(table);

        match self.source.fetch_all_rows(table).await {
            Ok(rows) => {
                let csv = records_to_csv(&rows);
                self.store.write_file(&filename, csv.as_bytes()).await?;
                info!("Exported {} rows to {}", rows.len(), filename);
            }
            Err(e) => {
                error!("Failed to export {}: {}", table, e);
                let placeholder = format!("Error exporting data: {}", e);
                self.store
                    .write_file(&filename, placeholder.as_bytes())
                    .await?;
            }
        }

        Ok(())
    }
}
