use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::models::{Record, Result};

/// Remote query seam: fetch every row of one table, ordered by ascending id.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch_all_rows(&self, table: &str) -> Result<Vec<Record>>;
}

pub struct SupabaseClient {
    config: DatabaseConfig,
    client: Client,
}

impl SupabaseClient {
    pub fn new(config: DatabaseConfig) -> Self {
        debug!("Created SupabaseClient for {}", config.url);
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TableSource for SupabaseClient {
    async fn fetch_all_rows(&self, table: &str) -> Result<Vec<Record>> {
        let url = format!("{}/rest/v1/{}", self.config.url, table);
        debug!("GET {} (select=*, order=id.asc)", url);

        let response = self
            .client
            .get(&url)
            .query(&[("select", "*"), ("order", "id.asc")])
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .send()
            .await?;

        if response.status().is_success() {
            let rows: Vec<Record> = response.json().await?;
            debug!("Fetched {} rows from {}", rows.len(), table);
            Ok(rows)
        } else {
            let status = response.status();
            let error_text = response.text().await?;
            Err(format!("Supabase query error for {}: {} {}", table, status, error_text).into())
        }
    }
}
