use url::Url;

use crate::models::Result;

/// Remote database endpoint and credential, read once at startup.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

/// Which tables get dumped and where the files land.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub tables: Vec<String>,
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub email: String,
    pub app_password: String,
    pub recipient: String,
    pub from_name: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("SUPABASE_URL")
            .map_err(|_| "SUPABASE_URL environment variable required")?;
        let url = Url::parse(&raw).map_err(|e| format!("Invalid SUPABASE_URL: {}", e))?;

        Ok(DatabaseConfig {
            url: url.as_str().trim_end_matches('/').to_string(),
            service_role_key: std::env::var("SUPABASE_SERVICE_ROLE_KEY")
                .map_err(|_| "SUPABASE_SERVICE_ROLE_KEY environment variable required")?,
        })
    }
}

impl ExportConfig {
    pub fn from_env() -> Self {
        ExportConfig {
            tables: std::env::var("TABLES_TO_EXPORT")
                .map(|list| parse_table_list(&list))
                .unwrap_or_else(|_| {
                    vec![
                        "users".to_string(),
                        "orders".to_string(),
                        "products".to_string(),
                    ]
                }),
            output_dir: std::env::var("EXPORT_DIR").unwrap_or_else(|_| "exports".to_string()),
        }
    }
}

fn parse_table_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self> {
        Ok(SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            email: std::env::var("GMAIL_EMAIL")
                .map_err(|_| "GMAIL_EMAIL environment variable required")?,
            app_password: std::env::var("GMAIL_APP_PASSWORD")
                .map_err(|_| "GMAIL_APP_PASSWORD environment variable required")?,
            recipient: std::env::var("EMAIL_RECIPIENT")
                .map_err(|_| "EMAIL_RECIPIENT environment variable required")?,
            from_name: "Supabase Exporter".to_string(),
        })
    }
}
