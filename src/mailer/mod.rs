use async_trait::async_trait;
use chrono::{DateTime, Local};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, error, info};

use crate::config::SmtpConfig;
use crate::csv_export::CSV_SUFFIX;
use crate::models::Result;
use crate::storage::ExportStore;

/// Mail transport seam: session verification plus a single send returning
/// the server's acceptance line.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn verify(&self) -> Result<()>;
    async fn send(&self, message: Message) -> Result<String>;
}

pub struct SmtpMailer {
    host: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Implicit-TLS session on the submissions port (465), authenticated
    /// with the account identity and application password.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let credentials = Credentials::new(config.email.clone(), config.app_password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(credentials)
            .build();
        debug!("Created SMTP transport for {}", config.host);

        Ok(Self {
            host: config.host.clone(),
            transport,
        })
    }

    fn connection_hint(&self) -> String {
        format!(
            "Failed to connect to {}. Check your credentials and ensure you're using an App Password.",
            self.host
        )
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn verify(&self) -> Result<()> {
        match self.transport.test_connection().await {
            Ok(true) => {
                info!("✓ {} server connection verified", self.host);
                Ok(())
            }
            Ok(false) => Err(self.connection_hint().into()),
            Err(e) => {
                error!("Error connecting to {}: {}", self.host, e);
                Err(self.connection_hint().into())
            }
        }
    }

    async fn send(&self, message: Message) -> Result<String> {
        let response = self.transport.send(message).await?;
        Ok(response.message().collect::<Vec<_>>().join(" "))
    }
}

pub struct DigestMailer<'a> {
    config: &'a SmtpConfig,
    store: &'a dyn ExportStore,
    transport: &'a dyn MailTransport,
}

impl<'a> DigestMailer<'a> {
    pub fn new(
        config: &'a SmtpConfig,
        store: &'a dyn ExportStore,
        transport: &'a dyn MailTransport,
    ) -> Self {
        Self {
            config,
            store,
            transport,
        }
    }

    /// Send one digest bundling every CSV artifact currently in the output
    /// directory, stale ones included. Zero matching files is a logged
    /// no-op; verification and send failures propagate.
    pub async fn send_digest(&self) -> Result<()> {
        info!("Preparing to send email digest...");

        let files = self.store.list_files(CSV_SUFFIX).await?;
        if files.is_empty() {
            info!("No CSV files found to send");
            return Ok(());
        }
        info!("Found {} CSV files to attach", files.len());

        self.transport.verify().await?;

        let attachments = self.collect_attachments(&files).await?;
        let message = self.build_message(&attachments)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {}", e))?;
        info!("Email sent successfully: {}", response);

        Ok(())
    }

    async fn collect_attachments(&self, files: &[String]) -> Result<Vec<(String, Vec<u8>)>> {
        let mut attachments = Vec::with_capacity(files.len());
        for name in files {
            let contents = self.store.read_file(name).await?;
            attachments.push((name.clone(), contents));
        }
        Ok(attachments)
    }

    fn build_message(&self, attachments: &[(String, Vec<u8>)]) -> Result<Message> {
        let now = Local::now();
        let subject = format!("Supabase CSV Export - {}", now.format("%B %-d, %Y"));

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(digest_body(
            attachments,
            &now,
        )));
        for (name, contents) in attachments {
            let part = Attachment::new(name.clone())
                .body(contents.clone(), ContentType::parse("text/csv")?);
            body = body.singlepart(part);
        }

        let message = Message::builder()
            .from(format!("{} <{}>", self.config.from_name, self.config.email).parse()?)
            .to(self.config.recipient.parse()?)
            .subject(subject)
            .multipart(body)?;

        Ok(message)
    }
}

fn digest_body(attachments: &[(String, Vec<u8>)], now: &DateTime<Local>) -> String {
    let items = attachments
        .iter()
        .map(|(name, _)| format!("<li>{}</li>", name))
        .collect::<String>();

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #2563eb;">Supabase Daily Export</h2>
  <p>Hello,</p>
  <p>Attached are the daily CSV exports from your Supabase database.</p>
  <div style="background-color: #f9fafb; padding: 15px; border-radius: 8px; margin: 20px 0;">
    <p style="margin: 0;"><strong>Generated on:</strong> {}</p>
    <p style="margin: 10px 0 0 0;"><strong>Files attached ({}):</strong></p>
    <ul style="margin: 5px 0 0 0;">{}</ul>
  </div>
  <hr style="border: none; border-top: 1px solid #e5e7eb; margin: 20px 0;">
  <p style="color: #6b7280; font-size: 14px;">This is an automated email from the scheduled export job.</p>
</div>"#,
        now.format("%Y-%m-%d %H:%M:%S"),
        attachments.len(),
        items
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::MemoryStore;
    use std::sync::Mutex;

    struct FakeTransport {
        fail_verify: bool,
        fail_send: bool,
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                fail_verify: false,
                fail_send: false,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MailTransport for FakeTransport {
        async fn verify(&self) -> Result<()> {
            if self.fail_verify {
                return Err(
                    "Failed to connect to smtp.gmail.com. Check your credentials and ensure you're using an App Password."
                        .into(),
                );
            }
            Ok(())
        }

        async fn send(&self, message: Message) -> Result<String> {
            if self.fail_send {
                return Err("connection reset by peer".into());
            }
            self.sent.lock().unwrap().push(message.formatted());
            Ok("250 2.0.0 OK".to_string())
        }
    }

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            email: "exporter@example.com".to_string(),
            app_password: "app-password".to_string(),
            recipient: "ops@example.com".to_string(),
            from_name: "Supabase Exporter".to_string(),
        }
    }

    #[tokio::test]
    async fn zero_csv_files_skip_the_send_entirely() {
        let store = MemoryStore::new();
        store.insert("notes.txt", b"not a csv");
        let transport = FakeTransport::new();
        let config = smtp_config();

        DigestMailer::new(&config, &store, &transport)
            .send_digest()
            .await
            .unwrap();

        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn every_csv_file_is_attached_with_identical_bytes() {
        let store = MemoryStore::new();
        store.insert("users_2024-01-05.csv", b"\"id\"\n\"1\"");
        store.insert("orders_2024-01-04.csv", b"No data available");
        store.insert("notes.txt", b"ignored");
        let transport = FakeTransport::new();
        let config = smtp_config();
        let mailer = DigestMailer::new(&config, &store, &transport);

        let files = store.list_files(CSV_SUFFIX).await.unwrap();
        let attachments = mailer.collect_attachments(&files).await.unwrap();

        assert_eq!(attachments.len(), 2);
        assert_eq!(
            attachments[0],
            ("orders_2024-01-04.csv".to_string(), b"No data available".to_vec())
        );
        assert_eq!(
            attachments[1],
            ("users_2024-01-05.csv".to_string(), b"\"id\"\n\"1\"".to_vec())
        );

        mailer.send_digest().await.unwrap();
        assert_eq!(transport.sent_count(), 1);

        let raw = String::from_utf8_lossy(&transport.sent.lock().unwrap()[0]).to_string();
        assert!(raw.contains("users_2024-01-05.csv"));
        assert!(raw.contains("orders_2024-01-04.csv"));
    }

    #[tokio::test]
    async fn message_carries_subject_recipient_and_body_listing() {
        let store = MemoryStore::new();
        store.insert("users_2024-01-05.csv", b"\"id\"\n\"1\"");
        let transport = FakeTransport::new();
        let config = smtp_config();
        let mailer = DigestMailer::new(&config, &store, &transport);

        let attachments = vec![("users_2024-01-05.csv".to_string(), b"\"id\"\n\"1\"".to_vec())];
        let message = mailer.build_message(&attachments).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();

        assert!(raw.contains("Subject: Supabase CSV Export - "));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("Supabase Daily Export"));
        assert!(raw.contains("Files attached (1)"));
    }

    #[tokio::test]
    async fn verification_failure_aborts_before_any_send() {
        let store = MemoryStore::new();
        store.insert("users_2024-01-05.csv", b"\"id\"\n\"1\"");
        let transport = FakeTransport {
            fail_verify: true,
            ..FakeTransport::new()
        };
        let config = smtp_config();

        let err = DigestMailer::new(&config, &store, &transport)
            .send_digest()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("App Password"));
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn send_failure_is_wrapped_with_the_transport_message() {
        let store = MemoryStore::new();
        store.insert("users_2024-01-05.csv", b"\"id\"\n\"1\"");
        let transport = FakeTransport {
            fail_send: true,
            ..FakeTransport::new()
        };
        let config = smtp_config();

        let err = DigestMailer::new(&config, &store, &transport)
            .send_digest()
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to send email: connection reset by peer"
        );
    }
}
