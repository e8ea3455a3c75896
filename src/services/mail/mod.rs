//! Outgoing email.
//!
//! Services depend on the [`Mailer`] trait. Production uses [`SmtpMailer`]
//! (lettre, async SMTP); without SMTP configuration [`LogMailer`] writes
//! messages to the log instead. Delivery failures are logged and never fail
//! the request that triggered them.

pub mod templates;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::Config;

/// Subject and HTML body produced by a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
}

/// A rendered email addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()>;
}

/// SMTP mailer backed by a pooled lettre transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the transport from configuration.
    ///
    /// `SMTP_SECURE=true` uses implicit TLS (usually port 465), otherwise
    /// STARTTLS is required.
    pub fn from_config(config: &Config, host: &str) -> anyhow::Result<Self> {
        let builder = if config.smtp_secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };

        let mut builder = builder.port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.mail_from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html)?;

        self.transport.send(email).await?;
        Ok(())
    }
}

/// Mailer used when SMTP is not configured: logs instead of sending.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "SMTP not configured, email not sent"
        );
        tracing::debug!(html = %message.html, "email body");
        Ok(())
    }
}

/// Pick the mailer for this configuration.
pub fn from_config(config: &Config) -> anyhow::Result<std::sync::Arc<dyn Mailer>> {
    match config.smtp_host.as_deref() {
        Some(host) if !host.trim().is_empty() => {
            tracing::info!(%host, port = config.smtp_port, "SMTP mailer configured");
            Ok(std::sync::Arc::new(SmtpMailer::from_config(config, host)?))
        }
        _ => {
            tracing::warn!("SMTP_HOST not set, outgoing email will only be logged");
            Ok(std::sync::Arc::new(LogMailer))
        }
    }
}

/// Send one email, logging failures. Returns whether it was delivered.
pub async fn deliver(mailer: &dyn Mailer, to: &str, rendered: askama::Result<EmailContent>) -> bool {
    match rendered {
        Ok(content) => send_one(mailer, to, &content).await,
        Err(e) => {
            tracing::error!(%to, error = %e, "Failed to render email");
            false
        }
    }
}

/// Send the same email to several recipients. Returns the number delivered.
pub async fn deliver_all(
    mailer: &dyn Mailer,
    recipients: &[String],
    rendered: askama::Result<EmailContent>,
) -> usize {
    let content = match rendered {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(recipients = recipients.len(), error = %e, "Failed to render email");
            return 0;
        }
    };

    let mut delivered = 0;
    for to in recipients {
        if send_one(mailer, to, &content).await {
            delivered += 1;
        }
    }
    delivered
}

async fn send_one(mailer: &dyn Mailer, to: &str, content: &EmailContent) -> bool {
    let message = EmailMessage {
        to: to.to_string(),
        subject: content.subject.clone(),
        html: content.html.clone(),
    };

    match mailer.send(message).await {
        Ok(()) => {
            tracing::debug!(%to, "email sent");
            true
        }
        Err(e) => {
            tracing::error!(%to, error = %e, "Failed to send email");
            false
        }
    }
}
