//! Outgoing mail
//!
//! Signup verification codes go out through a [`Mailer`]. With SMTP settings
//! configured the server uses [`SmtpMailer`]; otherwise [`LogMailer`] writes
//! the code to the log so local setups can still complete a signup.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::backend::server::config::MailConfig;

const CODE_SUBJECT: &str = "Registration confirmation code";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build mail: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Sends signup verification codes
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_code(&self, recipient: &str, code: u32) -> Result<(), MailError>;
}

/// SMTP mailer using STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(config.login.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(Self {
            transport,
            from: config.login.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_code(&self, recipient: &str, code: u32) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient.parse()?)
            .subject(CODE_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(format!("Your confirmation code: {code}\r\n"))?;

        self.transport.send(email).await?;
        tracing::info!(%recipient, "Verification code mailed");
        Ok(())
    }
}

/// Mailer that only logs; used when SMTP is not configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_code(&self, recipient: &str, code: u32) -> Result<(), MailError> {
        tracing::warn!(%recipient, code, "SMTP not configured, verification code logged instead of mailed");
        Ok(())
    }
}
