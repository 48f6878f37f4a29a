//! lettre-backed mail client
//!
//! Drafts are written as `.eml` files into a drafts folder, marked with
//! `X-Unsent: 1` so desktop clients open them as editable, unsent messages.
//! Sends go through an authenticated SMTP relay.

use crate::client::{MailClient, MailError, MailSession};
use crate::types::OutgoingMessage;
use lettre::message::header::{ContentType, Header, HeaderName, HeaderValue};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{FileTransport, Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Marks a stored message as an unsent draft
#[derive(Debug, Clone, Copy)]
struct XUnsent;

impl Header for XUnsent {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Unsent")
    }

    fn parse(_s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(XUnsent)
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), "1".to_string())
    }
}

/// SMTP relay settings
#[derive(Debug)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct MailboxClient {
    from: String,
    drafts_dir: PathBuf,
    smtp: Option<SmtpSettings>,
}

impl MailboxClient {
    /// Client that can only store drafts
    pub fn new(from: &str, drafts_dir: impl Into<PathBuf>) -> Self {
        Self {
            from: from.to_string(),
            drafts_dir: drafts_dir.into(),
            smtp: None,
        }
    }

    pub fn with_smtp(mut self, smtp: SmtpSettings) -> Self {
        self.smtp = Some(smtp);
        self
    }

    pub fn drafts_dir(&self) -> &Path {
        &self.drafts_dir
    }

    fn smtp_transport(&self) -> Result<Option<SmtpTransport>, MailError> {
        let Some(smtp) = &self.smtp else {
            return Ok(None);
        };

        let creds = Credentials::new(
            smtp.username.clone(),
            smtp.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::relay(&smtp.host)
            .map_err(|e| MailError::Connection(format!("SMTP relay error: {e}")))?
            .port(smtp.port)
            .credentials(creds)
            .build();

        Ok(Some(transport))
    }
}

impl MailClient for MailboxClient {
    fn connect(&self) -> Result<Box<dyn MailSession + '_>, MailError> {
        Ok(Box::new(MailboxSession {
            client: self,
            drafts: FileTransport::new(&self.drafts_dir),
            smtp: self.smtp_transport()?,
        }))
    }
}

struct MailboxSession<'a> {
    client: &'a MailboxClient,
    drafts: FileTransport,
    smtp: Option<SmtpTransport>,
}

impl MailSession for MailboxSession<'_> {
    fn save_draft(&mut self, message: &OutgoingMessage) -> Result<(), MailError> {
        let email = build_message(&self.client.from, message, true)?;

        let dir = &self.client.drafts_dir;
        fs::create_dir_all(dir).map_err(|source| MailError::Io {
            path: dir.clone(),
            source,
        })?;
        let id = self
            .drafts
            .send(&email)
            .map_err(|e| MailError::Draft(e.to_string()))?;

        debug!(
            file = %self.client.drafts_dir.join(format!("{id}.eml")).display(),
            "Draft stored"
        );
        Ok(())
    }

    fn send(&mut self, message: &OutgoingMessage) -> Result<(), MailError> {
        let transport = self
            .smtp
            .as_ref()
            .ok_or_else(|| MailError::NotConfigured("no SMTP relay set".into()))?;

        let email = build_message(&self.client.from, message, false)?;
        transport
            .send(&email)
            .map_err(|e| MailError::Send(format!("SMTP send failed: {e}")))?;
        Ok(())
    }
}

/// Client that builds every message but neither stores nor sends it
#[derive(Debug, Clone)]
pub struct DryRunClient {
    from: String,
}

impl DryRunClient {
    pub fn new(from: &str) -> Self {
        Self {
            from: from.to_string(),
        }
    }
}

impl MailClient for DryRunClient {
    fn connect(&self) -> Result<Box<dyn MailSession + '_>, MailError> {
        Ok(Box::new(DryRunSession { from: &self.from }))
    }
}

struct DryRunSession<'a> {
    from: &'a str,
}

impl MailSession for DryRunSession<'_> {
    fn save_draft(&mut self, message: &OutgoingMessage) -> Result<(), MailError> {
        build_message(self.from, message, true)?;
        info!(to = %message.to(), "[dry run] draft not stored");
        Ok(())
    }

    fn send(&mut self, message: &OutgoingMessage) -> Result<(), MailError> {
        build_message(self.from, message, false)?;
        info!(to = %message.to(), "[dry run] email not sent");
        Ok(())
    }
}

/// Build the MIME message: plain text body plus the PDF attachment
pub fn build_message(
    from: &str,
    message: &OutgoingMessage,
    draft: bool,
) -> Result<Message, MailError> {
    let from: Mailbox = from
        .parse()
        .map_err(|e| MailError::Build(format!("Invalid from address: {e}")))?;
    let to: Mailbox = message
        .to()
        .parse()
        .map_err(|_| MailError::InvalidAddress(message.to().to_string()))?;

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body().to_string()));
    if let Some(path) = message.attachment() {
        parts = parts.singlepart(load_attachment(path)?);
    }

    let mut builder = Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject());
    if draft {
        builder = builder.header(XUnsent);
    }

    builder
        .multipart(parts)
        .map_err(|e| MailError::Build(format!("Failed to build email: {e}")))
}

fn load_attachment(path: &Path) -> Result<SinglePart, MailError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => MailError::AttachmentNotFound(path.to_path_buf()),
        _ => MailError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment.pdf".to_string());
    let content_type = ContentType::parse("application/pdf")
        .map_err(|e| MailError::Build(format!("Invalid content type: {e}")))?;

    Ok(Attachment::new(filename).body(bytes, content_type))
}
