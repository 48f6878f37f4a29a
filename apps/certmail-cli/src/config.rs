//! Configuration file parsing
//!
//! A run is described by one TOML file: where the documents come from, the
//! message to send, who sends it and how mail leaves the machine. The SMTP
//! password is the only setting read from the environment.

use anyhow::{bail, Context};
use bulk_mailer::{MessageTemplate, SenderIdentity, SmtpSettings};
use docsplit_core::DocumentSplitter;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the SMTP password
pub const SMTP_PASSWORD_ENV: &str = "CERTMAIL_SMTP_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub documents: DocumentsConfig,
    pub message: MessageConfig,
    pub sender: SenderIdentity,
    #[serde(default)]
    pub mail: MailConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed or
    /// required fields are missing
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// The body template is parsed here as well, so a bad placeholder or a
    /// missing template file fails before any document is written.
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.message.template()?;
        Ok(config)
    }

    pub fn splitter(&self) -> DocumentSplitter {
        DocumentSplitter::new(
            &self.documents.source_pdf,
            &self.documents.roster_csv,
            &self.documents.output_dir,
            &self.documents.document_type,
        )
    }
}

/// Inputs and outputs of the splitting phase
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsConfig {
    /// Multi-page PDF, one page per roster row
    pub source_pdf: PathBuf,
    /// Roster CSV with a `Team Name` column
    pub roster_csv: PathBuf,
    /// Destination folder (default: "Document_Output_Directory")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Label in output names, e.g. "Award" or "Participation"
    pub document_type: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Document_Output_Directory")
}

/// Subject and body shared by every message
#[derive(Debug, Clone, Deserialize)]
pub struct MessageConfig {
    pub subject: String,
    /// Inline body template
    #[serde(default)]
    pub body_template: Option<String>,
    /// Body template read from a file instead
    #[serde(default)]
    pub body_template_file: Option<PathBuf>,
}

impl MessageConfig {
    /// Parse the body template from whichever of the two sources is set
    pub fn template(&self) -> anyhow::Result<MessageTemplate> {
        let source = match (&self.body_template, &self.body_template_file) {
            (Some(inline), None) => inline.clone(),
            (None, Some(path)) => fs::read_to_string(path).with_context(|| {
                format!("Failed to read body template: {}", path.display())
            })?,
            (Some(_), Some(_)) => {
                bail!("Set only one of message.body_template and message.body_template_file")
            }
            (None, None) => {
                bail!("Missing message.body_template (or message.body_template_file)")
            }
        };
        MessageTemplate::parse(&source).context("Invalid body template")
    }
}

/// Where drafts go and how sends leave
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Folder receiving `.eml` drafts (default: "drafts")
    #[serde(default = "default_drafts_dir")]
    pub drafts_dir: PathBuf,
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP submission port (default: 587)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP login; falls back to the sender address
    #[serde(default)]
    pub username: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            drafts_dir: default_drafts_dir(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            username: None,
        }
    }
}

fn default_drafts_dir() -> PathBuf {
    PathBuf::from("drafts")
}

fn default_smtp_port() -> u16 {
    587
}

impl MailConfig {
    /// SMTP settings, or `None` when no relay is configured
    ///
    /// `password` is normally the value of [`SMTP_PASSWORD_ENV`].
    pub fn smtp_settings(
        &self,
        sender: &SenderIdentity,
        password: Option<String>,
    ) -> anyhow::Result<Option<SmtpSettings>> {
        let Some(host) = &self.smtp_host else {
            return Ok(None);
        };
        let Some(password) = password else {
            bail!("mail.smtp_host is set but {} is not", SMTP_PASSWORD_ENV);
        };

        Ok(Some(SmtpSettings {
            host: host.clone(),
            port: self.smtp_port,
            username: self
                .username
                .clone()
                .unwrap_or_else(|| sender.address.clone()),
            password: SecretString::from(password),
        }))
    }
}
