//! Mail client seam
//!
//! The messenger never talks to a mail system directly. It asks a
//! [`MailClient`] for a fresh [`MailSession`] per message and drops it once
//! the draft is stored or the message is sent.

use crate::types::OutgoingMessage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Attachment not found: {}", .0.display())]
    AttachmentNotFound(PathBuf),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Mail client connection failed: {0}")]
    Connection(String),

    #[error("Failed to save draft: {0}")]
    Draft(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Mail client not configured: {0}")]
    NotConfigured(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Factory for per-message sessions
pub trait MailClient {
    fn connect(&self) -> Result<Box<dyn MailSession + '_>, MailError>;
}

/// The two terminal operations on a composed message
pub trait MailSession {
    /// Store the message unsent
    fn save_draft(&mut self, message: &OutgoingMessage) -> Result<(), MailError>;

    /// Transmit the message now
    fn send(&mut self, message: &OutgoingMessage) -> Result<(), MailError>;
}

impl<C: MailClient + ?Sized> MailClient for &C {
    fn connect(&self) -> Result<Box<dyn MailSession + '_>, MailError> {
        (**self).connect()
    }
}

impl<C: MailClient + ?Sized> MailClient for Box<C> {
    fn connect(&self) -> Result<Box<dyn MailSession + '_>, MailError> {
        (**self).connect()
    }
}
