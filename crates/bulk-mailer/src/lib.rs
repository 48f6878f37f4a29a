//! Bulk mailer - one personalised message per roster row
//!
//! Reads the roster annotated by the document splitter and, for each row,
//! renders a body template, attaches the row's document and either stores
//! the message as a draft or sends it.
//!
//! ## Mail clients
//!
//! The messenger depends only on the [`MailClient`] / [`MailSession`] seam:
//!
//! - [`MailboxClient`]: `.eml` drafts folder plus SMTP sending (lettre)
//! - [`DryRunClient`]: builds and logs every message, stores nothing
//!
//! Tests substitute their own recording client.

pub mod client;
pub mod mailbox;
pub mod messenger;
pub mod template;
pub mod types;

pub use client::{MailClient, MailError, MailSession};
pub use mailbox::{build_message, DryRunClient, MailboxClient, SmtpSettings};
pub use messenger::{
    BulkMessenger, DispatchOutcome, DispatchReport, DispatchStatus, FailurePolicy, MessengerError,
    REQUIRED_COLUMNS,
};
pub use template::{MessageTemplate, Placeholder, TemplateError, TemplateValues};
pub use types::{is_valid_email, DispatchMode, OutgoingMessage, SenderIdentity};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
