//! Message and sender types

use crate::client::MailError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Who the messages come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SenderIdentity {
    pub name: String,
    pub title: String,
    pub organisation: String,
    /// From mailbox, e.g. "Events <events@example.org>"
    pub address: String,
}

/// Whether a message is stored unsent or transmitted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    Draft,
    Send,
}

/// One composed message, handed to a mail session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    to: String,
    subject: String,
    body: String,
    attachment: Option<PathBuf>,
}

impl OutgoingMessage {
    pub fn new(to: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: String::new(),
            body: String::new(),
            attachment: None,
        }
    }

    pub fn with_subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = body;
        self
    }

    /// Attach a file by path; clients resolve it when the message is built
    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn attachment(&self) -> Option<&Path> {
        self.attachment.as_deref()
    }

    /// Check the recipient address
    pub fn validate(&self) -> Result<(), MailError> {
        if is_valid_email(&self.to) {
            Ok(())
        } else {
            Err(MailError::InvalidAddress(self.to.clone()))
        }
    }
}

/// Check if email address is valid
pub fn is_valid_email(email: &str) -> bool {
    // Extract email from "Name <email@domain.com>" format
    let email = match (email.find('<'), email.rfind('>')) {
        (Some(start), Some(end)) if start < end => &email[start + 1..end],
        _ => email.trim(),
    };

    email_address::EmailAddress::is_valid(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let message = OutgoingMessage::new("pat@example.org")
            .with_subject("Your award")
            .with_body("Dear Pat".into())
            .with_attachment("/tmp/Alpha_Award.pdf");

        assert_eq!(message.to(), "pat@example.org");
        assert_eq!(message.subject(), "Your award");
        assert_eq!(message.body(), "Dear Pat");
        assert_eq!(
            message.attachment(),
            Some(Path::new("/tmp/Alpha_Award.pdf"))
        );
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        let message = OutgoingMessage::new("not-an-address");
        assert!(matches!(
            message.validate(),
            Err(MailError::InvalidAddress(ref a)) if a == "not-an-address"
        ));
    }

    #[test]
    fn test_valid_email_forms() {
        assert!(is_valid_email("pat@example.org"));
        assert!(is_valid_email("Pat Smith <pat@example.org>"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("Pat <>"));
    }
}
