//! Bulk drafts and sends over an annotated roster
//!
//! Every processed row becomes one message: addressed to `Mentor_Email`,
//! carrying the shared subject, a body rendered from the row and sender
//! fields, and the row's `File Path` document as its attachment.

use crate::client::{MailClient, MailError};
use crate::template::{MessageTemplate, TemplateValues};
use crate::types::{DispatchMode, OutgoingMessage, SenderIdentity};
use rand::Rng;
use serde::Serialize;
use shared_roster::{
    RosterError, RosterRow, RosterTable, DIVISION, FILE_PATH, MENTOR_EMAIL, MENTOR_NAME,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Columns a roster needs before any message can be composed
pub const REQUIRED_COLUMNS: [&str; 4] = [MENTOR_NAME, MENTOR_EMAIL, DIVISION, FILE_PATH];

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("Cannot sample {requested} rows from a roster of {available}")]
    SampleTooLarge { requested: usize, available: usize },

    #[error("Row {row} ({recipient}): {source}")]
    Dispatch {
        row: usize,
        recipient: String,
        #[source]
        source: MailError,
    },
}

/// What to do when one row fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure; earlier rows stay dispatched
    #[default]
    Abort,
    /// Record the failure and carry on with the next row
    Continue,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchStatus {
    Delivered,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub row: usize,
    pub recipient: String,
    #[serde(flatten)]
    pub status: DispatchStatus,
}

/// Per-row results of one `create_drafts` or `send_all` call
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub mode: DispatchMode,
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            outcomes: Vec::new(),
        }
    }

    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == DispatchStatus::Delivered)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }
}

pub struct BulkMessenger<C> {
    table: RosterTable,
    subject: String,
    template: MessageTemplate,
    sender: SenderIdentity,
    client: C,
    policy: FailurePolicy,
}

impl<C: MailClient> BulkMessenger<C> {
    /// Load an annotated roster and prepare to message every row
    pub fn load(
        roster: impl AsRef<Path>,
        subject: &str,
        template: MessageTemplate,
        sender: SenderIdentity,
        client: C,
    ) -> Result<Self, MessengerError> {
        let table = RosterTable::from_path(roster)?;
        Self::from_table(table, subject, template, sender, client)
    }

    pub fn from_table(
        mut table: RosterTable,
        subject: &str,
        template: MessageTemplate,
        sender: SenderIdentity,
        client: C,
    ) -> Result<Self, MessengerError> {
        table.require_columns(&REQUIRED_COLUMNS)?;
        table.normalize_file_paths();

        Ok(Self {
            table,
            subject: subject.to_string(),
            template,
            sender,
            client,
            policy: FailurePolicy::default(),
        })
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn table(&self) -> &RosterTable {
        &self.table
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Store drafts for every row, or for `sample` distinct random rows
    pub fn create_drafts(&self, sample: Option<usize>) -> Result<DispatchReport, MessengerError> {
        self.create_drafts_with_rng(sample, &mut rand::thread_rng())
    }

    pub fn create_drafts_with_rng<R: Rng + ?Sized>(
        &self,
        sample: Option<usize>,
        rng: &mut R,
    ) -> Result<DispatchReport, MessengerError> {
        let available = self.table.len();
        let rows = match sample {
            Some(requested) if requested > available => {
                return Err(MessengerError::SampleTooLarge {
                    requested,
                    available,
                })
            }
            Some(requested) => rand::seq::index::sample(rng, available, requested).into_vec(),
            None => (0..available).collect(),
        };

        let report = self.dispatch(DispatchMode::Draft, &rows)?;
        info!(
            drafts = report.delivered(),
            failed = report.failed(),
            "Draft emails created"
        );
        Ok(report)
    }

    /// Send to every row in table order
    pub fn send_all(&self) -> Result<DispatchReport, MessengerError> {
        let rows: Vec<usize> = (0..self.table.len()).collect();
        let report = self.dispatch(DispatchMode::Send, &rows)?;
        info!(
            sent = report.delivered(),
            failed = report.failed(),
            "Bulk send finished"
        );
        Ok(report)
    }

    /// Compose the message for one row
    pub fn compose(&self, row: RosterRow<'_>) -> Result<OutgoingMessage, MailError> {
        let body = self.template.render(&TemplateValues {
            mentor_name: row.mentor_name().unwrap_or_default(),
            division: row.division().unwrap_or_default(),
            sender_name: &self.sender.name,
            sender_title: &self.sender.title,
            organisation: &self.sender.organisation,
        });

        let file_path = row.file_path().unwrap_or_default();
        let attachment = resolve_attachment(file_path)?;

        Ok(OutgoingMessage::new(row.mentor_email().unwrap_or_default())
            .with_subject(&self.subject)
            .with_body(body)
            .with_attachment(attachment))
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    fn dispatch(&self, mode: DispatchMode, rows: &[usize]) -> Result<DispatchReport, MessengerError> {
        let mut report = DispatchReport::new(mode);

        for row in rows.iter().filter_map(|&i| self.table.row(i)) {
            let recipient = row.mentor_email().unwrap_or_default().to_string();

            match self.dispatch_row(mode, row) {
                Ok(()) => {
                    match mode {
                        DispatchMode::Draft => info!("Draft created for: {}", recipient),
                        DispatchMode::Send => info!("Email sent to: {}", recipient),
                    }
                    report.outcomes.push(DispatchOutcome {
                        row: row.index(),
                        recipient,
                        status: DispatchStatus::Delivered,
                    });
                }
                Err(source) if self.policy == FailurePolicy::Abort => {
                    return Err(MessengerError::Dispatch {
                        row: row.index(),
                        recipient,
                        source,
                    });
                }
                Err(source) => {
                    warn!(row = row.index(), error = %source, "Failed for: {}", recipient);
                    report.outcomes.push(DispatchOutcome {
                        row: row.index(),
                        recipient,
                        status: DispatchStatus::Failed {
                            error: source.to_string(),
                        },
                    });
                }
            }
        }

        Ok(report)
    }

    fn dispatch_row(&self, mode: DispatchMode, row: RosterRow<'_>) -> Result<(), MailError> {
        let message = self.compose(row)?;
        message.validate()?;

        let mut session = self.client.connect()?;
        match mode {
            DispatchMode::Draft => session.save_draft(&message),
            DispatchMode::Send => session.send(&message),
        }
    }
}

/// Absolute form of a roster `File Path`
fn resolve_attachment(file_path: &str) -> Result<PathBuf, MailError> {
    std::path::absolute(file_path)
        .map_err(|_| MailError::AttachmentNotFound(PathBuf::from(file_path)))
}
