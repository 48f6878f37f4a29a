//! The two phases of a run, wired from configuration

use crate::config::{Config, SMTP_PASSWORD_ENV};
use anyhow::{bail, Context};
use bulk_mailer::{
    BulkMessenger, DispatchMode, DispatchReport, DryRunClient, FailurePolicy, MailClient,
    MailboxClient,
};
use docsplit_core::SplitOutcome;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::num::NonZeroUsize;
use std::path::Path;
use tracing::info;

/// How the messaging phase runs
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    /// Draft only this many random rows
    pub sample: Option<NonZeroUsize>,
    /// Build and log messages without storing or sending them
    pub dry_run: bool,
    pub continue_on_error: bool,
}

impl DispatchOptions {
    /// Reject option combinations that make no sense for `mode`
    ///
    /// Checked before any work so that `run` never splits first and fails
    /// afterwards.
    pub fn check(&self, mode: DispatchMode) -> anyhow::Result<()> {
        if mode == DispatchMode::Send && self.sample.is_some() {
            bail!("--sample only applies to drafts");
        }
        Ok(())
    }
}

/// Everything a run produced, written out by `--report`
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchReport>,
}

impl RunReport {
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }
}

/// Split the source PDF and return the outcome
pub fn split(config: &Config) -> anyhow::Result<SplitOutcome> {
    let splitter = config.splitter();
    splitter.split().with_context(|| {
        format!(
            "Failed to split {} by {}",
            config.documents.source_pdf.display(),
            config.documents.roster_csv.display()
        )
    })
}

/// Draft or send one message per row of an annotated roster
pub fn dispatch(
    config: &Config,
    roster: &Path,
    mode: DispatchMode,
    options: DispatchOptions,
) -> anyhow::Result<DispatchReport> {
    options.check(mode)?;
    let client = mail_client(config, mode, options.dry_run)?;
    let policy = if options.continue_on_error {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };

    let messenger = BulkMessenger::load(
        roster,
        &config.message.subject,
        config.message.template()?,
        config.sender.clone(),
        client,
    )
    .with_context(|| format!("Failed to load roster: {}", roster.display()))?
    .with_failure_policy(policy);

    info!(
        rows = messenger.table().len(),
        mode = ?mode,
        dry_run = options.dry_run,
        "Dispatching"
    );

    let report = match mode {
        DispatchMode::Draft => messenger.create_drafts(options.sample.map(NonZeroUsize::get)),
        DispatchMode::Send => messenger.send_all(),
    }?;
    Ok(report)
}

fn mail_client(
    config: &Config,
    mode: DispatchMode,
    dry_run: bool,
) -> anyhow::Result<Box<dyn MailClient>> {
    if dry_run {
        return Ok(Box::new(DryRunClient::new(&config.sender.address)));
    }

    let client = MailboxClient::new(&config.sender.address, &config.mail.drafts_dir);
    if mode == DispatchMode::Draft {
        return Ok(Box::new(client));
    }

    let password = std::env::var(SMTP_PASSWORD_ENV).ok();
    let Some(smtp) = config.mail.smtp_settings(&config.sender, password)? else {
        bail!("Sending needs mail.smtp_host in the configuration");
    };
    Ok(Box::new(client.with_smtp(smtp)))
}
