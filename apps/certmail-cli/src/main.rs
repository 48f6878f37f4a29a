//! certmail binary
//!
//! Entry point for splitting a PDF by roster and drafting or sending one
//! email per document.

use anyhow::Context;
use bulk_mailer::DispatchMode;
use certmail_cli::{run, Config, DispatchOptions, RunReport};
use clap::{Parser, Subcommand, ValueEnum};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "certmail")]
#[command(
    version,
    about = "Split a multi-page PDF by roster and email each page to its recipient"
)]
struct Args {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "certmail.toml")]
    config: PathBuf,

    /// Keep going after a failed row and report it at the end
    #[arg(long, global = true)]
    continue_on_error: bool,

    /// Build every message but neither store nor send it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Write a JSON report of the run to this path
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split the source PDF into one document per roster row
    Split,
    /// Store email drafts with the documents attached
    Drafts {
        /// Annotated roster (default: the one `split` writes)
        #[arg(long)]
        roster: Option<PathBuf>,
        /// Draft only this many randomly chosen rows
        #[arg(long)]
        sample: Option<NonZeroUsize>,
    },
    /// Send one email to every roster row
    Send {
        /// Annotated roster (default: the one `split` writes)
        #[arg(long)]
        roster: Option<PathBuf>,
    },
    /// Split, then draft or send from the fresh roster
    Run {
        #[arg(long, value_enum, default_value_t = Mode::Draft)]
        mode: Mode,
        /// Draft only this many randomly chosen rows
        #[arg(long)]
        sample: Option<NonZeroUsize>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Draft,
    Send,
}

impl From<Mode> for DispatchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Draft => DispatchMode::Draft,
            Mode::Send => DispatchMode::Send,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries results; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting certmail v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_file(&args.config)?;
    let handoff = config.splitter().updated_roster_path();
    let options = |sample: Option<NonZeroUsize>| DispatchOptions {
        sample,
        dry_run: args.dry_run,
        continue_on_error: args.continue_on_error,
    };

    let mut report = RunReport::default();
    let result = match args.command {
        Command::Split => run::split(&config).map(|outcome| {
            println!("{}", outcome.updated_roster.display());
            report.split = Some(outcome);
        }),
        Command::Drafts { roster, sample } => {
            let roster = roster.unwrap_or(handoff);
            run::dispatch(&config, &roster, DispatchMode::Draft, options(sample))
                .map(|r| report.dispatch = Some(r))
        }
        Command::Send { roster } => {
            let roster = roster.unwrap_or(handoff);
            run::dispatch(&config, &roster, DispatchMode::Send, options(None))
                .map(|r| report.dispatch = Some(r))
        }
        Command::Run { mode, sample } => {
            let mode = DispatchMode::from(mode);
            options(sample).check(mode).and_then(|()| {
                let outcome = run::split(&config)?;
                let roster = outcome.updated_roster.clone();
                report.split = Some(outcome);
                run::dispatch(&config, &roster, mode, options(sample))
                    .map(|r| report.dispatch = Some(r))
            })
        }
    };

    if let Some(path) = &args.report {
        report
            .write_json(path)
            .context("Failed to write run report")?;
    }

    result?;

    if let Some(dispatch) = &report.dispatch {
        println!(
            "{} delivered, {} failed",
            dispatch.delivered(),
            dispatch.failed()
        );
        if dispatch.failed() > 0 {
            std::process::exit(2);
        }
    }

    Ok(())
}
