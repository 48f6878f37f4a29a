//! certmail - split award PDFs by roster and mail each one to its recipient
//!
//! The binary is a thin clap front end over [`run`], which wires the TOML
//! [`config`] into `docsplit-core` and `bulk-mailer`.

pub mod config;
pub mod run;

pub use config::Config;
pub use run::{DispatchOptions, RunReport};
