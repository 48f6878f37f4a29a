//! Roster tables shared by the document splitter and the bulk messenger.
//!
//! A roster is a header-first CSV file with one row per recipient. Row order
//! is significant: row `i` is paired with page `i + 1` of the source PDF.

pub mod error;
pub mod table;

pub use error::RosterError;
pub use table::{normalize_separators, RosterRow, RosterTable};

/// Identifying name of a team; becomes the stem of its output file name.
pub const TEAM_NAME: &str = "Team Name";
pub const ORGANISATION: &str = "Organisation";
pub const DIVISION: &str = "Division";
pub const AWARD: &str = "Award";
pub const MENTOR_NAME: &str = "Mentor_Name";
pub const MENTOR_EMAIL: &str = "Mentor_Email";
/// Column appended by the splitter holding each row's output document.
pub const FILE_PATH: &str = "File Path";
