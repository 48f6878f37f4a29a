//! Roster-driven PDF splitting
//!
//! Turns one multi-page PDF plus a roster CSV into one single-page PDF per
//! roster row, using lopdf for all document handling.
//!
//! - `split::extract_page`: one page of a loaded document as a new PDF
//! - `DocumentSplitter::split`: the full roster pass, returning the path of
//!   the annotated roster consumed by the messaging phase

pub mod error;
pub mod split;
pub mod splitter;

pub use error::SplitError;
pub use split::{extract_page, load_document, page_count};
pub use splitter::{
    output_file_name, updated_roster_file_name, DocumentSplitter, OutputDocument, SplitOutcome,
};
