//! Roster-driven document splitting
//!
//! Pairs row `i` of a roster with page `i + 1` of a source PDF, writes each
//! page as `{Team Name}_{document type}.pdf` and records where it went in a
//! copy of the roster.

use crate::error::SplitError;
use crate::split::{extract_page, load_document, page_count};
use serde::Serialize;
use shared_roster::{RosterTable, TEAM_NAME};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// File name of one output document
///
/// Depends only on its two arguments. Names are not sanitised, so two rows
/// sharing a team name write to the same file.
pub fn output_file_name(name: &str, document_type: &str) -> String {
    format!("{}_{}.pdf", name, document_type)
}

/// File name of the annotated roster written next to the documents
pub fn updated_roster_file_name(document_type: &str) -> String {
    format!("{}_Documents_Updated.csv", document_type)
}

/// One written single-page document
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutputDocument {
    /// Zero-based roster row (and zero-based source page)
    pub row: usize,
    pub name: String,
    pub path: PathBuf,
}

/// Result of a successful split
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutcome {
    /// Annotated roster, the input of the messaging phase
    pub updated_roster: PathBuf,
    pub documents: Vec<OutputDocument>,
}

#[derive(Debug, Clone)]
pub struct DocumentSplitter {
    source_pdf: PathBuf,
    roster_csv: PathBuf,
    output_dir: PathBuf,
    document_type: String,
}

impl DocumentSplitter {
    /// # Arguments
    ///
    /// * `source_pdf` - Multi-page PDF, one page per roster row
    /// * `roster_csv` - Roster with at least a `Team Name` column
    /// * `output_dir` - Destination, created when missing
    /// * `document_type` - Label used in file names (e.g. "Award")
    pub fn new(
        source_pdf: impl Into<PathBuf>,
        roster_csv: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        document_type: impl Into<String>,
    ) -> Self {
        Self {
            source_pdf: source_pdf.into(),
            roster_csv: roster_csv.into(),
            output_dir: output_dir.into(),
            document_type: document_type.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    /// Where `split` writes the annotated roster
    pub fn updated_roster_path(&self) -> PathBuf {
        self.output_dir
            .join(updated_roster_file_name(&self.document_type))
    }

    /// Split the source PDF into one document per roster row
    ///
    /// Nothing is written, not even the output directory, unless the roster
    /// row count equals the PDF page count.
    #[instrument(skip(self), fields(document_type = %self.document_type))]
    pub fn split(&self) -> Result<SplitOutcome, SplitError> {
        let mut table = RosterTable::from_path(&self.roster_csv)?;
        table.require_columns(&[TEAM_NAME])?;

        let bytes = fs::read(&self.source_pdf).map_err(|e| SplitError::io(&self.source_pdf, e))?;
        let doc = load_document(&bytes)?;
        let pages = page_count(&doc);

        if table.len() != pages {
            return Err(SplitError::CountMismatch {
                rows: table.len(),
                pages,
            });
        }

        self.warn_on_duplicate_names(&table);
        self.ensure_output_dir()?;

        let mut documents = Vec::with_capacity(table.len());
        for (row, page_number) in table.rows().zip(1u32..) {
            let name = row.team_name().unwrap_or_default();
            let single = extract_page(&doc, page_number)?;

            let path = self
                .output_dir
                .join(output_file_name(name, &self.document_type));
            fs::write(&path, single).map_err(|e| SplitError::io(&path, e))?;
            info!("Created: {}", path.display());

            documents.push(OutputDocument {
                row: row.index(),
                name: name.to_string(),
                path,
            });
        }

        let paths: Vec<String> = documents
            .iter()
            .map(|d| d.path.to_string_lossy().into_owned())
            .collect();
        table.set_file_paths(&paths)?;

        let updated_roster = self.updated_roster_path();
        table.write_to_path(&updated_roster)?;
        info!(
            documents = documents.len(),
            "All documents generated. Updated roster saved at: {}",
            updated_roster.display()
        );

        Ok(SplitOutcome {
            updated_roster,
            documents,
        })
    }

    fn ensure_output_dir(&self) -> Result<(), SplitError> {
        if self.output_dir.is_dir() {
            info!("Output folder already exists: {}", self.output_dir.display());
            return Ok(());
        }
        fs::create_dir_all(&self.output_dir).map_err(|e| SplitError::io(&self.output_dir, e))?;
        info!("Output folder created: {}", self.output_dir.display());
        Ok(())
    }

    fn warn_on_duplicate_names(&self, table: &RosterTable) {
        let mut seen = HashSet::new();
        for row in table.rows() {
            let name = row.team_name().unwrap_or_default();
            if !seen.insert(name) {
                warn!(
                    row = row.index(),
                    file = %output_file_name(name, &self.document_type),
                    "Duplicate team name; earlier output will be overwritten"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::test_pdf::{create_test_pdf, page_label};
    use lopdf::Document;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const HEADER: &str = "Team Name,Organisation,Division,Award,Mentor_Name,Mentor_Email";

    struct Fixture {
        dir: TempDir,
        pdf: PathBuf,
        csv: PathBuf,
    }

    impl Fixture {
        fn new(pages: u32, names: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let pdf = dir.path().join("source.pdf");
            fs::write(&pdf, create_test_pdf(pages)).unwrap();

            let mut csv = String::from(HEADER);
            csv.push('\n');
            for name in names {
                csv.push_str(&format!(
                    "{},Org,Lightweight,Award,Mentor {},{}@example.org\n",
                    name,
                    name,
                    name.to_lowercase()
                ));
            }
            let csv_path = dir.path().join("roster.csv");
            fs::write(&csv_path, csv).unwrap();

            Self {
                dir,
                pdf,
                csv: csv_path,
            }
        }

        fn out(&self) -> PathBuf {
            self.dir.path().join("out")
        }

        fn splitter(&self) -> DocumentSplitter {
            DocumentSplitter::new(&self.pdf, &self.csv, self.out(), "Award")
        }
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("Alpha", "Award"), "Alpha_Award.pdf");
        assert_eq!(
            output_file_name("Team 7", "Participation"),
            "Team 7_Participation.pdf"
        );
    }

    #[test]
    fn test_updated_roster_file_name() {
        assert_eq!(
            updated_roster_file_name("Award"),
            "Award_Documents_Updated.csv"
        );
    }

    #[test]
    fn test_split_three_pages() {
        let fx = Fixture::new(3, &["Alpha", "Beta", "Gamma"]);
        let outcome = fx.splitter().split().unwrap();

        let out = fx.out();
        for (i, name) in ["Alpha", "Beta", "Gamma"].iter().enumerate() {
            let path = out.join(format!("{}_Award.pdf", name));
            let bytes = fs::read(&path).unwrap();
            let doc = Document::load_mem(&bytes).unwrap();
            assert_eq!(doc.get_pages().len(), 1);
            assert_eq!(page_label(&bytes), format!("Page {}", i + 1));
            assert_eq!(outcome.documents[i].path, path);
            assert_eq!(outcome.documents[i].row, i);
        }

        assert_eq!(outcome.updated_roster, out.join("Award_Documents_Updated.csv"));

        let table = RosterTable::from_path(&outcome.updated_roster).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.headers().last().unwrap(), "File Path");
        for row in table.rows() {
            let file_path = row.file_path().unwrap();
            assert!(!file_path.is_empty());
            assert!(Path::new(file_path).is_file());
        }
        assert!(table
            .row(1)
            .unwrap()
            .file_path()
            .unwrap()
            .ends_with("Beta_Award.pdf"));
    }

    #[test]
    fn test_updated_roster_keeps_original_columns() {
        let fx = Fixture::new(1, &["Alpha"]);
        let outcome = fx.splitter().split().unwrap();

        let table = RosterTable::from_path(&outcome.updated_roster).unwrap();
        let expected: Vec<String> = HEADER
            .split(',')
            .map(String::from)
            .chain(std::iter::once("File Path".to_string()))
            .collect();
        assert_eq!(table.headers(), expected.as_slice());
        assert_eq!(table.row(0).unwrap().mentor_email(), Some("alpha@example.org"));
    }

    #[test]
    fn test_count_mismatch_writes_nothing() {
        let fx = Fixture::new(3, &["Alpha", "Beta"]);
        let err = fx.splitter().split().unwrap_err();

        assert!(matches!(err, SplitError::CountMismatch { rows: 2, pages: 3 }));
        assert!(!fx.out().exists());
    }

    #[test]
    fn test_count_mismatch_leaves_existing_dir_untouched() {
        let fx = Fixture::new(2, &["Alpha", "Beta", "Gamma"]);
        fs::create_dir_all(fx.out()).unwrap();

        let err = fx.splitter().split().unwrap_err();
        assert!(matches!(err, SplitError::CountMismatch { rows: 3, pages: 2 }));
        assert_eq!(fs::read_dir(fx.out()).unwrap().count(), 0);
    }

    #[test]
    fn test_rerun_with_existing_dir_succeeds() {
        let fx = Fixture::new(2, &["Alpha", "Beta"]);
        fx.splitter().split().unwrap();
        let outcome = fx.splitter().split().unwrap();

        assert_eq!(outcome.documents.len(), 2);
        // Two documents plus the annotated roster
        assert_eq!(fs::read_dir(fx.out()).unwrap().count(), 3);
    }

    #[test]
    fn test_duplicate_names_overwrite() {
        let fx = Fixture::new(2, &["Alpha", "Alpha"]);
        let outcome = fx.splitter().split().unwrap();

        assert_eq!(outcome.documents[0].path, outcome.documents[1].path);
        let bytes = fs::read(&outcome.documents[0].path).unwrap();
        assert_eq!(page_label(&bytes), "Page 2");
    }

    #[test]
    fn test_missing_team_name_column() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("source.pdf");
        fs::write(&pdf, create_test_pdf(1)).unwrap();
        let csv = dir.path().join("roster.csv");
        fs::write(&csv, "Name,Division\nAlpha,Open\n").unwrap();

        let err = DocumentSplitter::new(&pdf, &csv, dir.path().join("out"), "Award")
            .split()
            .unwrap_err();
        assert!(matches!(err, SplitError::Roster(_)));
    }

    #[test]
    fn test_missing_source_pdf() {
        let fx = Fixture::new(1, &["Alpha"]);
        fs::remove_file(&fx.pdf).unwrap();

        let err = fx.splitter().split().unwrap_err();
        assert!(matches!(err, SplitError::Io { .. }));
        assert!(!fx.out().exists());
    }
}
