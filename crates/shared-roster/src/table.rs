//! In-memory roster table
//!
//! Keeps every column of the source file, in order, so a table can be read,
//! annotated with output locations and written back without losing data.

use crate::error::RosterError;
use crate::{AWARD, DIVISION, FILE_PATH, MENTOR_EMAIL, MENTOR_NAME, ORGANISATION, TEAM_NAME};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Ordered rows of a roster CSV, header included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl RosterTable {
    /// Load a roster from a CSV file with a header row
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RosterError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|source| RosterError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let table = Self::from_csv(reader).map_err(|e| match e {
            RosterError::Csv(source) => RosterError::Read {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!(path = %path.display(), rows = table.len(), "Loaded roster");
        Ok(table)
    }

    /// Parse a roster from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RosterError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, RosterError> {
        let headers = reader.headers()?.iter().map(String::from).collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(String::from).collect());
        }

        Ok(Self { headers, records })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column by exact header name
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Fail with the first column in `columns` the table does not have
    pub fn require_columns(&self, columns: &[&str]) -> Result<(), RosterError> {
        match columns.iter().find(|c| self.column_index(c).is_none()) {
            Some(missing) => Err(RosterError::MissingColumn((*missing).to_string())),
            None => Ok(()),
        }
    }

    pub fn row(&self, index: usize) -> Option<RosterRow<'_>> {
        (index < self.records.len()).then_some(RosterRow { table: self, index })
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = RosterRow<'_>> + '_ {
        (0..self.records.len()).map(move |index| RosterRow { table: self, index })
    }

    /// Record one output location per row under the `File Path` column
    ///
    /// The column is appended when absent. A table that already carries it
    /// (for example a previously annotated roster fed back in) has its values
    /// replaced in place.
    pub fn set_file_paths<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<(), RosterError> {
        if paths.len() != self.records.len() {
            return Err(RosterError::PathCountMismatch {
                expected: self.records.len(),
                actual: paths.len(),
            });
        }

        let column = match self.column_index(FILE_PATH) {
            Some(index) => index,
            None => {
                self.headers.push(FILE_PATH.to_string());
                for record in &mut self.records {
                    record.push(String::new());
                }
                self.headers.len() - 1
            }
        };

        for (record, path) in self.records.iter_mut().zip(paths) {
            record[column] = normalize_separators(path.as_ref());
        }
        Ok(())
    }

    /// Rewrite every `File Path` value to use forward slashes
    pub fn normalize_file_paths(&mut self) {
        if let Some(column) = self.column_index(FILE_PATH) {
            for record in &mut self.records {
                record[column] = normalize_separators(&record[column]);
            }
        }
    }

    /// Write header and rows as CSV
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), RosterError> {
        let mut writer = csv::Writer::from_writer(writer);
        self.write_csv(&mut writer)?;
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), RosterError> {
        let path = path.as_ref();
        let wrap = |source: csv::Error| RosterError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
        self.write_csv(&mut writer).map_err(wrap)?;
        debug!(path = %path.display(), rows = self.len(), "Wrote roster");
        Ok(())
    }

    fn write_csv<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<(), csv::Error> {
        writer.write_record(&self.headers)?;
        for record in &self.records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Borrowed view of one roster row
#[derive(Debug, Clone, Copy)]
pub struct RosterRow<'a> {
    table: &'a RosterTable,
    index: usize,
}

impl<'a> RosterRow<'a> {
    /// Zero-based position in the table
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of an arbitrary column
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let position = self.table.column_index(column)?;
        self.table.records[self.index]
            .get(position)
            .map(String::as_str)
    }

    pub fn team_name(&self) -> Option<&'a str> {
        self.get(TEAM_NAME)
    }

    pub fn organisation(&self) -> Option<&'a str> {
        self.get(ORGANISATION)
    }

    pub fn division(&self) -> Option<&'a str> {
        self.get(DIVISION)
    }

    pub fn award(&self) -> Option<&'a str> {
        self.get(AWARD)
    }

    pub fn mentor_name(&self) -> Option<&'a str> {
        self.get(MENTOR_NAME)
    }

    pub fn mentor_email(&self) -> Option<&'a str> {
        self.get(MENTOR_EMAIL)
    }

    pub fn file_path(&self) -> Option<&'a str> {
        self.get(FILE_PATH)
    }
}

/// Replace Windows-style `\` separators with `/`
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ROSTER: &str = "\
Team Name,Organisation,Division,Award,Mentor_Name,Mentor_Email
Alpha,North High,Lightweight,Award,Pat,pat@example.org
Beta,South High,Open,Award,Sam,sam@example.org
";

    #[test]
    fn test_parses_headers_and_rows_in_order() {
        let table = RosterTable::from_reader(ROSTER.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.headers()[0], "Team Name");

        let names: Vec<_> = table.rows().map(|r| r.team_name().unwrap()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_typed_accessors() {
        let table = RosterTable::from_reader(ROSTER.as_bytes()).unwrap();
        let row = table.row(1).unwrap();
        assert_eq!(row.index(), 1);
        assert_eq!(row.organisation(), Some("South High"));
        assert_eq!(row.division(), Some("Open"));
        assert_eq!(row.award(), Some("Award"));
        assert_eq!(row.mentor_name(), Some("Sam"));
        assert_eq!(row.mentor_email(), Some("sam@example.org"));
        assert_eq!(row.file_path(), None);
    }

    #[test]
    fn test_row_out_of_range() {
        let table = RosterTable::from_reader(ROSTER.as_bytes()).unwrap();
        assert!(table.row(2).is_none());
    }

    #[test]
    fn test_require_columns_reports_first_missing() {
        let table = RosterTable::from_reader(ROSTER.as_bytes()).unwrap();
        assert!(table.require_columns(&[TEAM_NAME, MENTOR_EMAIL]).is_ok());

        let err = table
            .require_columns(&[TEAM_NAME, FILE_PATH, "Other"])
            .unwrap_err();
        assert!(matches!(err, RosterError::MissingColumn(ref c) if c == FILE_PATH));
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let input = "Team Name,Division\nAlpha,Open\nBeta\n";
        assert!(RosterTable::from_reader(input.as_bytes()).is_err());
    }

    #[test]
    fn test_header_only_roster_is_empty() {
        let table = RosterTable::from_reader("Team Name\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_set_file_paths_appends_column() {
        let mut table = RosterTable::from_reader(ROSTER.as_bytes()).unwrap();
        table
            .set_file_paths(&["out\\Alpha_Award.pdf", "out/Beta_Award.pdf"])
            .unwrap();

        assert_eq!(table.headers().last().unwrap(), FILE_PATH);
        assert_eq!(table.row(0).unwrap().file_path(), Some("out/Alpha_Award.pdf"));
        assert_eq!(table.row(1).unwrap().file_path(), Some("out/Beta_Award.pdf"));
    }

    #[test]
    fn test_set_file_paths_reuses_existing_column() {
        let input = "Team Name,File Path\nAlpha,old.pdf\n";
        let mut table = RosterTable::from_reader(input.as_bytes()).unwrap();
        table.set_file_paths(&["new.pdf"]).unwrap();

        assert_eq!(table.headers(), &["Team Name".to_string(), FILE_PATH.to_string()]);
        assert_eq!(table.row(0).unwrap().file_path(), Some("new.pdf"));
    }

    #[test]
    fn test_set_file_paths_count_must_match() {
        let mut table = RosterTable::from_reader(ROSTER.as_bytes()).unwrap();
        let err = table.set_file_paths(&["only-one.pdf"]).unwrap_err();
        assert!(matches!(
            err,
            RosterError::PathCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_normalize_file_paths() {
        let input = "Team Name,File Path\nAlpha,C:\\out\\Alpha_Award.pdf\n";
        let mut table = RosterTable::from_reader(input.as_bytes()).unwrap();
        table.normalize_file_paths();
        assert_eq!(
            table.row(0).unwrap().file_path(),
            Some("C:/out/Alpha_Award.pdf")
        );
    }

    #[test]
    fn test_write_keeps_columns_and_order() {
        let mut table = RosterTable::from_reader(ROSTER.as_bytes()).unwrap();
        table.set_file_paths(&["a.pdf", "b.pdf"]).unwrap();

        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        let written = String::from_utf8(out).unwrap();

        assert_eq!(
            written,
            "\
Team Name,Organisation,Division,Award,Mentor_Name,Mentor_Email,File Path
Alpha,North High,Lightweight,Award,Pat,pat@example.org,a.pdf
Beta,South High,Open,Award,Sam,sam@example.org,b.pdf
"
        );
    }

    #[test]
    fn test_write_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");

        let table = RosterTable::from_reader(ROSTER.as_bytes()).unwrap();
        table.write_to_path(&path).unwrap();

        let reloaded = RosterTable::from_path(&path).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = RosterTable::from_path("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("here.csv"));
    }
}
