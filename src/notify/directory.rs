//! Record-type directory: who receives the reports for each record type

use log::warn;
use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::core::constants::delimiters;
use crate::core::error::{CheckerError, Result};
use crate::core::types::RecordType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub display_name: String,
    pub recipients: Vec<String>,
}

/// Mailing list keyed by record type, read from `type|name|r1,r2` lines.
#[derive(Debug, Clone, Default)]
pub struct RecordTypeDirectory {
    entries: FxHashMap<RecordType, DirectoryEntry>,
}

impl RecordTypeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => CheckerError::FileNotFound(path.display().to_string()),
            _ => CheckerError::Io(err),
        })?;
        Self::parse_str(&content)
    }

    /// Parse directory lines. A line without three fields is an error; an
    /// unknown record type is skipped with a warning.
    pub fn parse_str(content: &str) -> Result<Self> {
        let mut directory = Self::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.splitn(3, delimiters::DIRECTORY).collect();
            let [code, name, recipients] = fields.as_slice() else {
                return Err(CheckerError::Config(format!(
                    "mailing list line {}: expected type|name|recipients, got '{line}'",
                    number + 1
                )));
            };

            let Ok(record_type) = code.parse::<RecordType>() else {
                warn!(
                    "mailing list line {}: unknown record type '{code}', ignored",
                    number + 1
                );
                continue;
            };

            let recipients = recipients
                .split(delimiters::RECIPIENTS)
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect();

            directory.insert(
                record_type,
                DirectoryEntry {
                    display_name: name.trim().to_string(),
                    recipients,
                },
            );
        }

        Ok(directory)
    }

    /// Later entries for the same record type replace earlier ones.
    pub fn insert(&mut self, record_type: RecordType, entry: DirectoryEntry) {
        self.entries.insert(record_type, entry);
    }

    pub fn get(&self, record_type: RecordType) -> Option<&DirectoryEntry> {
        self.entries.get(&record_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_parse_str__both_record_types() -> TestResult {
        let directory = RecordTypeDirectory::parse_str(
            "1|Bibliographic|cat@example.org,meta@example.org\n2|Portfolio|eres@example.org\n",
        )?;

        assert_eq!(directory.len(), 2);
        let bib = directory.get(RecordType::Bibliographic).ok_or("missing type 1")?;
        assert_eq!(bib.display_name, "Bibliographic");
        assert_eq!(bib.recipients, vec!["cat@example.org", "meta@example.org"]);
        let portfolio = directory.get(RecordType::Portfolio).ok_or("missing type 2")?;
        assert_eq!(portfolio.recipients, vec!["eres@example.org"]);
        Ok(())
    }

    #[test]
    fn test_parse_str__skips_blank_lines_and_trims() -> TestResult {
        let directory = RecordTypeDirectory::parse_str("\n1|Bib| a@x.org , b@x.org \r\n\n")?;
        let bib = directory.get(RecordType::Bibliographic).ok_or("missing type 1")?;
        assert_eq!(bib.recipients, vec!["a@x.org", "b@x.org"]);
        assert!(directory.get(RecordType::Portfolio).is_none());
        Ok(())
    }

    #[test]
    fn test_parse_str__unknown_record_type_is_ignored() -> TestResult {
        let directory = RecordTypeDirectory::parse_str("3|Other|x@y.org\n2|Portfolio|p@y.org")?;
        assert_eq!(directory.len(), 1);
        Ok(())
    }

    #[test]
    fn test_parse_str__malformed_line_is_an_error() {
        let result = RecordTypeDirectory::parse_str("1|Bibliographic\n");
        assert!(matches!(result, Err(CheckerError::Config(_))));
    }

    #[test]
    fn test_parse_str__later_entry_wins() -> TestResult {
        let directory = RecordTypeDirectory::parse_str("1|Old|a@x.org\n1|New|b@x.org")?;
        let bib = directory.get(RecordType::Bibliographic).ok_or("missing type 1")?;
        assert_eq!(bib.display_name, "New");
        Ok(())
    }

    #[test]
    fn test_load_from_file__missing_file() {
        let result = RecordTypeDirectory::load_from_file("/nonexistent/mailing_list.txt");
        assert!(matches!(result, Err(CheckerError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() -> TestResult {
        let file = tempfile::NamedTempFile::new()?;
        fs::write(file.path(), "2|Portfolio|p@x.org\n")?;
        let directory = RecordTypeDirectory::load_from_file(file.path())?;
        assert!(directory.get(RecordType::Portfolio).is_some());
        Ok(())
    }
}
