//! Flat work files in the temp directory
//!
//! `batch_NNNN` holds the lines handed to worker NNNN and `result_NNNN` the
//! result lines it produced. They record the in-memory hand-off of a run.

use log::{debug, warn};
use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::constants::work_files;
use crate::core::error::{CheckerError, Result};
use crate::pipeline::partitioner::WorkBatch;

#[derive(Debug, Clone)]
pub struct WorkFiles {
    dir: PathBuf,
}

impl WorkFiles {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn batch_path(&self, index: usize) -> PathBuf {
        self.dir.join(file_name(work_files::BATCH_PREFIX, index))
    }

    pub fn result_path(&self, index: usize) -> PathBuf {
        self.dir.join(file_name(work_files::RESULT_PREFIX, index))
    }

    /// Create the directory if needed and delete batch and result files
    /// left over for the first `count` indices. Returns how many were removed.
    pub fn prepare(&self, count: usize) -> Result<usize> {
        fs::create_dir_all(&self.dir)?;

        let mut removed = 0;
        for index in 0..count {
            for path in [self.batch_path(index), self.result_path(index)] {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        debug!("removed stale {}", path.display());
                        removed += 1;
                    }
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(CheckerError::Io(err)),
                }
            }
        }
        Ok(removed)
    }

    pub fn write_batch(&self, batch: &WorkBatch) -> Result<()> {
        write_lines(&self.batch_path(batch.index), &batch.lines)
    }

    pub fn write_results(&self, index: usize, lines: &[String]) -> Result<()> {
        write_lines(&self.result_path(index), lines)
    }

    /// Write every batch, logging failures instead of aborting.
    pub fn write_batches_logged(&self, batches: &[WorkBatch]) {
        for batch in batches {
            if let Err(err) = self.write_batch(batch) {
                warn!(
                    "couldn't write {}: {err}",
                    self.batch_path(batch.index).display()
                );
            }
        }
    }
}

fn file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{index:04}")
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read newline-separated input lines without trusting the encoding.
///
/// A line that is not valid UTF-8 is kept with its bad bytes replaced by
/// U+FFFD, so one mangled entry never costs the rest of the list.
pub fn read_input_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for (number, raw) in reader.split(b'\n').enumerate() {
        let mut raw = raw?;
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(err) => {
                warn!("input line {} is not valid UTF-8", number + 1);
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        lines.push(line);
    }
    Ok(lines)
}

/// Persist the URL list read from standard input.
pub fn persist_input<P: AsRef<Path>>(path: P, lines: &[String]) -> Result<()> {
    let path = path.as_ref();
    write_lines(path, lines).map_err(|err| {
        CheckerError::Config(format!(
            "couldn't create input file '{}': {err}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_paths_are_zero_padded() {
        let files = WorkFiles::new("/tmp/work");
        assert_eq!(files.batch_path(3), PathBuf::from("/tmp/work/batch_0003"));
        assert_eq!(files.result_path(12), PathBuf::from("/tmp/work/result_0012"));
    }

    #[test]
    fn test_prepare__removes_stale_files_only_for_run_indices() -> TestResult {
        let dir = tempfile::tempdir()?;
        let files = WorkFiles::new(dir.path());
        fs::write(files.batch_path(0), "old")?;
        fs::write(files.result_path(1), "old")?;
        fs::write(files.result_path(5), "other run")?;
        fs::write(dir.path().join("notes.txt"), "keep")?;

        let removed = files.prepare(2)?;

        assert_eq!(removed, 2);
        assert!(!files.batch_path(0).exists());
        assert!(!files.result_path(1).exists());
        assert!(files.result_path(5).exists());
        assert!(dir.path().join("notes.txt").exists());
        Ok(())
    }

    #[test]
    fn test_prepare__creates_directory() -> TestResult {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("a/b");
        WorkFiles::new(&nested).prepare(1)?;
        assert!(nested.is_dir());
        Ok(())
    }

    #[test]
    fn test_write_batch_and_results() -> TestResult {
        let dir = tempfile::tempdir()?;
        let files = WorkFiles::new(dir.path());
        let batch = WorkBatch {
            index: 1,
            lines: vec!["http://a.test_|_1_|_1".to_string(), "http://b.test_|_2_|_2".to_string()],
        };

        files.write_batch(&batch)?;
        files.write_results(1, &["HTTP/1.1_@_404_@__@__@_http://a.test_|_1_|_1".to_string()])?;

        assert_eq!(
            fs::read_to_string(files.batch_path(1))?,
            "http://a.test_|_1_|_1\nhttp://b.test_|_2_|_2\n"
        );
        assert_eq!(
            fs::read_to_string(files.result_path(1))?,
            "HTTP/1.1_@_404_@__@__@_http://a.test_|_1_|_1\n"
        );
        Ok(())
    }

    #[test]
    fn test_read_input_lines__invalid_utf8_line_is_kept() -> TestResult {
        let input: &[u8] = b"ftp://a.test/\xff_|_1_|_1\r\nftp://b.test/_|_2_|_1\n";

        let lines = read_input_lines(input)?;

        assert_eq!(
            lines,
            vec![
                "ftp://a.test/\u{FFFD}_|_1_|_1".to_string(),
                "ftp://b.test/_|_2_|_1".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_read_input_lines__no_trailing_newline() -> TestResult {
        let input: &[u8] = b"http://a.test_|_1_|_1\nhttp://b.test_|_2_|_2";
        assert_eq!(read_input_lines(input)?.len(), 2);
        assert!(read_input_lines(&b""[..])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_persist_input__unwritable_path() {
        let result = persist_input("/path/that/does/not/exist/in.txt", &[]);
        assert!(matches!(result, Err(CheckerError::Config(_))));
    }
}
