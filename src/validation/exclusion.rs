//! Substring-based URL exclusion

use log::warn;
use memchr::memmem::Finder;
use std::fs;
use std::path::Path;

use crate::core::error::Result;

/// Ordered list of substrings; a URL is excluded iff any entry occurs in it.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    finders: Vec<Finder<'static>>,
}

impl ExclusionSet {
    /// Build from entries. Blank entries are dropped since an empty needle
    /// would match every URL.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let finders = entries
            .into_iter()
            .filter(|entry| !entry.as_ref().trim().is_empty())
            .map(|entry| Finder::new(entry.as_ref().as_bytes()).into_owned())
            .collect();
        Self { finders }
    }

    /// Read one entry per line from `path`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::new(content.lines()))
    }

    /// Load the optional exclusion file; an unreadable file is logged and
    /// treated as an empty list so the run can proceed.
    pub fn load_optional(path: Option<&str>) -> Self {
        match path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|err| {
                warn!("couldn't open exclusion {path}: {err}");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        self.finders
            .iter()
            .any(|finder| finder.find(url.as_bytes()).is_some())
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }
}
