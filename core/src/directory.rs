//! Sources of candidate names for mention suggestions.

use std::collections::HashSet;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMatching {
    #[default]
    Insensitive,
    Sensitive,
}

/// Read-only lookup of names by prefix.
///
/// Implementations return matches in their own defined order and must not
/// return the same name twice.
pub trait Directory {
    fn search(&self, prefix: &str, case: CaseMatching) -> Vec<String>;
}

impl<D: Directory + ?Sized> Directory for &D {
    fn search(&self, prefix: &str, case: CaseMatching) -> Vec<String> {
        (**self).search(prefix, case)
    }
}

impl<D: Directory + ?Sized> Directory for Box<D> {
    fn search(&self, prefix: &str, case: CaseMatching) -> Vec<String> {
        (**self).search(prefix, case)
    }
}

/// Fixed, in-memory list of names kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    names: Vec<String>,
    /// Lowercased copy of `names`, index-aligned.
    folded: Vec<String>,
}

impl StaticDirectory {
    /// Build a directory, dropping empty names and case-insensitive
    /// duplicates (the first spelling wins).
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut directory = Self::default();
        for name in names {
            let name: String = name.into();
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let folded = name.to_lowercase();
            if seen.insert(folded.clone()) {
                directory.names.push(name.to_string());
                directory.folded.push(folded);
            }
        }
        directory
    }

    /// Load one name per line. Blank lines and lines starting with `#` are
    /// skipped.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let directory = Self::parse(&contents);
        tracing::debug!(
            path = %path.display(),
            entries = directory.len(),
            "loaded mention directory"
        );
        Ok(directory)
    }

    fn parse(contents: &str) -> Self {
        Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Directory for StaticDirectory {
    fn search(&self, prefix: &str, case: CaseMatching) -> Vec<String> {
        match case {
            CaseMatching::Insensitive => {
                let prefix = prefix.to_lowercase();
                self.names
                    .iter()
                    .zip(&self.folded)
                    .filter(|(_, folded)| folded.starts_with(&prefix))
                    .map(|(name, _)| name.clone())
                    .collect()
            }
            CaseMatching::Sensitive => self
                .names
                .iter()
                .filter(|name| name.starts_with(prefix))
                .cloned()
                .collect(),
        }
    }
}
