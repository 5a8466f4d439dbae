use crate::error::{Error, Result};
use crate::models::CommitRecord;
use chrono::{DateTime, Utc};
use globset::{Glob, GlobMatcher};
use tracing::warn;

/// Conjunction of optional filters over the record log. Unset filters (and
/// empty strings) match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub author: Option<String>,
    pub message: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub file_pattern: Option<String>,
    pub limit: Option<usize>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = Some(pattern.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn compile(&self) -> Result<RecordFilter> {
        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since > until {
                return Err(Error::InvalidRange { since, until });
            }
        }

        let lowered = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(str::to_lowercase)
        };

        Ok(RecordFilter {
            author: lowered(&self.author),
            message: lowered(&self.message),
            since: self.since,
            until: self.until,
            files: self
                .file_pattern
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(FileMatcher::new),
        })
    }
}

#[derive(Debug)]
pub(crate) struct RecordFilter {
    author: Option<String>,
    message: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    files: Option<FileMatcher>,
}

impl RecordFilter {
    pub(crate) fn matches(&self, record: &CommitRecord) -> bool {
        if let Some(author) = &self.author {
            let by_email = record.author.to_lowercase().contains(author);
            let by_name = record
                .author_name
                .as_deref()
                .map_or(false, |name| name.to_lowercase().contains(author));
            if !by_email && !by_name {
                return false;
            }
        }
        if let Some(message) = &self.message {
            if !record.message.to_lowercase().contains(message) {
                return false;
            }
        }
        if self.since.map_or(false, |since| record.timestamp < since) {
            return false;
        }
        if self.until.map_or(false, |until| record.timestamp > until) {
            return false;
        }
        match &self.files {
            Some(files) => record.changed_files.iter().any(|f| files.is_match(f)),
            None => true,
        }
    }
}

#[derive(Debug)]
enum FileMatcher {
    Glob(GlobMatcher),
    Substring(String),
}

impl FileMatcher {
    fn new(pattern: &str) -> Self {
        match Glob::new(pattern) {
            Ok(glob) => FileMatcher::Glob(glob.compile_matcher()),
            Err(e) => {
                warn!(
                    "Invalid glob pattern '{}', falling back to substring match: {}",
                    pattern, e
                );
                FileMatcher::Substring(pattern.to_lowercase())
            }
        }
    }

    fn is_match(&self, path: &str) -> bool {
        match self {
            FileMatcher::Glob(matcher) => {
                if matcher.is_match(path) {
                    return true;
                }
                // "src/*.rs" should also hit "crates/core/src/lib.rs"
                path.match_indices('/')
                    .any(|(i, _)| matcher.is_match(&path[i + 1..]))
            }
            FileMatcher::Substring(needle) => path.to_lowercase().contains(needle),
        }
    }
}
