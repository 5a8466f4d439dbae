use crate::error::ValidationError;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Fields every log line must carry, in serialization order.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "id",
    "timestamp",
    "commit_hash",
    "author",
    "message",
    "changed_files",
    "insertions",
    "deletions",
    "repository_path",
];

pub const HASH_LEN: usize = 40;

/// Commit data pulled from the repository, before the tracker stamps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDraft {
    pub commit_hash: String,
    pub author: String,
    pub message: String,
    pub changed_files: Vec<String>,
    pub insertions: u64,
    pub deletions: u64,
    pub repository_path: PathBuf,
    pub author_name: Option<String>,
    pub committed_at: Option<DateTime<Utc>>,
}

impl CommitDraft {
    pub fn new(
        commit_hash: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
        repository_path: PathBuf,
    ) -> Self {
        Self {
            commit_hash: commit_hash.into(),
            author: author.into(),
            message: message.into(),
            changed_files: Vec::new(),
            insertions: 0,
            deletions: 0,
            repository_path,
            author_name: None,
            committed_at: None,
        }
    }

    pub fn with_stats(mut self, changed_files: Vec<String>, insertions: u64, deletions: u64) -> Self {
        self.changed_files = changed_files;
        self.insertions = insertions;
        self.deletions = deletions;
        self
    }

    pub fn with_author_name(mut self, name: impl Into<String>) -> Self {
        self.author_name = Some(name.into());
        self
    }

    pub fn with_committed_at(mut self, committed_at: DateTime<Utc>) -> Self {
        self.committed_at = Some(committed_at);
        self
    }
}

/// One tracking event, stored as a single line of the record log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: Uuid,
    #[serde(with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub commit_hash: String,
    pub author: String,
    pub message: String,
    pub changed_files: Vec<String>,
    pub insertions: u64,
    pub deletions: u64,
    pub repository_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_at: Option<DateTime<Utc>>,
}

impl CommitRecord {
    /// Stamps a draft with a fresh id and the current time.
    pub fn from_draft(draft: CommitDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            // Truncated to what the log line can hold.
            timestamp: Utc::now().trunc_subsecs(6),
            commit_hash: draft.commit_hash,
            author: draft.author,
            message: draft.message,
            changed_files: draft.changed_files,
            insertions: draft.insertions,
            deletions: draft.deletions,
            repository_path: draft.repository_path,
            author_name: draft.author_name,
            committed_at: draft.committed_at,
        }
    }

    pub fn short_hash(&self) -> &str {
        self.commit_hash.get(..8).unwrap_or(&self.commit_hash)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let entry = serde_json::to_value(self)
            .map_err(|e| ValidationError::new("record", e.to_string()))?;
        validate_entry(&entry)
    }
}

/// Checks a decoded log entry. The first violation wins, in this order:
/// missing field, id, commit_hash, timestamp, changed_files, then the rest.
pub fn validate_entry(entry: &Value) -> Result<(), ValidationError> {
    let obj = entry
        .as_object()
        .ok_or_else(|| ValidationError::new("record", "expected a JSON object"))?;

    for field in REQUIRED_FIELDS {
        if obj.get(field).map_or(true, Value::is_null) {
            return Err(ValidationError::new(field, "missing required field"));
        }
    }

    match obj["id"].as_str().map(Uuid::parse_str) {
        Some(Ok(id)) if !id.is_nil() => {}
        Some(Ok(_)) => return Err(ValidationError::new("id", "nil UUID")),
        _ => return Err(ValidationError::new("id", "not a UUID string")),
    }

    match obj["commit_hash"].as_str() {
        Some(hash) if is_valid_hash(hash) => {}
        _ => {
            return Err(ValidationError::new(
                "commit_hash",
                "expected 40 lowercase hexadecimal characters",
            ))
        }
    }

    let timestamp_ok = obj["timestamp"]
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map_or(false, |dt| dt.offset().local_minus_utc() == 0);
    if !timestamp_ok {
        return Err(ValidationError::new(
            "timestamp",
            "expected an RFC 3339 UTC timestamp",
        ));
    }

    let files = obj["changed_files"]
        .as_array()
        .ok_or_else(|| ValidationError::new("changed_files", "expected an array of paths"))?;
    for file in files {
        match file.as_str() {
            Some(path) if !path.is_empty() && !Path::new(path).is_absolute() => {}
            _ => {
                return Err(ValidationError::new(
                    "changed_files",
                    format!("not a relative path: {}", file),
                ))
            }
        }
    }

    if !obj["author"].as_str().map_or(false, is_email_shaped) {
        return Err(ValidationError::new("author", "expected an email address"));
    }

    if !obj["message"].is_string() {
        return Err(ValidationError::new("message", "expected a string"));
    }

    for field in ["insertions", "deletions"] {
        if !obj[field].is_u64() {
            return Err(ValidationError::new(field, "expected a non-negative integer"));
        }
    }

    if !obj["repository_path"]
        .as_str()
        .map_or(false, |p| Path::new(p).is_absolute())
    {
        return Err(ValidationError::new(
            "repository_path",
            "expected an absolute path",
        ));
    }

    Ok(())
}

pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == HASH_LEN && hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

pub fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

mod utc_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
