//! Access to the version-control subsystem.
//!
//! Everything the pipeline needs from git goes through [`VcsBackend`], so the
//! inspector and tracker can run against an in-memory fake in tests.
//! [`GitCli`] is the production implementation and shells out to `git`.

use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::models::{is_valid_hash, CommitDraft};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Which commits a tracking run should pick up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The commit HEAD points at.
    Latest,
    /// One commit, by full hash.
    Hash(String),
    /// Commits whose committer date falls in `since..=until`.
    Range {
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    },
}

impl Selector {
    pub fn range(since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        Selector::Range { since, until }
    }

    /// Returns the selector with its hash lower-cased, or the reason it is unusable.
    pub fn normalized(&self) -> Result<Selector> {
        match self {
            Selector::Latest => Ok(Selector::Latest),
            Selector::Hash(hash) => {
                let lowered = hash.trim().to_ascii_lowercase();
                if is_valid_hash(&lowered) {
                    Ok(Selector::Hash(lowered))
                } else {
                    Err(Error::InvalidHash(hash.clone()))
                }
            }
            Selector::Range { since, until } => match (since, until) {
                (Some(since), Some(until)) if since > until => Err(Error::InvalidRange {
                    since: *since,
                    until: *until,
                }),
                _ => Ok(self.clone()),
            },
        }
    }
}

pub trait VcsBackend {
    /// Repository root containing `path`, if any. Looks for a `.git` entry
    /// in `path` and each of its ancestors.
    fn find_root(&self, path: &Path) -> Option<PathBuf> {
        let start = std::fs::canonicalize(path).ok()?;
        start
            .ancestors()
            .find(|dir| dir.join(".git").exists())
            .map(Path::to_path_buf)
    }

    /// Commit ids for a normalized selector. Ranges come back oldest first.
    fn resolve(&self, root: &Path, selector: &Selector) -> Result<Vec<String>>;

    /// Full metadata for one commit. Either everything or an error.
    fn extract(&self, root: &Path, commit_id: &str) -> Result<CommitDraft>;
}

/// Summary of a repository, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryInfo {
    pub repository_path: PathBuf,
    pub remote_url: Option<String>,
    pub current_branch: Option<String>,
    pub total_commits: u64,
    pub last_commit_date: Option<DateTime<Utc>>,
}

const HEADER_FORMAT: &str = "--format=%H%x00%an%x00%ae%x00%cI%x00%s";

/// [`VcsBackend`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.git_binary.clone())
    }

    fn run(&self, root: &Path, args: &[&str]) -> Result<String> {
        debug!("Running {} {} in {:?}", self.binary, args.join(" "), root);

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(root)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::Git(format!(
                    "'{}' executable not found; is git installed?",
                    self.binary
                )),
                _ => Error::Io(e),
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::Git(format!(
                "{} {}: {}",
                self.binary,
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn succeeds(&self, root: &Path, args: &[&str]) -> bool {
        self.run(root, args).is_ok()
    }

    fn head(&self, root: &Path) -> Option<String> {
        self.run(root, &["rev-parse", "--verify", "--quiet", "HEAD^{commit}"])
            .ok()
            .map(|out| out.trim().to_string())
            .filter(|hash| !hash.is_empty())
    }

    pub fn repository_info(&self, root: &Path) -> RepositoryInfo {
        let non_empty = |out: String| {
            let trimmed = out.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        };

        RepositoryInfo {
            repository_path: root.to_path_buf(),
            remote_url: self
                .run(root, &["config", "--get", "remote.origin.url"])
                .ok()
                .and_then(non_empty),
            current_branch: self
                .run(root, &["branch", "--show-current"])
                .ok()
                .and_then(non_empty),
            total_commits: self
                .run(root, &["rev-list", "--count", "HEAD"])
                .ok()
                .and_then(|out| out.trim().parse().ok())
                .unwrap_or(0),
            last_commit_date: self
                .run(root, &["log", "-1", "--format=%cI"])
                .ok()
                .and_then(|out| parse_git_date(out.trim())),
        }
    }
}

impl VcsBackend for GitCli {
    fn resolve(&self, root: &Path, selector: &Selector) -> Result<Vec<String>> {
        match selector {
            Selector::Latest => self
                .head(root)
                .map(|hash| vec![hash])
                .ok_or_else(|| Error::CommitNotFound("HEAD".to_string())),
            Selector::Hash(hash) => Ok(vec![hash.clone()]),
            Selector::Range { since, until } => {
                if self.head(root).is_none() {
                    return Ok(Vec::new());
                }

                let mut args = vec!["log".to_string(), "--reverse".to_string(), "--format=%H".to_string()];
                if let Some(since) = since {
                    args.push(format!("--since={}", since.to_rfc3339()));
                }
                if let Some(until) = until {
                    args.push(format!("--until={}", until.to_rfc3339()));
                }
                args.push("HEAD".to_string());

                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                let output = self.run(root, &args)?;
                Ok(output
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect())
            }
        }
    }

    fn extract(&self, root: &Path, commit_id: &str) -> Result<CommitDraft> {
        let object = format!("{}^{{commit}}", commit_id);
        if !self.succeeds(root, &["cat-file", "-e", &object]) {
            return Err(Error::CommitNotFound(commit_id.to_string()));
        }

        // Tags and other commit-ish ids are read through the peeled object.
        let header = parse_header(&self.run(root, &["show", "-s", HEADER_FORMAT, &object])?)?;
        let stats = parse_numstat(&self.run(
            root,
            &[
                "diff-tree",
                "--root",
                "--no-commit-id",
                "--no-renames",
                "-r",
                "-z",
                "--numstat",
                &object,
            ],
        )?)?;

        let mut draft = CommitDraft::new(header.hash, header.email, header.subject, root.to_path_buf())
            .with_stats(stats.files, stats.insertions, stats.deletions);
        if !header.name.is_empty() {
            draft = draft.with_author_name(header.name);
        }
        if let Some(committed_at) = header.committed_at {
            draft = draft.with_committed_at(committed_at);
        }
        Ok(draft)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommitHeader {
    pub hash: String,
    pub name: String,
    pub email: String,
    pub committed_at: Option<DateTime<Utc>>,
    pub subject: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DiffStats {
    pub files: Vec<String>,
    pub insertions: u64,
    pub deletions: u64,
}

/// Parses the NUL-separated output of `git show -s` with [`HEADER_FORMAT`].
pub(crate) fn parse_header(output: &str) -> Result<CommitHeader> {
    let line = output.trim_end_matches(['\n', '\r']);
    let parts: Vec<&str> = line.splitn(5, '\0').collect();
    if parts.len() != 5 {
        return Err(Error::Git(format!(
            "unexpected commit header output: {:?}",
            line
        )));
    }

    let hash = parts[0].trim();
    if !is_valid_hash(hash) {
        return Err(Error::Git(format!(
            "unexpected commit id in header output: {:?}",
            hash
        )));
    }

    Ok(CommitHeader {
        hash: hash.to_string(),
        name: parts[1].to_string(),
        email: parts[2].to_string(),
        committed_at: parse_git_date(parts[3]),
        subject: parts[4].to_string(),
    })
}

/// Parses `git diff-tree -z --numstat` output. Binary files report `-` for
/// both counts and contribute zero lines.
pub(crate) fn parse_numstat(output: &str) -> Result<DiffStats> {
    let mut stats = DiffStats::default();

    for entry in output.split('\0') {
        let entry = entry.trim_start_matches('\n');
        if entry.is_empty() {
            continue;
        }

        let mut fields = entry.splitn(3, '\t');
        let (added, removed, path) = match (fields.next(), fields.next(), fields.next()) {
            (Some(a), Some(r), Some(p)) if !p.is_empty() => (a, r, p),
            _ => return Err(Error::Git(format!("unexpected numstat entry: {:?}", entry))),
        };

        stats.insertions += parse_count(added)?;
        stats.deletions += parse_count(removed)?;
        stats.files.push(path.to_string());
    }

    Ok(stats)
}

fn parse_count(field: &str) -> Result<u64> {
    if field == "-" {
        return Ok(0);
    }
    field
        .parse()
        .map_err(|_| Error::Git(format!("unexpected numstat count: {:?}", field)))
}

fn parse_git_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
