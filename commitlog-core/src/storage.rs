use crate::config::TrackerConfig;
use crate::error::{Result, ValidationError};
use crate::models::{validate_entry, CommitRecord};
use crate::query::{RecordFilter, SearchCriteria};
use fs2::FileExt;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Append-only JSON Lines log of [`CommitRecord`]s.
///
/// Writers take an exclusive advisory lock around a single `write_all` of a
/// complete line, so concurrent appenders never interleave. Readers never
/// lock; a half-written trailing line is skipped like any other bad line.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    sync_writes: bool,
}

impl RecordStore {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            path: config.log_path.clone(),
            sync_writes: config.sync_writes,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync_writes: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn validate(&self, record: &CommitRecord) -> std::result::Result<(), ValidationError> {
        record.validate()
    }

    pub fn append(&self, record: &CommitRecord) -> Result<()> {
        self.validate(record)?;

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        FileExt::lock_exclusive(&file)?;
        let written = file.write_all(&line).and_then(|_| {
            if self.sync_writes {
                file.sync_data()
            } else {
                Ok(())
            }
        });
        let unlocked = FileExt::unlock(&file);
        written?;
        unlocked?;

        info!(
            "Appended commit {} as record {} to {:?}",
            record.short_hash(),
            record.id,
            self.path
        );
        Ok(())
    }

    /// Valid records in log order, oldest first, at most `limit` of them.
    /// Each call starts again from the top of the file.
    pub fn read_all(&self, limit: Option<usize>) -> Result<Records> {
        Records::open(&self.path, None, limit)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.read_all(None)?.count())
    }

    pub fn search(&self, criteria: &SearchCriteria) -> Result<Records> {
        let filter = criteria.compile()?;
        Records::open(&self.path, Some(filter), criteria.limit)
    }
}

/// Lazy iterator over the valid records of a log file.
#[derive(Debug)]
pub struct Records {
    reader: Option<BufReader<File>>,
    path: PathBuf,
    line_no: usize,
    filter: Option<RecordFilter>,
    remaining: Option<usize>,
}

impl Records {
    fn open(path: &Path, filter: Option<RecordFilter>, limit: Option<usize>) -> Result<Self> {
        let reader = match File::open(path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Record log {:?} does not exist yet", path);
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            reader,
            path: path.to_path_buf(),
            line_no: 0,
            filter,
            remaining: limit,
        })
    }

    fn parse_line(&self, raw: &[u8]) -> Option<CommitRecord> {
        let trimmed = raw.trim_ascii();
        if trimmed.is_empty() {
            return None;
        }

        let parsed = serde_json::from_slice::<Value>(trimmed)
            .map_err(|e| e.to_string())
            .and_then(|entry| {
                validate_entry(&entry).map_err(|e| e.to_string())?;
                serde_json::from_value::<CommitRecord>(entry).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(record) => Some(record),
            Err(reason) => {
                warn!(
                    "Skipping malformed line {} in {:?}: {}",
                    self.line_no, self.path, reason
                );
                None
            }
        }
    }
}

impl Iterator for Records {
    type Item = CommitRecord;

    fn next(&mut self) -> Option<CommitRecord> {
        if self.remaining == Some(0) {
            return None;
        }

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = self.reader.as_mut()?.read_until(b'\n', &mut buf);
            match read {
                Ok(0) => {
                    self.reader = None;
                    return None;
                }
                Ok(_) => {
                    self.line_no += 1;
                    let Some(record) = self.parse_line(&buf) else {
                        continue;
                    };
                    if !self.filter.as_ref().map_or(true, |f| f.matches(&record)) {
                        continue;
                    }
                    if let Some(remaining) = self.remaining.as_mut() {
                        *remaining -= 1;
                    }
                    return Some(record);
                }
                Err(e) => {
                    warn!("Stopped reading {:?} after line {}: {}", self.path, self.line_no, e);
                    self.reader = None;
                    return None;
                }
            }
        }
    }
}
