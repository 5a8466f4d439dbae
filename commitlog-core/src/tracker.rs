use crate::config::TrackerConfig;
use crate::error::Result;
use crate::inspector::Inspector;
use crate::models::CommitRecord;
use crate::storage::RecordStore;
use crate::vcs::{Selector, VcsBackend};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Phases of one tracking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Idle,
    Resolving,
    Extracting,
    Persisting,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCommit {
    pub commit_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackOutcome {
    /// Every selected commit was written.
    Complete,
    /// Some commits were written, some skipped.
    Partial,
    /// Commits were selected but none were written.
    Failed,
    /// The selector matched nothing.
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackReport {
    pub written: Vec<CommitRecord>,
    pub skipped: Vec<SkippedCommit>,
}

impl TrackReport {
    pub fn outcome(&self) -> TrackOutcome {
        match (self.written.is_empty(), self.skipped.is_empty()) {
            (true, true) => TrackOutcome::Empty,
            (false, true) => TrackOutcome::Complete,
            (false, false) => TrackOutcome::Partial,
            (true, false) => TrackOutcome::Failed,
        }
    }

    fn skip(&mut self, commit_id: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Skipping commit {}: {}", commit_id, reason);
        self.skipped.push(SkippedCommit {
            commit_id: commit_id.to_string(),
            reason,
        });
    }
}

/// Stops a running [`Tracker::track`] before its next commit.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives the inspector and the store for one repository.
///
/// Every run appends new records: tracking a commit twice yields two
/// records with distinct ids.
pub struct Tracker<B: VcsBackend> {
    inspector: Inspector<B>,
    store: RecordStore,
    max_commits: usize,
    cancel: CancelHandle,
}

impl<B: VcsBackend> Tracker<B> {
    pub fn new(inspector: Inspector<B>, store: RecordStore, config: &TrackerConfig) -> Self {
        Self {
            inspector,
            store,
            max_commits: config.max_commits_per_run,
            cancel: CancelHandle::default(),
        }
    }

    pub fn inspector(&self) -> &Inspector<B> {
        &self.inspector
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Tracks the commits `selector` picks in the repository at `path`.
    ///
    /// Fails only when the repository or the selector is unusable. Problems
    /// with individual commits end up in [`TrackReport::skipped`].
    pub fn track(&self, path: &Path, selector: &Selector) -> Result<TrackReport> {
        let mut state = TrackState::Idle;
        self.transition(&mut state, TrackState::Resolving);

        let commits = match self.inspector.resolve_commits(path, selector) {
            Ok(commits) => commits,
            Err(e) => {
                self.transition(&mut state, TrackState::Failed);
                return Err(e);
            }
        };

        let mut report = TrackReport::default();
        let (selected, overflow) = commits.split_at(commits.len().min(self.max_commits));

        for commit_id in selected {
            if self.cancel.is_cancelled() {
                report.skip(commit_id, "cancelled");
                continue;
            }

            self.transition(&mut state, TrackState::Extracting);
            let draft = match self.inspector.extract_metadata(path, commit_id) {
                Ok(draft) => draft,
                Err(e) => {
                    report.skip(commit_id, e.to_string());
                    continue;
                }
            };

            self.transition(&mut state, TrackState::Persisting);
            let record = CommitRecord::from_draft(draft);
            match self.store.append(&record) {
                Ok(()) => report.written.push(record),
                Err(e) => report.skip(commit_id, e.to_string()),
            }
        }

        for commit_id in overflow {
            report.skip(
                commit_id,
                format!("exceeds max_commits_per_run ({})", self.max_commits),
            );
        }

        self.transition(&mut state, TrackState::Done);
        info!(
            "Tracked {} commit(s), skipped {} ({:?})",
            report.written.len(),
            report.skipped.len(),
            report.outcome()
        );
        Ok(report)
    }

    fn transition(&self, state: &mut TrackState, next: TrackState) {
        if *state != next {
            debug!("Tracking state {:?} -> {:?}", state, next);
            *state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::inspector::fake::{hash, two_commit_repo, FakeBackend};
    use tempfile::TempDir;

    fn tracker_with(backend: FakeBackend, temp_dir: &TempDir) -> Tracker<FakeBackend> {
        let config = TrackerConfig::default().with_log_path(temp_dir.path().join("commits.jsonl"));
        Tracker::new(Inspector::new(backend), RecordStore::new(&config), &config)
    }

    #[test]
    fn test_latest_writes_head_commit() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = tracker_with(two_commit_repo(), &temp_dir);

        let report = tracker.track(Path::new("/repo"), &Selector::Latest).unwrap();

        assert_eq!(report.outcome(), TrackOutcome::Complete);
        assert_eq!(report.written.len(), 1);
        assert_eq!(report.written[0].commit_hash, hash('2'));
        assert_eq!((report.written[0].insertions, report.written[0].deletions), (3, 0));

        let stored: Vec<_> = tracker.store().read_all(None).unwrap().collect();
        assert_eq!(stored, report.written);
    }

    #[test]
    fn test_range_writes_in_chronological_order() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = tracker_with(two_commit_repo(), &temp_dir);

        let report = tracker
            .track(Path::new("/repo"), &Selector::range(None, None))
            .unwrap();

        let hashes: Vec<_> = tracker
            .store()
            .read_all(None)
            .unwrap()
            .map(|r| r.commit_hash)
            .collect();
        assert_eq!(hashes, vec![hash('1'), hash('2')]);
        assert_eq!(report.written[0].insertions, 10);
        assert_eq!(report.written[0].deletions, 2);
        assert_eq!(tracker.store().count().unwrap(), 2);
    }

    #[test]
    fn test_invalid_hash_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = tracker_with(two_commit_repo(), &temp_dir);

        let result = tracker.track(Path::new("/repo"), &Selector::Hash("abc123".to_string()));

        assert!(matches!(result, Err(Error::InvalidHash(_))));
        assert_eq!(tracker.store().count().unwrap(), 0);
        assert_eq!(tracker.inspector().backend().extract_calls.get(), 0);
    }

    #[test]
    fn test_missing_repository_fails_whole_batch() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = tracker_with(two_commit_repo(), &temp_dir);

        let result = tracker.track(Path::new("/not-a-repo"), &Selector::Latest);
        assert!(matches!(result, Err(Error::RepoNotFound(_))));
    }

    #[test]
    fn test_partial_batch_keeps_going() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = two_commit_repo();
        backend.broken.push(hash('1'));
        let tracker = tracker_with(backend, &temp_dir);

        let report = tracker
            .track(Path::new("/repo"), &Selector::range(None, None))
            .unwrap();

        assert_eq!(report.outcome(), TrackOutcome::Partial);
        assert_eq!(report.written.len(), 1);
        assert_eq!(report.written[0].commit_hash, hash('2'));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].commit_id, hash('1'));
        assert!(report.skipped[0].reason.contains("cannot read"));
    }

    #[test]
    fn test_unknown_hash_is_skipped_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = tracker_with(two_commit_repo(), &temp_dir);

        let report = tracker
            .track(Path::new("/repo"), &Selector::Hash(hash('f')))
            .unwrap();

        assert_eq!(report.outcome(), TrackOutcome::Failed);
        assert!(report.skipped[0].reason.contains("Commit not found"));
        assert_eq!(tracker.store().count().unwrap(), 0);
    }

    #[test]
    fn test_retracking_appends_new_event() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = tracker_with(two_commit_repo(), &temp_dir);

        let first = tracker.track(Path::new("/repo"), &Selector::Latest).unwrap();
        let second = tracker
            .track(Path::new("/repo"), &Selector::Hash(hash('2').to_uppercase()))
            .unwrap();

        assert_ne!(first.written[0].id, second.written[0].id);
        assert_eq!(first.written[0].commit_hash, second.written[0].commit_hash);
        assert_eq!(tracker.store().count().unwrap(), 2);
    }

    #[test]
    fn test_batch_cap_skips_overflow() {
        let temp_dir = TempDir::new().unwrap();
        let config = TrackerConfig {
            log_path: temp_dir.path().join("commits.jsonl"),
            max_commits_per_run: 1,
            ..TrackerConfig::default()
        };
        let tracker = Tracker::new(
            Inspector::new(two_commit_repo()),
            RecordStore::new(&config),
            &config,
        );

        let report = tracker
            .track(Path::new("/repo"), &Selector::range(None, None))
            .unwrap();

        assert_eq!(report.written.len(), 1);
        assert_eq!(report.written[0].commit_hash, hash('1'));
        assert_eq!(report.skipped[0].commit_id, hash('2'));
        assert!(report.skipped[0].reason.contains("max_commits_per_run"));
    }

    #[test]
    fn test_cancelled_run_skips_remaining() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = tracker_with(two_commit_repo(), &temp_dir);

        tracker.cancel_handle().cancel();
        let report = tracker
            .track(Path::new("/repo"), &Selector::range(None, None))
            .unwrap();

        assert!(report.written.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().all(|s| s.reason == "cancelled"));
        assert_eq!(tracker.inspector().backend().extract_calls.get(), 0);
    }

    #[test]
    fn test_empty_range() {
        let temp_dir = TempDir::new().unwrap();
        let tracker = tracker_with(two_commit_repo(), &temp_dir);
        let future = chrono::Utc::now() + chrono::Duration::days(1);

        let report = tracker
            .track(Path::new("/repo"), &Selector::range(Some(future), None))
            .unwrap();
        assert_eq!(report.outcome(), TrackOutcome::Empty);
    }
}
