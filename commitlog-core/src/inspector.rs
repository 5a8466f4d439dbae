use crate::error::{Error, Result};
use crate::models::CommitDraft;
use crate::vcs::{Selector, VcsBackend};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Turns a repository path plus selector into commit drafts.
pub struct Inspector<B: VcsBackend> {
    backend: B,
}

impl<B: VcsBackend> Inspector<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn detect_repository(&self, path: &Path) -> bool {
        self.backend.find_root(path).is_some()
    }

    /// Repository root for `path`, or [`Error::RepoNotFound`].
    pub fn locate(&self, path: &Path) -> Result<PathBuf> {
        self.backend
            .find_root(path)
            .ok_or_else(|| Error::RepoNotFound(path.to_path_buf()))
    }

    /// Commit ids picked by `selector`. Date ranges are ordered oldest first.
    pub fn resolve_commits(&self, path: &Path, selector: &Selector) -> Result<Vec<String>> {
        let root = self.locate(path)?;
        let selector = selector.normalized()?;
        let commits = self.backend.resolve(&root, &selector)?;
        debug!("Resolved {:?} to {} commit(s) in {:?}", selector, commits.len(), root);
        Ok(commits)
    }

    pub fn extract_metadata(&self, path: &Path, commit_id: &str) -> Result<CommitDraft> {
        let root = self.locate(path)?;
        let draft = self.backend.extract(&root, commit_id)?;
        info!(
            "Extracted commit {} ({} file(s), +{} -{})",
            draft.commit_hash.get(..8).unwrap_or(&draft.commit_hash),
            draft.changed_files.len(),
            draft.insertions,
            draft.deletions
        );
        Ok(draft)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{hash, two_commit_repo};
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_detect_repository() {
        let inspector = Inspector::new(two_commit_repo());

        assert!(inspector.detect_repository(Path::new("/repo")));
        assert!(inspector.detect_repository(Path::new("/repo/src")));
        assert!(!inspector.detect_repository(Path::new("/elsewhere")));
        assert!(matches!(
            inspector.locate(Path::new("/elsewhere")),
            Err(Error::RepoNotFound(p)) if p == Path::new("/elsewhere")
        ));
    }

    #[test]
    fn test_resolve_latest_and_range() {
        let inspector = Inspector::new(two_commit_repo());
        let repo = Path::new("/repo");

        assert_eq!(
            inspector.resolve_commits(repo, &Selector::Latest).unwrap(),
            vec![hash('2')]
        );
        assert_eq!(
            inspector
                .resolve_commits(repo, &Selector::range(None, None))
                .unwrap(),
            vec![hash('1'), hash('2')]
        );

        let day_one = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        assert_eq!(
            inspector
                .resolve_commits(repo, &Selector::range(Some(day_one), Some(day_one)))
                .unwrap(),
            vec![hash('1')]
        );
    }

    #[test]
    fn test_resolve_rejects_bad_selectors() {
        let inspector = Inspector::new(two_commit_repo());
        let repo = Path::new("/repo");

        assert!(matches!(
            inspector.resolve_commits(repo, &Selector::Hash("abc123".to_string())),
            Err(Error::InvalidHash(_))
        ));

        let since = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            inspector.resolve_commits(repo, &Selector::range(Some(since), Some(until))),
            Err(Error::InvalidRange { .. })
        ));

        assert!(matches!(
            inspector.resolve_commits(Path::new("/other"), &Selector::Latest),
            Err(Error::RepoNotFound(_))
        ));
    }

    #[test]
    fn test_extract_metadata() {
        let inspector = Inspector::new(two_commit_repo());

        let draft = inspector
            .extract_metadata(Path::new("/repo/src"), &hash('1'))
            .unwrap();
        assert_eq!(draft.commit_hash, hash('1'));
        assert_eq!(draft.repository_path, PathBuf::from("/repo"));
        assert_eq!((draft.insertions, draft.deletions), (10, 2));

        assert!(matches!(
            inspector.extract_metadata(Path::new("/repo"), &hash('9')),
            Err(Error::CommitNotFound(_))
        ));
    }
}
