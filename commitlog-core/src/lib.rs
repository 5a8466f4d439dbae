//! # commitlog-core
//!
//! Core library for commitlog - tracks git commits into an append-only
//! JSON Lines record log.
//!
//! The pipeline is [`Inspector`] (reads commits through a [`VcsBackend`]),
//! [`RecordStore`] (validates, appends and queries the log) and
//! [`Tracker`], which runs one over the other.

pub mod config;
pub mod error;
pub mod inspector;
pub mod models;
pub mod query;
pub mod storage;
pub mod tracker;
pub mod vcs;

pub use config::TrackerConfig;
pub use error::{Error, Result, ValidationError};
pub use inspector::Inspector;
pub use models::{CommitDraft, CommitRecord};
pub use query::SearchCriteria;
pub use storage::{RecordStore, Records};
pub use tracker::{CancelHandle, SkippedCommit, TrackOutcome, TrackReport, Tracker};
pub use vcs::{GitCli, RepositoryInfo, Selector, VcsBackend};
