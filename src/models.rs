//! Provides structured types representing working-tree status.

use crate::status::ParseAnomaly;
use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FILE_CHANGE_ID: AtomicU64 = AtomicU64::new(1);

/// Represents one side (index or worktree) of a file status from `git status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum FileChangeStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
    Staged,
}

impl FileChangeStatus {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            FileChangeStatus::Modified => "Modified",
            FileChangeStatus::Added => "Added",
            FileChangeStatus::Deleted => "Deleted",
            FileChangeStatus::Renamed => "Renamed",
            FileChangeStatus::Untracked => "Untracked",
            FileChangeStatus::Staged => "Staged",
        }
    }

    /// Icon tag a presentation layer can map onto its own image set.
    pub fn icon(&self) -> &'static str {
        match self {
            FileChangeStatus::Modified => "pencil",
            FileChangeStatus::Added => "plus",
            FileChangeStatus::Deleted => "minus",
            FileChangeStatus::Renamed => "arrow.right",
            FileChangeStatus::Untracked => "questionmark",
            FileChangeStatus::Staged => "checkmark",
        }
    }
}

/// Represents a changed file in the working tree.
///
/// Equality and hashing use a process-unique identity assigned at construction,
/// never the path or statuses: two records built independently for the same
/// path are distinct. Clones share the identity of their source.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FileChange {
    id: u64,
    path: String,
    repo_path: String,
    original_path: Option<String>,
    original_repo_path: Option<String>,
    unstaged_status: Option<FileChangeStatus>,
    staged_status: Option<FileChangeStatus>,
}

impl FileChange {
    /// Creates a new record with a fresh identity.
    ///
    /// `path` is kept verbatim for git commands; `path()` returns it with
    /// backslashes turned into forward slashes.
    pub fn new(
        path: &str,
        unstaged_status: Option<FileChangeStatus>,
        staged_status: Option<FileChangeStatus>,
    ) -> FileChange {
        FileChange {
            id: NEXT_FILE_CHANGE_ID.fetch_add(1, Ordering::Relaxed),
            path: display_path(path),
            repo_path: path.to_string(),
            original_path: None,
            original_repo_path: None,
            unstaged_status,
            staged_status,
        }
    }

    /// Records the source path of a rename or copy.
    pub fn with_original_path(mut self, original_path: &str) -> FileChange {
        self.original_path = Some(display_path(original_path));
        self.original_repo_path = Some(original_path.to_string());
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Repository-relative path, always using forward slashes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path exactly as git reported it. Use this as a pathspec.
    pub fn repo_path(&self) -> &str {
        &self.repo_path
    }

    /// For renames and copies, the path the file came from.
    pub fn original_path(&self) -> Option<&str> {
        self.original_path.as_deref()
    }

    /// `original_path` exactly as git reported it.
    pub fn original_repo_path(&self) -> Option<&str> {
        self.original_repo_path.as_deref()
    }

    pub fn unstaged_status(&self) -> Option<FileChangeStatus> {
        self.unstaged_status
    }

    pub fn staged_status(&self) -> Option<FileChangeStatus> {
        self.staged_status
    }

    pub fn is_staged(&self) -> bool {
        self.staged_status.is_some()
    }

    /// The status a list view shows: the worktree status when there is one,
    /// otherwise `Staged`.
    pub fn display_status(&self) -> FileChangeStatus {
        self.unstaged_status.unwrap_or(FileChangeStatus::Staged)
    }
}

impl PartialEq for FileChange {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FileChange {}

impl Hash for FileChange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Normalizes a path for display: every backslash becomes a forward slash.
pub fn display_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Whether a session is currently waiting on a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum SessionState {
    Idle,
    Refreshing,
}

/// One published view of the working tree.
///
/// Snapshots are immutable; every successful refresh replaces the whole snapshot.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StatusSnapshot {
    /// Generation of the refresh that produced this snapshot (0 before the first refresh).
    pub generation: u64,
    /// The current branch, if on one.
    pub branch: Option<String>,
    /// Changed files in the order `git status` reported them.
    pub changes: Vec<FileChange>,
    /// Lines that were skipped while parsing.
    pub anomalies: Vec<ParseAnomaly>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl StatusSnapshot {
    /// The snapshot a session publishes before its first refresh.
    pub fn empty() -> StatusSnapshot {
        StatusSnapshot {
            generation: 0,
            branch: None,
            changes: Vec::new(),
            anomalies: Vec::new(),
            refreshed_at: None,
        }
    }

    /// True when nothing is changed, staged or untracked.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn staged(&self) -> impl Iterator<Item = &FileChange> {
        self.changes.iter().filter(|change| change.is_staged())
    }

    pub fn unstaged(&self) -> impl Iterator<Item = &FileChange> {
        self.changes
            .iter()
            .filter(|change| change.unstaged_status.is_some())
    }

    /// Finds the record for a path; `path` may use either separator.
    pub fn find(&self, path: &str) -> Option<&FileChange> {
        let path = display_path(path);
        self.changes.iter().find(|change| change.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_equality() {
        let a = FileChange::new("src/lib.rs", Some(FileChangeStatus::Modified), None);
        let b = FileChange::new("src/lib.rs", Some(FileChangeStatus::Modified), None);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let mut set = HashSet::new();
        assert!(set.insert(a.clone()));
        assert!(set.insert(b));
        assert!(!set.insert(a));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display_path_uses_forward_slashes() {
        assert_eq!(display_path("a\\b\\c.txt"), "a/b/c.txt");
        assert_eq!(display_path("a/b/c.txt"), "a/b/c.txt");
        let change = FileChange::new("dir\\file.txt", None, None).with_original_path("old\\file.txt");
        assert_eq!(change.path(), "dir/file.txt");
        assert_eq!(change.repo_path(), "dir\\file.txt");
        assert_eq!(change.original_path(), Some("old/file.txt"));
        assert_eq!(change.original_repo_path(), Some("old\\file.txt"));
    }

    #[test]
    fn test_is_staged_and_display_status() {
        let untracked = FileChange::new("new.txt", Some(FileChangeStatus::Untracked), None);
        assert!(!untracked.is_staged());
        assert_eq!(untracked.display_status(), FileChangeStatus::Untracked);

        let staged = FileChange::new("added.txt", None, Some(FileChangeStatus::Added));
        assert!(staged.is_staged());
        assert_eq!(staged.display_status(), FileChangeStatus::Staged);
    }

    #[test]
    fn test_snapshot_helpers() {
        let snapshot = StatusSnapshot {
            generation: 3,
            branch: Some("main".to_string()),
            changes: vec![
                FileChange::new("a.txt", Some(FileChangeStatus::Modified), Some(FileChangeStatus::Added)),
                FileChange::new("b.txt", None, Some(FileChangeStatus::Deleted)),
                FileChange::new("c\\d.txt", Some(FileChangeStatus::Untracked), None),
            ],
            anomalies: Vec::new(),
            refreshed_at: Some(Utc::now()),
        };

        assert!(!snapshot.is_clean());
        assert_eq!(snapshot.staged().count(), 2);
        assert_eq!(snapshot.unstaged().count(), 2);
        assert!(snapshot.find("c\\d.txt").is_some());
        assert!(snapshot.find("missing.txt").is_none());
        assert!(StatusSnapshot::empty().is_clean());
    }

    #[test]
    fn test_labels_and_icons_are_distinct() {
        let all = [
            FileChangeStatus::Modified,
            FileChangeStatus::Added,
            FileChangeStatus::Deleted,
            FileChangeStatus::Renamed,
            FileChangeStatus::Untracked,
            FileChangeStatus::Staged,
        ];
        let labels: HashSet<_> = all.iter().map(|s| s.label()).collect();
        let icons: HashSet<_> = all.iter().map(|s| s.icon()).collect();
        assert_eq!(labels.len(), all.len());
        assert_eq!(icons.len(), all.len());
    }
}
