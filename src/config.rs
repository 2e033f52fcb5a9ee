//! Settings shared by repository lookup and status sessions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;

/// How to find and talk to a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Program used for every git invocation.
    pub git_program: String,
    /// Remote whose URL is read when a repository is located.
    pub remote_name: String,
    /// Name of the entry that marks a repository root.
    pub marker: String,
    /// Whether status lists untracked files (individually, not collapsed to directories).
    pub untracked_files: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            git_program: "git".to_string(),
            remote_name: "origin".to_string(),
            marker: ".git".to_string(),
            untracked_files: true,
        }
    }
}

impl SessionConfig {
    pub fn with_git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = program.into();
        self
    }

    pub fn with_remote_name(mut self, remote: impl Into<String>) -> Self {
        self.remote_name = remote.into();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_untracked_files(mut self, untracked_files: bool) -> Self {
        self.untracked_files = untracked_files;
        self
    }

    pub(crate) fn program(&self) -> &OsStr {
        OsStr::new(&self.git_program)
    }

    /// Arguments for the machine-readable status query.
    pub(crate) fn status_args(&self) -> [&'static str; 4] {
        let untracked = if self.untracked_files {
            "--untracked-files=all"
        } else {
            "--untracked-files=no"
        };
        ["status", "--porcelain=v1", "--branch", untracked]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.git_program, "git");
        assert_eq!(config.remote_name, "origin");
        assert_eq!(config.marker, ".git");
        assert!(config.status_args().contains(&"--untracked-files=all"));
    }

    #[test]
    fn test_builder_methods() {
        let config = SessionConfig::default()
            .with_git_program("/usr/local/bin/git")
            .with_remote_name("upstream")
            .with_marker(".hg")
            .with_untracked_files(false);
        assert_eq!(config.program(), OsStr::new("/usr/local/bin/git"));
        assert_eq!(config.remote_name, "upstream");
        assert_eq!(config.marker, ".hg");
        assert_eq!(
            config.status_args(),
            ["status", "--porcelain=v1", "--branch", "--untracked-files=no"]
        );
    }
}
