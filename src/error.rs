//! Defines the error types used throughout the crate.
use thiserror::Error;

/// Represents errors that can occur while querying or mutating a repository.
#[derive(Debug, Error)]
pub enum GitError {
    /// The 'git' executable was not found in the system's PATH.
    #[error("'git' command not found. Please ensure Git is installed and that its executable is included in your system's PATH environment variable.")]
    GitNotFound,

    /// Failed to spawn the external process for a reason other than a missing executable.
    #[error("Unable to execute git process")]
    Execution(#[source] std::io::Error),

    /// The stdout of the 'git' process was not valid UTF-8.
    #[error("Unable to decode output from git executable")]
    Undecodable,

    /// The external tool ran but exited with a nonzero status.
    #[error("git failed (exit code {exit_code:?}) with the following stdout: {stdout} stderr: {stderr}")]
    ExternalToolFailure {
        /// `None` when the process was terminated by a signal.
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The string is neither an scp-like nor a URL-style remote.
    #[error("Remote URL is invalid: {0}")]
    InvalidRemoteUrl(String),

    /// A commit was requested while nothing was staged.
    #[error("Nothing is staged; refusing to commit")]
    NothingToCommit,

    /// The background task running an external command panicked or was cancelled.
    #[error("Background git task failed: {0}")]
    TaskFailed(String),
}

impl GitError {
    /// Returns the exit code when this error came from a failed git invocation.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            GitError::ExternalToolFailure { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_failure_message_includes_code_and_stderr() {
        let err = GitError::ExternalToolFailure {
            exit_code: Some(128),
            stdout: String::new(),
            stderr: "fatal: not a git repository".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("Some(128)"), "{}", message);
        assert!(message.contains("fatal: not a git repository"), "{}", message);
        assert_eq!(err.exit_code(), Some(128));
    }

    #[test]
    fn test_signal_termination_has_no_exit_code() {
        let err = GitError::ExternalToolFailure {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(err.to_string().contains("exit code None"));
        assert_eq!(err.exit_code(), None);
        assert_eq!(GitError::NothingToCommit.exit_code(), None);
    }
}
