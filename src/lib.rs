//! Keeps an in-memory model of a Git working tree in sync with the `git`
//! command-line tool.
//!
//! A [`Repository`] is located by walking up from any path inside it. A
//! [`StatusSession`] then owns the published list of changed files for that
//! repository: it refreshes the list from `git status`, and its stage, unstage
//! and commit operations run the matching git command and refresh again.
//!
//! This library requires the `git` executable to be installed and accessible
//! in the system's PATH (or configured through [`SessionConfig`]).
//!
//! # Examples
//!
//! ```no_run
//! use git_status_sync::{Repository, StatusSession};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repository::locate("src/lib.rs").ok_or("not in a repository")?;
//! if let Some(page) = repo.browsable_url() {
//!     println!("Browse at {}", page);
//! }
//!
//! let session = StatusSession::new(repo);
//! let snapshot = session.refresh().await?;
//! for change in &snapshot.changes {
//!     println!("{:>9} {}", change.display_status().label(), change.path());
//! }
//!
//! let staged: Vec<_> = snapshot.staged().cloned().collect();
//! if !staged.is_empty() {
//!     session.commit(&staged, "Update files").await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization of models and (de)serialization of
//!   [`SessionConfig`] using the `serde` crate.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod runner;
pub mod session;
pub mod status;
pub mod types;

// Re-export key types
pub use crate::config::SessionConfig;
pub use crate::error::GitError;
pub use crate::models::{FileChange, FileChangeStatus, SessionState, StatusSnapshot};
pub use crate::repository::Repository;
pub use crate::runner::{CommandOutput, CommandRunner, SystemRunner};
pub use crate::session::StatusSession;
pub use crate::types::{classify, ProviderKind, RemoteClassification, RemoteUrl, Result};

pub mod prelude {
    //! Convenient import for common types.
    pub use crate::config::SessionConfig;
    pub use crate::error::GitError;
    pub use crate::models::*;
    pub use crate::repository::Repository;
    pub use crate::session::StatusSession;
    pub use crate::status::{ParseAnomaly, ParsedStatus};
    pub use crate::types::{classify, ProviderKind, Result};
}
