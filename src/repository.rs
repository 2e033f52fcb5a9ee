//! Locates the repository enclosing a path and describes it.

use crate::config::SessionConfig;
use crate::runner::{execute_git_fn, git_args, CommandRunner, SystemRunner};
use crate::types::{classify, ProviderKind};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A located Git repository.
///
/// Produced fresh by every lookup and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Repository {
    root: PathBuf,
    remote_url: Option<String>,
    provider: ProviderKind,
    browsable_url: Option<String>,
}

impl Repository {
    /// Creates a `Repository` for a known root, classifying `remote_url`.
    ///
    /// This does *not* check that `root` is actually a repository.
    /// Operations will fail later if it's not.
    pub fn new<P: AsRef<Path>>(root: P, remote_url: Option<String>) -> Repository {
        let classification = remote_url.as_deref().map(classify).unwrap_or_default();
        Repository {
            root: PathBuf::from(root.as_ref()),
            provider: classification.provider(remote_url.is_some()),
            browsable_url: classification.browsable_url,
            remote_url,
        }
    }

    /// Finds the repository enclosing `path` using the system `git` and default settings.
    ///
    /// Returns `None` when no ancestor of `path` contains a `.git` entry.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use git_status_sync::Repository;
    ///
    /// if let Some(repo) = Repository::locate("src/lib.rs") {
    ///     println!("root: {}", repo.root().display());
    /// }
    /// ```
    pub fn locate<P: AsRef<Path>>(path: P) -> Option<Repository> {
        Repository::locate_with(&SystemRunner, &SessionConfig::default(), path)
    }

    /// Finds the repository enclosing `path`, reading its remote through `runner`.
    ///
    /// A missing or unreadable remote is not an error; the repository is still
    /// returned with `ProviderKind::None`.
    pub fn locate_with<R, P>(runner: &R, config: &SessionConfig, path: P) -> Option<Repository>
    where
        R: CommandRunner + ?Sized,
        P: AsRef<Path>,
    {
        let root = find_root(path.as_ref(), &config.marker)?;
        let remote_url = read_remote_url(runner, config, &root);
        Some(Repository::new(root, remote_url))
    }

    /// Absolute path of the working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn is_github(&self) -> bool {
        self.provider == ProviderKind::GitHub
    }

    /// Web page of the repository, for GitHub remotes only.
    pub fn browsable_url(&self) -> Option<&str> {
        self.browsable_url.as_deref()
    }
}

/// Walks from `path` (or its directory, for files) up to the filesystem root,
/// returning the first directory that contains `marker`.
///
/// A marker may be a directory or a file (worktrees and submodules use a `.git` file).
pub fn find_root(path: &Path, marker: &str) -> Option<PathBuf> {
    let start = absolute(path)?;
    let start = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start
    };

    start
        .ancestors()
        .find(|dir| dir.join(marker).exists())
        .map(Path::to_path_buf)
}

fn absolute(path: &Path) -> Option<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Some(canonical);
    }
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        env::current_dir().ok().map(|cwd| cwd.join(path))
    }
}

/// Equivalent to `git config --get remote.<name>.url`; `None` when unset or on any failure.
fn read_remote_url<R>(runner: &R, config: &SessionConfig, root: &Path) -> Option<String>
where
    R: CommandRunner + ?Sized,
{
    let key = format!("remote.{}.url", config.remote_name);
    let result = execute_git_fn(
        runner,
        config.program(),
        root,
        &git_args(["config", "--get", key.as_str()]),
        |output| Ok(output.trim().to_owned()),
    );

    match result {
        Ok(url) if !url.is_empty() => Some(url),
        Ok(_) => None,
        Err(e) => {
            debug!(root = %root.display(), error = %e, "no remote url");
            None
        }
    }
}
