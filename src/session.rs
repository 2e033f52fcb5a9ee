//! The status session: one published, always-consistent view of a repository's
//! working tree, plus the operations that change it.
//!
//! Every external command runs on tokio's blocking pool. Results are published
//! through a `watch` channel, so readers always see a whole snapshot.
//!
//! Refreshes are numbered by a generation counter taken before the status query
//! starts. A result is published only if its generation is newer than the one
//! already published; a refresh that finishes after a newer one is dropped.

use crate::config::SessionConfig;
use crate::error::GitError;
use crate::models::{FileChange, SessionState, StatusSnapshot};
use crate::repository::Repository;
use crate::runner::{execute_git, execute_git_fn, git_args, CommandRunner, SystemRunner};
use crate::status::parse_porcelain;
use crate::types::Result;
use chrono::Utc;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, instrument};

/// Owns the published list of changes for one repository.
///
/// # Examples
///
/// ```no_run
/// use git_status_sync::{Repository, StatusSession};
///
/// # async fn run() -> git_status_sync::Result<()> {
/// let repo = Repository::locate(".").expect("not inside a repository");
/// let session = StatusSession::new(repo);
///
/// let snapshot = session.refresh().await?;
/// if let Some(change) = snapshot.changes.first() {
///     session.stage(change).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct StatusSession {
    repository: Repository,
    config: SessionConfig,
    runner: Arc<dyn CommandRunner>,
    issued: AtomicU64,
    in_flight: AtomicUsize,
    published: watch::Sender<Arc<StatusSnapshot>>,
    mutation_lock: Mutex<()>,
}

impl StatusSession {
    /// Creates a session that runs the system `git` with default settings.
    pub fn new(repository: Repository) -> StatusSession {
        StatusSession::with_runner(repository, SessionConfig::default(), Arc::new(SystemRunner))
    }

    /// Creates a session with explicit settings and command runner.
    pub fn with_runner(
        repository: Repository,
        config: SessionConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> StatusSession {
        let (published, _) = watch::channel(Arc::new(StatusSnapshot::empty()));
        StatusSession {
            repository,
            config,
            runner,
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            published,
            mutation_lock: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<StatusSnapshot> {
        self.published.borrow().clone()
    }

    /// A receiver that is notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StatusSnapshot>> {
        self.published.subscribe()
    }

    pub fn state(&self) -> SessionState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            SessionState::Refreshing
        } else {
            SessionState::Idle
        }
    }

    /// Queries `git status` and publishes the result.
    ///
    /// Returns the snapshot that is published once this refresh settles. That is
    /// this refresh's own result unless a newer refresh already published, in
    /// which case the newer snapshot is returned and this result is dropped.
    ///
    /// # Errors
    /// Returns `GitError` if the status command fails; the published snapshot is
    /// left untouched.
    #[instrument(skip(self), fields(root = %self.repository.root().display()))]
    pub async fn refresh(&self) -> Result<Arc<StatusSnapshot>> {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight::enter(&self.in_flight);

        let output = self
            .run_git_fn(git_args(self.config.status_args()), |out| Ok(out.to_owned()))
            .await?;
        let parsed = parse_porcelain(&output);

        let snapshot = Arc::new(StatusSnapshot {
            generation,
            branch: parsed.branch,
            changes: parsed.changes,
            anomalies: parsed.anomalies,
            refreshed_at: Some(Utc::now()),
        });
        let changes = snapshot.changes.len();

        let published = self.published.send_if_modified(|current| {
            if generation > current.generation {
                *current = snapshot;
                true
            } else {
                false
            }
        });

        if published {
            debug!(generation, changes, "published status");
        } else {
            debug!(generation, "discarded superseded status");
        }

        Ok(self.snapshot())
    }

    /// Runs git in the repository root on the blocking pool, handing stdout to `process`.
    async fn run_git_fn<F, T>(&self, args: Vec<OsString>, process: F) -> Result<T>
    where
        F: FnOnce(&str) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run_blocking(move |runner, program, root| {
            execute_git_fn(runner, program, root, &args, process)
        })
        .await
    }

    /// Runs git in the repository root on the blocking pool, discarding stdout.
    async fn run_git(&self, args: Vec<OsString>) -> Result<()> {
        self.run_blocking(move |runner, program, root| execute_git(runner, program, root, &args))
            .await
    }

    async fn run_blocking<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&dyn CommandRunner, &OsStr, &Path) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let runner = Arc::clone(&self.runner);
        let program = self.config.program().to_os_string();
        let root = self.repository.root().to_path_buf();

        tokio::task::spawn_blocking(move || job(runner.as_ref(), program.as_os_str(), root.as_path()))
            .await
            .map_err(|e| GitError::TaskFailed(e.to_string()))?
    }
}

/// Counts a refresh as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> InFlight<'a> {
        counter.fetch_add(1, Ordering::SeqCst);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// --- Mutation Operations ---

impl StatusSession {
    /// Stages a file, then refreshes.
    ///
    /// Equivalent to `git add -A -- <path>`, which also stages deletions. The path
    /// is the one git reported, not the display form.
    ///
    /// # Errors
    /// Returns `GitError` if `git add` or the following refresh fails.
    #[instrument(skip(self, file), fields(path = %file.path()))]
    pub async fn stage(&self, file: &FileChange) -> Result<Arc<StatusSnapshot>> {
        let _lock = self.mutation_lock.lock().await;
        self.run_git(git_args(["add", "-A", "--", file.repo_path()])).await?;
        self.refresh().await
    }

    /// Stages every change in the working tree, then refreshes.
    ///
    /// Equivalent to `git add -A`.
    #[instrument(skip(self))]
    pub async fn stage_all(&self) -> Result<Arc<StatusSnapshot>> {
        let _lock = self.mutation_lock.lock().await;
        self.run_git(git_args(["add", "-A"])).await?;
        self.refresh().await
    }

    /// Removes a file's changes from the index, then refreshes.
    ///
    /// Equivalent to `git reset -q HEAD -- <path>`, or `git rm --cached` when the
    /// branch has no commits yet. Renames unstage both the old and new path.
    ///
    /// # Errors
    /// Returns `GitError` if the unstage command or the following refresh fails.
    #[instrument(skip(self, file), fields(path = %file.path()))]
    pub async fn unstage(&self, file: &FileChange) -> Result<Arc<StatusSnapshot>> {
        let _lock = self.mutation_lock.lock().await;

        let mut paths = vec![file.repo_path()];
        paths.extend(file.original_repo_path());

        let mut args = if self.has_head().await? {
            git_args(["reset", "-q", "HEAD", "--"])
        } else {
            git_args(["rm", "--cached", "-q", "--ignore-unmatch", "--"])
        };
        args.extend(git_args(paths));

        self.run_git(args).await?;
        self.refresh().await
    }

    /// Commits the currently staged content, then refreshes.
    ///
    /// `files` is the caller's view of the changes. `GitError::NothingToCommit` is
    /// returned without running any command when none of them is staged, or when
    /// the published snapshot (once refreshed) has nothing staged. If `files` was
    /// stale and git refuses because the index matches `HEAD`, the failure is
    /// also reported as `NothingToCommit`.
    ///
    /// Equivalent to `git commit -q -m <message>`.
    #[instrument(skip(self, files, message), fields(count = files.len()))]
    pub async fn commit(&self, files: &[FileChange], message: &str) -> Result<Arc<StatusSnapshot>> {
        if !files.iter().any(FileChange::is_staged) {
            return Err(GitError::NothingToCommit);
        }

        let _lock = self.mutation_lock.lock().await;

        let published = self.snapshot();
        if published.generation > 0 && published.staged().next().is_none() {
            return Err(GitError::NothingToCommit);
        }

        match self.run_git(git_args(["commit", "-q", "-m", message])).await {
            Ok(()) => self.refresh().await,
            Err(e @ GitError::ExternalToolFailure { .. }) => {
                if self.index_matches_head().await? {
                    Err(GitError::NothingToCommit)
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Whether nothing is staged. Equivalent to `git diff --cached --quiet`,
    /// which exits 1 when the index differs from `HEAD`.
    async fn index_matches_head(&self) -> Result<bool> {
        match self.run_git(git_args(["diff", "--cached", "--quiet"])).await {
            Ok(()) => Ok(true),
            Err(GitError::ExternalToolFailure { exit_code: Some(1), .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether `HEAD` resolves to a commit.
    async fn has_head(&self) -> Result<bool> {
        match self.run_git(git_args(["rev-parse", "--verify", "-q", "HEAD"])).await {
            Ok(()) => Ok(true),
            Err(GitError::ExternalToolFailure { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
