//! The process-spawning capability and the helpers that turn its output into `Result`s.
//!
//! Arguments are always passed as a vector; nothing is ever handed to a shell.

use crate::error::GitError;
use crate::types::Result;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;
use std::process::Command;
use std::str;
use tracing::{debug, warn};

/// Raw result of running an external program.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a program with an argument vector in a working directory.
///
/// Implementations must not interpret arguments through a shell.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &OsStr, args: &[OsString], cwd: &Path) -> io::Result<CommandOutput>;
}

/// Runs commands with `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &OsStr, args: &[OsString], cwd: &Path) -> io::Result<CommandOutput> {
        let output = Command::new(program).current_dir(cwd).args(args).output()?;
        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }
}

/// Executes a Git command, discarding successful output.
pub(crate) fn execute_git<R>(runner: &R, program: &OsStr, cwd: &Path, args: &[OsString]) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    execute_git_fn(runner, program, cwd, args, |_| Ok(()))
}

/// Executes a Git command and processes its stdout on success using a closure.
/// A nonzero exit becomes `GitError::ExternalToolFailure` with the captured output.
pub(crate) fn execute_git_fn<R, F, T>(
    runner: &R,
    program: &OsStr,
    cwd: &Path,
    args: &[OsString],
    process: F,
) -> Result<T>
where
    R: CommandRunner + ?Sized,
    F: FnOnce(&str) -> Result<T>,
{
    debug!(?program, ?args, cwd = %cwd.display(), "running git");

    let output = runner.run(program, args, cwd).map_err(|e| {
        warn!(?program, error = %e, "failed to spawn git");
        if e.kind() == io::ErrorKind::NotFound {
            GitError::GitNotFound
        } else {
            GitError::Execution(e)
        }
    })?;

    if output.success() {
        match str::from_utf8(&output.stdout) {
            Ok(stdout_str) => process(stdout_str),
            Err(_) => Err(GitError::Undecodable),
        }
    } else {
        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_owned();
        debug!(exit_code = ?output.exit_code, %stderr, "git exited unsuccessfully");
        Err(GitError::ExternalToolFailure {
            exit_code: output.exit_code,
            stdout,
            stderr,
        })
    }
}

/// Builds an owned argument vector.
pub(crate) fn git_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    args.into_iter().map(|arg| arg.as_ref().to_os_string()).collect()
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted runner for exercising sessions without a real `git`.

    use super::*;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::mpsc::Receiver;
    use std::sync::Mutex;

    /// One canned reply; `gate` blocks the call until something is sent on it.
    pub struct Reply {
        pub output: io::Result<CommandOutput>,
        pub gate: Option<Mutex<Receiver<()>>>,
    }

    impl Reply {
        pub fn ok(stdout: &str) -> Reply {
            Reply {
                output: Ok(CommandOutput {
                    stdout: stdout.as_bytes().to_vec(),
                    stderr: Vec::new(),
                    exit_code: Some(0),
                }),
                gate: None,
            }
        }

        pub fn fail(exit_code: i32, stderr: &str) -> Reply {
            Reply {
                output: Ok(CommandOutput {
                    stdout: Vec::new(),
                    stderr: stderr.as_bytes().to_vec(),
                    exit_code: Some(exit_code),
                }),
                gate: None,
            }
        }

        pub fn gated(mut self, gate: Receiver<()>) -> Reply {
            self.gate = Some(Mutex::new(gate));
            self
        }
    }

    /// Records every invocation and answers from a queue of replies.
    #[derive(Default)]
    pub struct ScriptedRunner {
        replies: Mutex<VecDeque<Reply>>,
        calls: Mutex<Vec<(Vec<String>, PathBuf)>>,
    }

    impl ScriptedRunner {
        pub fn push(&self, reply: Reply) {
            self.replies.lock().unwrap().push_back(reply);
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().iter().map(|(args, _)| args.clone()).collect()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, _program: &OsStr, args: &[OsString], cwd: &Path) -> io::Result<CommandOutput> {
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Reply::ok(""));
            let args = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
            self.calls.lock().unwrap().push((args, cwd.to_path_buf()));

            if let Some(gate) = reply.gate {
                let _ = gate.lock().unwrap().recv();
            }
            reply.output
        }
    }
}
