//! External command invocation.
//!
//! Widgets that shell out (joining a wifi network, sampling memory usage)
//! go through a [`CommandRunner`], so tests can substitute canned output.
//! [`SystemRunner`] runs the real process on a worker thread and hands the
//! result back to the event loop through a oneshot channel; the loop never
//! blocks on a child process.
//!
//! # Failure Modes
//!
//! - **Spawn failure** (program missing, permission denied):
//!   [`CommandError::Spawn`].
//! - **Non-zero exit**: [`CommandError::Failed`] with trimmed stderr.
//! - **Output is not UTF-8**: [`CommandError::NonUtf8`].
//! - **Context cancelled** before the process started, or the worker
//!   vanished: [`CommandError::Cancelled`].

use std::process::Command;
use std::rc::Rc;
use std::thread;

use futures_channel::oneshot;
use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};
use ricebar_core::cx::Cx;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command line")]
    Empty,
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with status {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("{program} produced non-UTF-8 output")]
    NonUtf8 { program: String },
    #[error("command cancelled")]
    Cancelled,
}

/// Runs an external command and yields its standard output.
pub trait CommandRunner {
    fn run(&self, argv: &[String]) -> LocalBoxFuture<'static, Result<String, CommandError>>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for Rc<R> {
    fn run(&self, argv: &[String]) -> LocalBoxFuture<'static, Result<String, CommandError>> {
        (**self).run(argv)
    }
}

/// Runs commands as real child processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    cx: Cx,
}

impl SystemRunner {
    /// Commands are refused once `cx` is cancelled.
    #[must_use]
    pub fn new(cx: Cx) -> Self {
        Self { cx }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> LocalBoxFuture<'static, Result<String, CommandError>> {
        let Some((program, args)) = argv.split_first() else {
            return future::ready(Err(CommandError::Empty)).boxed_local();
        };
        if self.cx.is_cancelled() {
            return future::ready(Err(CommandError::Cancelled)).boxed_local();
        }
        let program = program.clone();
        let args = args.to_vec();
        let cx = self.cx.clone();
        let (tx, rx) = oneshot::channel();

        debug!(program = %program, args = args.len(), "running command");
        let spawned = thread::Builder::new()
            .name("ricebar-command".into())
            .spawn(move || {
                let result = if cx.is_cancelled() {
                    Err(CommandError::Cancelled)
                } else {
                    run_blocking(&program, &args)
                };
                // The receiver is gone if the caller stopped waiting.
                let _ = tx.send(result);
            });
        if let Err(source) = spawned {
            warn!(error = %source, "failed to spawn command worker thread");
            return future::ready(Err(CommandError::Spawn {
                program: argv[0].clone(),
                source,
            }))
            .boxed_local();
        }

        async move { rx.await.unwrap_or(Err(CommandError::Cancelled)) }.boxed_local()
    }
}

fn run_blocking(program: &str, args: &[String]) -> Result<String, CommandError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    String::from_utf8(output.stdout).map_err(|_| CommandError::NonUtf8 {
        program: program.to_string(),
    })
}

/// Split a configured command line into argv, appending `extra`.
#[must_use]
pub fn argv_with(base: &[String], extra: &[&str]) -> Vec<String> {
    base.iter()
        .cloned()
        .chain(extra.iter().map(|s| (*s).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_executor::block_on;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_argv_is_rejected() {
        let (cx, _ctrl) = Cx::background();
        let result = block_on(SystemRunner::new(cx).run(&[]));
        assert!(matches!(result, Err(CommandError::Empty)));
    }

    #[test]
    fn cancelled_context_refuses_to_run() {
        let (cx, ctrl) = Cx::background();
        ctrl.cancel();
        let result = block_on(SystemRunner::new(cx).run(&argv(&["true"])));
        assert!(matches!(result, Err(CommandError::Cancelled)));
    }

    #[test]
    fn cancelling_the_root_stops_a_child_runner() {
        let (root, ctrl) = Cx::background();
        let (commands, _commands_ctrl) = root.child();
        let runner = SystemRunner::new(commands);
        ctrl.cancel();
        let result = block_on(runner.run(&argv(&["true"])));
        assert!(matches!(result, Err(CommandError::Cancelled)));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let (cx, _ctrl) = Cx::background();
        let result = block_on(
            SystemRunner::new(cx).run(&argv(&["ricebar-definitely-not-a-real-program"])),
        );
        assert!(matches!(result, Err(CommandError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout() {
        let (cx, _ctrl) = Cx::background();
        let result = block_on(SystemRunner::new(cx).run(&argv(&["echo", "hello"])));
        assert_eq!(result.unwrap().trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure() {
        let (cx, _ctrl) = Cx::background();
        let result = block_on(SystemRunner::new(cx).run(&argv(&["false"])));
        assert!(matches!(result, Err(CommandError::Failed { code: Some(1), .. })));
    }

    #[test]
    fn argv_with_appends() {
        let base = argv(&["nmcli", "d", "wifi", "connect"]);
        assert_eq!(
            argv_with(&base, &["aa:bb"]),
            argv(&["nmcli", "d", "wifi", "connect", "aa:bb"])
        );
    }
}
