//! Child process lifecycle.
//!
//! Wraps spawning, blocking waits and short polling waits behind one small
//! surface so the pool never touches `std::process` directly. Redirections
//! accept a filesystem path or the platform null device; the opened files
//! are handed to the child and released on every exit path by ownership.

use crate::command::Cmd;
use crate::ui;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

/// One redirection target for a standard stream.
#[derive(Debug, Default, Clone)]
pub enum Redirect {
    /// Inherit the orchestrator's stream.
    #[default]
    Inherit,
    /// Discard (`/dev/null` / `nul`).
    Null,
    /// Read from / write to the file at this path.
    Path(PathBuf),
}

impl Redirect {
    /// Builds a redirect from a user-supplied path, mapping the platform
    /// null-device names onto [`Redirect::Null`].
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if is_null_device(&path) {
            Redirect::Null
        } else {
            Redirect::Path(path)
        }
    }
}

fn is_null_device(path: &Path) -> bool {
    match path.to_str() {
        Some(s) => s.eq_ignore_ascii_case("nul") || s == "/dev/null",
        None => false,
    }
}

#[derive(Debug, Default, Clone)]
pub struct Redirections {
    pub stdin: Redirect,
    pub stdout: Redirect,
    pub stderr: Redirect,
}

/// A spawned child process. Identifies exactly one OS process; waiting on it
/// consumes its exit status.
#[derive(Debug)]
pub struct ProcHandle {
    child: Child,
    program: String,
}

/// Result of a polling wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// Still running after the timeout.
    Pending,
    /// Terminated; `true` means a zero exit code.
    Done(bool),
}

#[cfg(windows)]
fn os_command(cmd: &Cmd) -> std::process::Command {
    use std::os::windows::process::CommandExt;
    // CreateProcess takes a single command line; build it with our own
    // quoting so arguments with quotes and backslashes survive the child's
    // argv parsing.
    let argv = cmd.argv();
    let mut pc = std::process::Command::new(&argv[0]);
    if argv.len() > 1 {
        pc.raw_arg(crate::command::quote_cmdline(&argv[1..]));
    }
    pc
}

#[cfg(not(windows))]
fn os_command(cmd: &Cmd) -> std::process::Command {
    let argv = cmd.argv();
    let mut pc = std::process::Command::new(&argv[0]);
    pc.args(&argv[1..]);
    pc
}

fn stdio_for_read(redirect: &Redirect) -> Result<Stdio> {
    match redirect {
        Redirect::Inherit => Ok(Stdio::inherit()),
        Redirect::Null => Ok(Stdio::null()),
        Redirect::Path(path) => {
            let file = File::open(path)
                .with_context(|| format!("could not open {} for reading", path.display()))?;
            Ok(Stdio::from(file))
        }
    }
}

fn stdio_for_write(redirect: &Redirect) -> Result<Stdio> {
    match redirect {
        Redirect::Inherit => Ok(Stdio::inherit()),
        Redirect::Null => Ok(Stdio::null()),
        Redirect::Path(path) => {
            let file = File::create(path)
                .with_context(|| format!("could not open {} for writing", path.display()))?;
            Ok(Stdio::from(file))
        }
    }
}

/// Starts a child process for `cmd` with the environment and working
/// directory of the orchestrator. Spawning an empty command is an error; a
/// failed spawn is logged and propagated without retry.
pub fn spawn(cmd: &Cmd, redirections: &Redirections) -> Result<ProcHandle> {
    let Some(program) = cmd.program() else {
        ui::error("cannot spawn an empty command");
        bail!("empty command");
    };
    ui::info(&format!("CMD: {}", cmd.render()));

    let mut pc = os_command(cmd);
    pc.stdin(stdio_for_read(&redirections.stdin)?);
    pc.stdout(stdio_for_write(&redirections.stdout)?);
    pc.stderr(stdio_for_write(&redirections.stderr)?);

    match pc.spawn() {
        Ok(child) => Ok(ProcHandle {
            child,
            program: program.to_string(),
        }),
        Err(e) => {
            ui::error(&format!("could not start `{}`: {}", program, e));
            Err(e).with_context(|| format!("could not start `{}`", program))
        }
    }
}

fn report_status(program: &str, status: ExitStatus) -> bool {
    if status.success() {
        return true;
    }
    match status.code() {
        Some(code) => ui::error(&format!("`{}` exited with code {}", program, code)),
        None => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                if let Some(signal) = status.signal() {
                    ui::error(&format!("`{}` was terminated by signal {}", program, signal));
                    return false;
                }
            }
            ui::error(&format!("`{}` was terminated abnormally", program));
        }
    }
    false
}

/// Blocks until the process exits. Returns `true` only for a zero exit code;
/// nonzero exits and signal terminations are logged and reported as `false`.
pub fn wait(handle: &mut ProcHandle) -> Result<bool> {
    let status = handle
        .child
        .wait()
        .with_context(|| format!("could not wait on `{}`", handle.program))?;
    Ok(report_status(&handle.program, status))
}

/// Non-blocking wait used for admission control: checks whether the process
/// has exited and otherwise sleeps for `timeout` before reporting
/// [`Poll::Pending`].
pub fn wait_timeout(handle: &mut ProcHandle, timeout: Duration) -> Result<Poll> {
    let polled = handle
        .child
        .try_wait()
        .with_context(|| format!("could not wait on `{}`", handle.program))?;
    match polled {
        Some(status) => Ok(Poll::Done(report_status(&handle.program, status))),
        None => {
            thread::sleep(timeout);
            Ok(Poll::Pending)
        }
    }
}

/// Spawns `cmd` and blocks until it exits, clearing the command buffer on
/// every exit path so the caller can reuse it.
pub fn run(cmd: &mut Cmd, redirections: &Redirections) -> Result<()> {
    let result = (|| {
        let mut handle = spawn(cmd, redirections)?;
        if !wait(&mut handle)? {
            bail!("command `{}` failed", cmd.program().unwrap_or(""));
        }
        Ok(())
    })();
    cmd.clear();
    result
}
