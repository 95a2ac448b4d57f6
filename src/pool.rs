//! Bounded process pool.
//!
//! Concurrency here is at the OS-process level: the pool itself runs on the
//! single orchestrating thread and "scheduling" is a polling wait with short
//! sleeps. While the pool is at capacity, a submission blocks until one of
//! the in-flight children exits.

use crate::command::Cmd;
use crate::process::{self, Poll, ProcHandle, Redirections};
use anyhow::{bail, Result};
use std::thread;
use std::time::Duration;

/// Per-iteration sleep of the admission poll loop.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Default concurrency bound: logical CPU count + 1.
pub fn default_max_procs() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get()) + 1
}

pub struct ProcPool {
    procs: Vec<ProcHandle>,
    max_procs: usize,
}

impl ProcPool {
    /// `max_procs` of `None` selects [`default_max_procs`].
    pub fn new(max_procs: Option<usize>) -> Self {
        Self {
            procs: Vec::new(),
            max_procs: max_procs.unwrap_or_else(default_max_procs).max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn max_procs(&self) -> usize {
        self.max_procs
    }

    /// Spawns `cmd` once the pool has room, appending the new handle. The
    /// command buffer is cleared on every exit path so it can be reused for
    /// the next submission.
    ///
    /// If a pooled command turns out to have failed while we wait for a
    /// slot, the submission fails and the new process is never started.
    pub fn submit(&mut self, cmd: &mut Cmd, redirections: &Redirections) -> Result<()> {
        let result = self.submit_inner(cmd, redirections);
        cmd.clear();
        result
    }

    fn submit_inner(&mut self, cmd: &Cmd, redirections: &Redirections) -> Result<()> {
        while self.procs.len() >= self.max_procs {
            self.wait_for_slot()?;
        }
        let handle = process::spawn(cmd, redirections)?;
        self.procs.push(handle);
        Ok(())
    }

    /// Polls every pooled handle with a short timeout until one terminates,
    /// then removes it (unordered, swap-with-last).
    fn wait_for_slot(&mut self) -> Result<()> {
        loop {
            for i in 0..self.procs.len() {
                match process::wait_timeout(&mut self.procs[i], POLL_INTERVAL)? {
                    Poll::Done(ok) => {
                        self.procs.swap_remove(i);
                        if !ok {
                            bail!("a pooled command failed");
                        }
                        return Ok(());
                    }
                    Poll::Pending => {}
                }
            }
        }
    }

    /// Blocks until every pooled process has exited and empties the pool.
    /// All handles are waited on even after a failure; the overall result is
    /// an error if any of them did not exit cleanly.
    pub fn flush(&mut self) -> Result<()> {
        let mut ok = true;
        for handle in &mut self.procs {
            ok = matches!(process::wait(handle), Ok(true)) && ok;
        }
        self.procs.clear();
        if !ok {
            bail!("one or more pooled commands failed");
        }
        Ok(())
    }
}

impl Default for ProcPool {
    fn default() -> Self {
        Self::new(None)
    }
}
