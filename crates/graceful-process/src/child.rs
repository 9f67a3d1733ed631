//! Graceful child process controller

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::ChildStdin;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::{
    completion::{self, Completion, CompletionReceiver},
    config::{ProcessConfig, DEFAULT_GRACE_PERIOD},
    error::{ExitError, ProcessError, Result},
    handle::{OsProcess, ProcessHandle},
    log::LogSink,
    output::OutputBuffer,
    status::ProcessState,
};

/// Steps of a single [`GracefulChild::kill`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KillStage {
    Interrupt,
    GracePeriod,
    ForceKill,
    Reap,
}

impl fmt::Display for KillStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KillStage::Interrupt => "interrupt",
            KillStage::GracePeriod => "grace-period",
            KillStage::ForceKill => "force-kill",
            KillStage::Reap => "reap",
        };
        f.write_str(name)
    }
}

/// Pipes handed over from a freshly spawned OS process
#[derive(Default)]
struct ChildStdio {
    stdin: Option<ChildStdin>,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
}

/// A launched process with bounded waiting and SIGINT→SIGKILL shutdown.
///
/// A background reaper task waits for the process and publishes its terminal result
/// once. Every [`wait`](Self::wait) and [`kill`](Self::kill) call, concurrent or later,
/// observes that same result. Dropping the controller does not stop the process.
pub struct GracefulChild {
    handle: Arc<dyn ProcessHandle>,
    pid: u32,
    completion: CompletionReceiver,
    kill_lock: Mutex<()>,
    grace_period: Duration,
    log: Option<Arc<dyn LogSink>>,
    stdin: std::sync::Mutex<Option<ChildStdin>>,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
}

impl GracefulChild {
    /// Spawn the process described by `config` and start its reaper.
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// [`ProcessError::SpawnFailed`] if the OS cannot create the process, in which case
    /// no reaper is started.
    pub fn launch(config: &ProcessConfig, log: Option<Arc<dyn LogSink>>) -> Result<Self> {
        let process = OsProcess::spawn(config)?;
        info!(pid = %process.pid(), command = %config.command, "Process spawned");

        let stdio = ChildStdio {
            stdin: process.take_stdin(),
            stdout: process.stdout(),
            stderr: process.stderr(),
        };
        Ok(Self::start(Arc::new(process), log, config.grace_period, stdio))
    }

    /// Take control of an already running process and start its reaper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_handle(handle: Arc<dyn ProcessHandle>, log: Option<Arc<dyn LogSink>>) -> Self {
        Self::start(handle, log, DEFAULT_GRACE_PERIOD, ChildStdio::default())
    }

    fn start(
        handle: Arc<dyn ProcessHandle>,
        log: Option<Arc<dyn LogSink>>,
        grace_period: Duration,
        stdio: ChildStdio,
    ) -> Self {
        let pid = handle.pid();
        let (sender, completion) = completion::channel();

        let reaped = Arc::clone(&handle);
        tokio::spawn(async move {
            let completion = reaped
                .wait()
                .await
                .map(|termination| ProcessState::new(pid, termination))
                .map_err(Arc::new);

            match &completion {
                Ok(state) => debug!(pid = %pid, status = %state, "Process exited"),
                Err(e) => warn!(pid = %pid, error = %e, "Failed to wait for process"),
            }
            sender.complete(completion);
        });

        Self {
            handle,
            pid,
            completion,
            kill_lock: Mutex::new(()),
            grace_period,
            log,
            stdin: std::sync::Mutex::new(stdio.stdin),
            stdout: stdio.stdout,
            stderr: stdio.stderr,
        }
    }

    /// Get process ID
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Check if process is still running.
    ///
    /// Turns false as soon as the OS reports the exit, which can be before
    /// [`process_state`](Self::process_state) is available while output is still draining.
    pub fn is_running(&self) -> bool {
        self.completion.peek().is_none() && !self.handle.has_exited()
    }

    /// Final state, once the process has been reaped
    pub fn process_state(&self) -> Option<ProcessState> {
        self.completion.peek().and_then(|completion| completion.ok())
    }

    /// Terminal result without waiting; `None` while the process is running
    pub fn exit_result(&self) -> Option<Result<()>> {
        self.completion.peek().map(into_result)
    }

    /// Grace period used by [`shutdown`](Self::shutdown)
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Take stdin handle
    pub fn take_stdin(&self) -> Option<ChildStdin> {
        self.stdin.lock().ok().and_then(|mut stdin| stdin.take())
    }

    /// Captured stdout; complete once the process has been reaped
    pub fn stdout(&self) -> &OutputBuffer {
        &self.stdout
    }

    /// Captured stderr; complete once the process has been reaped
    pub fn stderr(&self) -> &OutputBuffer {
        &self.stderr
    }

    /// Write a diagnostic message to the log sink, if any. Failures are ignored.
    pub fn log(&self, message: &str) {
        if let Some(sink) = &self.log {
            if let Err(e) = sink.write_message(message) {
                trace!(pid = %self.pid, error = %e, "Log sink write failed");
            }
        }
    }

    /// Wait for the process to exit.
    ///
    /// `None` or a zero timeout waits indefinitely. Returns `Ok(())` on exit code 0 and
    /// [`ProcessError::Exit`] on any other terminal outcome. When the timeout elapses
    /// first, returns [`ProcessError::Timeout`] and leaves the process running.
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<()> {
        match timeout.filter(|timeout| !timeout.is_zero()) {
            None => self.wait_for_exit().await,
            Some(timeout) => tokio::time::timeout(timeout, self.wait_for_exit())
                .await
                .map_err(|_| ProcessError::Timeout { timeout })?,
        }
    }

    async fn wait_for_exit(&self) -> Result<()> {
        self.completion.recv().await.and_then(into_result)
    }

    /// Kill the process: SIGINT, up to `grace_period` to exit, then SIGKILL.
    ///
    /// Returns the terminal result of the process, or [`ProcessError::KillFailed`] if
    /// SIGKILL could not be sent. A failure to send SIGINT skips the grace period.
    ///
    /// Calls are serialized. A call made after the process has exited sends no signal
    /// and returns the recorded result.
    pub async fn kill(&self, grace_period: Duration) -> Result<()> {
        let _guard = self.kill_lock.lock().await;

        if let Some(completion) = self.completion.peek() {
            debug!(pid = %self.pid, "Process already exited; not signalling");
            return into_result(completion);
        }

        let pid = self.pid;
        let mut stage = if self.handle.has_exited() {
            debug!(pid = %pid, "Process already exited; waiting for its result");
            KillStage::Reap
        } else {
            KillStage::Interrupt
        };
        loop {
            trace!(pid = %pid, stage = %stage, "Kill escalation");
            stage = match stage {
                KillStage::Interrupt => match self.handle.interrupt() {
                    Ok(()) => {
                        debug!(pid = %pid, grace_period = ?grace_period, "Sent SIGINT");
                        self.log(&format!(
                            "sent SIGINT to pid {}; waiting up to {:?} for it to exit",
                            pid, grace_period
                        ));
                        KillStage::GracePeriod
                    }
                    Err(source) => {
                        let err = ProcessError::SignalFailed {
                            signal: "SIGINT",
                            pid,
                            source,
                        };
                        warn!(pid = %pid, error = %err, "Interrupt failed, escalating");
                        self.log(&err.to_string());
                        KillStage::ForceKill
                    }
                },
                KillStage::GracePeriod => {
                    match tokio::time::timeout(grace_period, self.completion.recv()).await {
                        Ok(completion) => {
                            let completion = completion?;
                            debug!(pid = %pid, "Process exited after SIGINT");
                            self.log(&format!("pid {} exited", pid));
                            return into_result(completion);
                        }
                        Err(_) => {
                            warn!(pid = %pid, grace_period = ?grace_period, "Timed out waiting for SIGINT");
                            self.log(&format!(
                                "timed out waiting for pid {} to handle SIGINT",
                                pid
                            ));
                            KillStage::ForceKill
                        }
                    }
                }
                KillStage::ForceKill => {
                    self.log(&format!("pid {} still running; sending SIGKILL", pid));
                    match self.handle.force_kill() {
                        Ok(()) => debug!(pid = %pid, "Sent SIGKILL"),
                        // Exited on its own meanwhile; the result is on its way.
                        Err(_) if self.handle.has_exited() => {
                            debug!(pid = %pid, "Process exited before SIGKILL");
                            self.log(&format!("pid {} exited", pid));
                        }
                        Err(source) => {
                            warn!(pid = %pid, error = %source, "Failed to send SIGKILL");
                            return Err(ProcessError::KillFailed { pid, source });
                        }
                    }
                    KillStage::Reap
                }
                KillStage::Reap => return self.wait_for_exit().await,
            };
        }
    }

    /// Kill the process using the configured grace period
    pub async fn shutdown(&self) -> Result<()> {
        self.kill(self.grace_period).await
    }
}

fn into_result(completion: Completion) -> Result<()> {
    match completion {
        Ok(state) if state.success() => Ok(()),
        Ok(state) => Err(ExitError::new(state).into()),
        Err(e) => Err(ProcessError::WaitFailed(e)),
    }
}
