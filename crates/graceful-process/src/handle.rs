//! Process handle abstraction and its OS-backed implementation

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::process::{Child, ChildStdin};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{config::ProcessConfig, output::OutputBuffer, status::Termination};

/// Capabilities the controller needs from a running process.
///
/// [`OsProcess`] is the real implementation. Other implementations can stand in for
/// processes that are slow, ignore interrupts or refuse to die.
#[async_trait]
pub trait ProcessHandle: Send + Sync + 'static {
    /// Process ID
    fn pid(&self) -> u32;

    /// Ask the process to shut down (SIGINT)
    fn interrupt(&self) -> io::Result<()>;

    /// Kill the process without giving it a chance to react (SIGKILL)
    fn force_kill(&self) -> io::Result<()>;

    /// Whether the OS has already reported the exit, even if [`wait`](Self::wait) has
    /// not returned yet. Signals sent after this point are refused.
    fn has_exited(&self) -> bool {
        false
    }

    /// Block until the process has exited.
    ///
    /// Called once, by the reaper.
    async fn wait(&self) -> io::Result<Termination>;
}

struct Reapable {
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

/// A real child process spawned through tokio
pub struct OsProcess {
    pid: u32,
    reapable: Mutex<Reapable>,
    reaped: AtomicBool,
    stdin: std::sync::Mutex<Option<ChildStdin>>,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
}

impl OsProcess {
    /// Spawn the process described by `config`.
    ///
    /// Must be called from within a tokio runtime. Captured stdout/stderr are drained by
    /// background readers that [`ProcessHandle::wait`] joins before returning.
    pub fn spawn(config: &ProcessConfig) -> io::Result<Self> {
        let mut child = config.to_command().spawn()?;
        let pid = child
            .id()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Failed to get process ID"))?;

        let stdout = OutputBuffer::default();
        let stderr = OutputBuffer::default();
        let mut readers = Vec::new();
        if let Some(pipe) = child.stdout.take() {
            readers.push(tokio::spawn(stdout.clone().fill_from(pipe)));
        }
        if let Some(pipe) = child.stderr.take() {
            readers.push(tokio::spawn(stderr.clone().fill_from(pipe)));
        }
        let stdin = child.stdin.take();

        Ok(Self {
            pid,
            reapable: Mutex::new(Reapable { child, readers }),
            reaped: AtomicBool::new(false),
            stdin: std::sync::Mutex::new(stdin),
            stdout,
            stderr,
        })
    }

    /// Take the stdin pipe, if one was requested
    pub fn take_stdin(&self) -> Option<ChildStdin> {
        self.stdin.lock().ok().and_then(|mut stdin| stdin.take())
    }

    /// Buffer receiving the process's stdout
    pub fn stdout(&self) -> OutputBuffer {
        self.stdout.clone()
    }

    /// Buffer receiving the process's stderr
    pub fn stderr(&self) -> OutputBuffer {
        self.stderr.clone()
    }

    fn send_signal(&self, signal: Signal) -> io::Result<()> {
        // Once reaped the pid may belong to someone else.
        if self.reaped.load(Ordering::Acquire) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "process already finished",
            ));
        }

        debug!(pid = %self.pid, signal = ?signal, "Sending signal");
        signal.send(self.pid)
    }
}

#[async_trait]
impl ProcessHandle for OsProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn interrupt(&self) -> io::Result<()> {
        self.send_signal(Signal::Interrupt)
    }

    fn force_kill(&self) -> io::Result<()> {
        self.send_signal(Signal::Kill)
    }

    fn has_exited(&self) -> bool {
        self.reaped.load(Ordering::Acquire)
    }

    async fn wait(&self) -> io::Result<Termination> {
        let mut reapable = self.reapable.lock().await;
        let status = reapable.child.wait().await;
        self.reaped.store(true, Ordering::Release);

        // Output written right before exit must be complete when the result is published.
        for reader in reapable.readers.drain(..) {
            if let Err(e) = reader.await {
                warn!(pid = %self.pid, error = %e, "Output reader did not finish");
            }
        }

        status.map(Termination::from)
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Interrupt,
    Kill,
}

impl Signal {
    #[cfg(unix)]
    fn send(self, pid: u32) -> io::Result<()> {
        use nix::sys::signal::{kill, Signal as NixSignal};
        use nix::unistd::Pid;

        let signal = match self {
            Signal::Interrupt => NixSignal::SIGINT,
            Signal::Kill => NixSignal::SIGKILL,
        };
        kill(Pid::from_raw(pid as i32), signal).map_err(io::Error::from)
    }

    #[cfg(not(unix))]
    fn send(self, _pid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "signals are only supported on unix",
        ))
    }
}
