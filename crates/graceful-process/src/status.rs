//! Terminal process state and its textual description

use std::fmt;

/// How a process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Exited on its own with this code
    Exited(i32),
    /// Terminated by this signal number
    Signaled(i32),
}

impl Termination {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        matches!(self, Termination::Exited(0))
    }
}

impl From<std::process::ExitStatus> for Termination {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;

            if let Some(signal) = status.signal() {
                return Termination::Signaled(signal);
            }
        }

        // No code and no signal cannot happen on unix; report it as a generic failure.
        Termination::Exited(status.code().unwrap_or(-1))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exit status {}", code),
            Termination::Signaled(signal) => match signal_name(*signal) {
                Some(name) => write!(f, "signal: {}", name),
                None => write!(f, "signal: signal {}", signal),
            },
        }
    }
}

/// Final state of a reaped process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessState {
    pid: u32,
    termination: Termination,
}

impl ProcessState {
    /// Create a process state
    pub fn new(pid: u32, termination: Termination) -> Self {
        Self { pid, termination }
    }

    /// Process ID the state belongs to
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// How the process ended
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.termination.success()
    }

    /// Exit code, if the process exited on its own
    pub fn code(&self) -> Option<i32> {
        match self.termination {
            Termination::Exited(code) => Some(code),
            Termination::Signaled(_) => None,
        }
    }

    /// Terminating signal, if any
    pub fn signal(&self) -> Option<i32> {
        match self.termination {
            Termination::Signaled(signal) => Some(signal),
            Termination::Exited(_) => None,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.termination.fmt(f)
    }
}

/// Short human readable signal description, as printed by `strsignal(3)` on Linux
#[cfg(unix)]
fn signal_name(signal: i32) -> Option<&'static str> {
    use nix::sys::signal::Signal;

    let name = match Signal::try_from(signal).ok()? {
        Signal::SIGHUP => "hangup",
        Signal::SIGINT => "interrupt",
        Signal::SIGQUIT => "quit",
        Signal::SIGILL => "illegal instruction",
        Signal::SIGTRAP => "trace/breakpoint trap",
        Signal::SIGABRT => "aborted",
        Signal::SIGBUS => "bus error",
        Signal::SIGFPE => "floating point exception",
        Signal::SIGKILL => "killed",
        Signal::SIGUSR1 => "user defined signal 1",
        Signal::SIGSEGV => "segmentation fault",
        Signal::SIGUSR2 => "user defined signal 2",
        Signal::SIGPIPE => "broken pipe",
        Signal::SIGALRM => "alarm clock",
        Signal::SIGTERM => "terminated",
        other => other.as_str(),
    };
    Some(name)
}

#[cfg(not(unix))]
fn signal_name(_signal: i32) -> Option<&'static str> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    const SIGKILL: i32 = Signal::SIGKILL as i32;

    #[test]
    fn test_exit_descriptions() {
        assert_eq!(Termination::Exited(0).to_string(), "exit status 0");
        assert_eq!(Termination::Exited(123).to_string(), "exit status 123");
        assert_eq!(Termination::Signaled(SIGKILL).to_string(), "signal: killed");
        assert_eq!(
            Termination::Signaled(Signal::SIGINT as i32).to_string(),
            "signal: interrupt"
        );
        assert_eq!(
            Termination::Signaled(Signal::SIGBUS as i32).to_string(),
            "signal: bus error"
        );
        assert_eq!(
            Termination::Signaled(Signal::SIGCHLD as i32).to_string(),
            "signal: SIGCHLD"
        );
        assert_eq!(Termination::Signaled(1000).to_string(), "signal: signal 1000");
    }

    #[test]
    fn test_state_accessors() {
        let exited = ProcessState::new(10, Termination::Exited(3));
        assert_eq!(exited.code(), Some(3));
        assert_eq!(exited.signal(), None);
        assert!(!exited.success());

        let killed = ProcessState::new(10, Termination::Signaled(SIGKILL));
        assert_eq!(killed.code(), None);
        assert_eq!(killed.signal(), Some(SIGKILL));
        assert_eq!(killed.to_string(), "signal: killed");

        assert!(ProcessState::new(1, Termination::Exited(0)).success());
    }

    #[test]
    fn test_from_std_exit_status() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(
            Termination::from(std::process::ExitStatus::from_raw(42 << 8)),
            Termination::Exited(42)
        );
        assert_eq!(
            Termination::from(std::process::ExitStatus::from_raw(SIGKILL)),
            Termination::Signaled(SIGKILL)
        );
    }
}
