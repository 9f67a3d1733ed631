//! # graceful-process
//!
//! **Purpose**: Launch a child process, wait for it with an optional timeout, and shut
//! it down gracefully.
//!
//! ## Features
//!
//! - **Exactly-once exit reporting**: a background reaper publishes the terminal result
//!   once; every waiter, concurrent or later, sees the same value
//! - **Bounded waits**: a wait timeout gives up waiting without touching the process
//! - **Graceful kill**: SIGINT, a grace period to exit voluntarily, then SIGKILL
//! - **Output capture**: stdout/stderr are fully drained before the result is published
//! - **Pluggable handles**: the controller drives any [`ProcessHandle`], so tests can
//!   simulate slow or stubborn processes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use graceful_process::{ProcessConfig, ProcessManager};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ProcessManager::new();
//!
//! let config = ProcessConfig::new("my-server")
//!     .args(["--port", "8080"])
//!     .grace_period(Duration::from_secs(5));
//!
//! let child = manager.spawn(&config).await?;
//!
//! if let Err(e) = child.wait(Some(Duration::from_secs(30))).await {
//!     if e.is_timeout() {
//!         // Still running: SIGINT, then SIGKILL after the grace period
//!         let _ = manager.shutdown(&child).await;
//!     }
//! }
//!
//! if let Some(state) = child.process_state() {
//!     println!("{}", state); // e.g. "exit status 0" or "signal: killed"
//! }
//! # Ok(())
//! # }
//! ```

pub mod child;
mod completion;
pub mod config;
pub mod error;
pub mod handle;
pub mod log;
pub mod manager;
pub mod output;
pub mod status;

pub use child::GracefulChild;
pub use config::{ProcessConfig, DEFAULT_GRACE_PERIOD};
pub use error::{ExitError, ProcessError, Result};
pub use handle::{OsProcess, ProcessHandle};
pub use log::LogSink;
pub use manager::ProcessManager;
pub use output::OutputBuffer;
pub use status::{ProcessState, Termination};
