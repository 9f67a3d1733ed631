//! Process manager - lifecycle orchestration

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::{child::GracefulChild, config::ProcessConfig, error::Result, log::LogSink};

/// Launches processes and shuts them down gracefully
#[derive(Default)]
pub struct ProcessManager {
    log: Option<Arc<dyn LogSink>>,
}

impl ProcessManager {
    /// Create new process manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Send diagnostic messages of every spawned process to `sink`
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log = Some(sink);
        self
    }

    /// Spawn a managed process
    ///
    /// # Arguments
    /// * `config` - Process configuration
    ///
    /// # Returns
    /// Graceful child process controller
    ///
    /// # Examples
    /// ```no_run
    /// use graceful_process::{ProcessManager, ProcessConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = ProcessManager::new();
    /// let config = ProcessConfig::new("echo").args(["hello"]);
    /// let child = manager.spawn(&config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn spawn(&self, config: &ProcessConfig) -> Result<GracefulChild> {
        debug!(
            command = %config.command,
            args = ?config.args,
            "Spawning process"
        );

        GracefulChild::launch(config, self.log.clone())
    }

    /// Wait for a process to exit, giving up after `timeout` (`None` waits forever)
    pub async fn wait(&self, child: &GracefulChild, timeout: Option<Duration>) -> Result<()> {
        child.wait(timeout).await
    }

    /// Gracefully shutdown a process
    ///
    /// Sends SIGINT first, then SIGKILL once the child's grace period runs out.
    ///
    /// # Examples
    /// ```no_run
    /// use graceful_process::{ProcessManager, ProcessConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = ProcessManager::new();
    /// let config = ProcessConfig::new("sleep").args(["1000"]);
    /// let child = manager.spawn(&config).await?;
    /// let _ = manager.shutdown(&child).await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn shutdown(&self, child: &GracefulChild) -> Result<()> {
        child.shutdown().await
    }
}
