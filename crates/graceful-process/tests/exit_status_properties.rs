//! Property-based tests for terminal result reporting

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use graceful_process::{GracefulChild, ProcessHandle, ProcessState, Termination};
use proptest::prelude::*;

/// Handle that has already exited with a fixed outcome
struct Finished(Termination);

#[async_trait]
impl ProcessHandle for Finished {
    fn pid(&self) -> u32 {
        1
    }

    fn interrupt(&self) -> io::Result<()> {
        Err(io::Error::from_raw_os_error(3))
    }

    fn force_kill(&self) -> io::Result<()> {
        Err(io::Error::from_raw_os_error(3))
    }

    async fn wait(&self) -> io::Result<Termination> {
        Ok(self.0)
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Exit codes render like native OS exit reporting
#[test]
fn prop_exit_code_description() {
    proptest!(ProptestConfig::with_cases(200), |(code in 0i32..=255)| {
        let state = ProcessState::new(100, Termination::Exited(code));
        prop_assert_eq!(state.to_string(), format!("exit status {}", code));
        prop_assert_eq!(state.success(), code == 0);
        prop_assert_eq!(state.code(), Some(code));
    });
}

/// Every wait after delivery returns the same result
#[test]
fn prop_repeated_waits_agree() {
    let rt = runtime();

    proptest!(ProptestConfig::with_cases(50), |(code in 0i32..=255, waits in 1usize..6)| {
        let results: Vec<Option<String>> = rt.block_on(async {
            let child = GracefulChild::from_handle(Arc::new(Finished(Termination::Exited(code))), None);
            let mut results = Vec::new();
            for _ in 0..waits {
                results.push(child.wait(None).await.err().map(|e| e.to_string()));
            }
            results
        });

        let expected = if code == 0 { None } else { Some(format!("exit status {}", code)) };
        for result in results {
            prop_assert_eq!(result, expected.clone());
        }
    });
}

/// Kill on an exited process reports the recorded outcome without signalling
#[test]
fn prop_kill_after_exit_is_cached() {
    let rt = runtime();

    proptest!(ProptestConfig::with_cases(50), |(code in 1i32..=255)| {
        let outcome = rt.block_on(async {
            let child = GracefulChild::from_handle(Arc::new(Finished(Termination::Exited(code))), None);
            child.wait(None).await.unwrap_err();
            child.kill(std::time::Duration::from_secs(1)).await
        });

        prop_assert_eq!(outcome.unwrap_err().to_string(), format!("exit status {}", code));
    });
}
