//! Common test utilities and fixtures

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lottery_client::{SessionConfig, ShutdownSignal};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Agency used across the integration tests
pub const AGENCY: u32 = 7;

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

/// In-process lottery server answering from a fixed script.
///
/// Every received line is recorded. The server answers each line with the
/// next scripted reply, written `chunk` bytes at a time, and hangs up once
/// the script runs out.
pub struct ScriptedServer {
    pub address: String,
    handle: JoinHandle<Vec<String>>,
}

impl ScriptedServer {
    pub async fn spawn(replies: Vec<&str>, chunk: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let replies: Vec<String> = replies.into_iter().map(str::to_string).collect();

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();
            let mut replies = replies.into_iter();
            let mut received = Vec::new();

            while let Ok(Some(line)) = lines.next_line().await {
                received.push(line);
                let Some(reply) = replies.next() else {
                    break;
                };
                for piece in format!("{reply}\n").as_bytes().chunks(chunk.max(1)) {
                    if write.write_all(piece).await.is_err() {
                        return received;
                    }
                    write.flush().await.ok();
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
            received
        });

        Self { address, handle }
    }

    /// Lines the server received, in order
    pub async fn received(self) -> Vec<String> {
        self.handle.await.unwrap()
    }
}

/// Write `contents` to a fresh bet file
pub fn bet_file(contents: &str) -> PathBuf {
    let n = NEXT_FILE.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "lottery-client-test-{}-{}.csv",
        std::process::id(),
        n
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

/// Session parameters pointing at `address`
pub fn session_config(address: &str) -> SessionConfig {
    SessionConfig {
        agency_id: AGENCY,
        server_address: address.to_string(),
        loop_period: Duration::from_millis(5),
        request_timeout: Some(Duration::from_secs(5)),
    }
}

/// Trigger `shutdown` after `delay`
pub fn trigger_after(shutdown: &ShutdownSignal, delay: Duration) {
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        shutdown.trigger();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bet_file_paths_are_unique() {
        let a = bet_file("");
        let b = bet_file("");
        assert_ne!(a, b);
        std::fs::remove_file(a).ok();
        std::fs::remove_file(b).ok();
    }
}
