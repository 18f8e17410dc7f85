//! Trait seams between the session and its collaborators

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::errors::{ClientError, Result};
use super::types::{DrawResult, SessionState};

/// Opens the byte stream a session talks over.
///
/// Production uses [`crate::lottery::transport::TcpConnector`]; tests hand
/// out scripted in-memory streams.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Stream type produced by this connector
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Establish a connection to `address`
    async fn connect(&self, address: &str) -> Result<Self::Stream>;
}

/// Receives session progress.
///
/// The session never logs on its own; everything a user sees goes through
/// the observer it was built with.
#[cfg_attr(test, mockall::automock)]
pub trait SessionObserver: Send + Sync {
    /// Called on every state machine transition
    fn on_state_change(&mut self, from: SessionState, to: SessionState);

    /// Called once the server answered a SUBMIT_BETS frame
    fn on_batch_sent(&mut self, records: usize, accepted: bool);

    /// Called once the server answered a NOTIFY_ALL_SENT frame
    fn on_draw_notified(&mut self, attempt: u32, accepted: bool);

    /// Called once the server answered a QUERY_RESULTS frame
    fn on_results_polled(&mut self, attempt: u32, result: &DrawResult);

    /// Called when the session aborts with an error
    fn on_session_failed(&mut self, state: SessionState, error: &ClientError);

    /// Called when the session stops at a cancellation checkpoint
    fn on_cancelled(&mut self, state: SessionState);
}
