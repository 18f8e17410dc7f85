//! Agency session: submit every batch, notify the draw, poll winners, hang up
//!
//! ```text
//! Idle -> SendingBatches -> NotifyingDraw -> PollingResults -> ShuttingDown -> Closed
//!              |                  |                 |
//!              +------------------+-----------------+--> Closed (error / cancel)
//! ```
//!
//! Exactly one request is outstanding at any time. The shutdown signal is
//! read before each batch, each notify attempt and each poll; a request
//! already on the wire always runs to completion first.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite};
use tracing::instrument;

use super::batch::BatchSource;
use super::messages::{parse_ack, parse_draw_results, Ack, ProtocolMessage};
use super::transport::Transport;
use crate::common::errors::{ClientError, Result};
use crate::common::shutdown::ShutdownSignal;
use crate::common::traits::{Connector, SessionObserver};
use crate::common::types::{DrawResult, SessionState};

/// Inputs of one session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Agency identifier sent with every request
    pub agency_id: u32,
    /// `host:port` of the lottery server
    pub server_address: String,
    /// Delay between consecutive requests
    pub loop_period: Duration,
    /// Limit for each send and each receive; `None` waits forever
    pub request_timeout: Option<Duration>,
}

/// Counters collected while the session runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub batches_sent: u32,
    pub bets_sent: u64,
    pub batches_rejected: u32,
    pub notify_attempts: u32,
    pub result_polls: u32,
    pub shutdown_acknowledged: bool,
    /// Documents of this agency's winners
    pub winners: Vec<String>,
}

/// Terminal outcome of a session that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Winners obtained and shutdown attempted
    Completed(SessionReport),
    /// Stopped at a checkpoint after a shutdown request
    Cancelled {
        state: SessionState,
        report: SessionReport,
    },
}

impl SessionOutcome {
    /// Report collected up to the end of the session
    pub fn report(&self) -> &SessionReport {
        match self {
            SessionOutcome::Completed(report) => report,
            SessionOutcome::Cancelled { report, .. } => report,
        }
    }
}

enum Flow {
    Advance(SessionState),
    Cancelled,
}

/// Drives one connection through the agency protocol
pub struct SessionController<C, O> {
    connector: C,
    config: SessionConfig,
    shutdown: ShutdownSignal,
    observer: O,
    state: SessionState,
    report: SessionReport,
}

impl<C, O> SessionController<C, O>
where
    C: Connector,
    O: SessionObserver,
{
    pub fn new(connector: C, config: SessionConfig, shutdown: ShutdownSignal, observer: O) -> Self {
        Self {
            connector,
            config,
            shutdown,
            observer,
            state: SessionState::Idle,
            report: SessionReport::default(),
        }
    }

    /// Current state machine position
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the whole session.
    ///
    /// The connection and `source` are both released before this returns,
    /// whatever the outcome.
    #[instrument(skip(self, source), fields(agency = self.config.agency_id))]
    pub async fn run<R>(&mut self, source: &mut BatchSource<R>) -> Result<SessionOutcome>
    where
        R: AsyncBufRead + Unpin,
    {
        self.state = SessionState::Idle;
        self.report = SessionReport::default();

        let opened = Transport::open(&self.connector, &self.config.server_address).await;
        let mut transport = match opened {
            Ok(transport) => transport,
            Err(e) => {
                source.close();
                return Err(self.abort(e));
            }
        };

        self.transition(SessionState::SendingBatches);
        let result = self.drive(&mut transport, source).await;

        transport.close().await;
        source.close();

        match result {
            Ok(Flow::Advance(_)) => {
                self.transition(SessionState::Closed);
                Ok(SessionOutcome::Completed(self.report.clone()))
            }
            Ok(Flow::Cancelled) => {
                let state = self.state;
                self.observer.on_cancelled(state);
                self.transition(SessionState::Closed);
                Ok(SessionOutcome::Cancelled {
                    state,
                    report: self.report.clone(),
                })
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    async fn drive<S, R>(
        &mut self,
        transport: &mut Transport<S>,
        source: &mut BatchSource<R>,
    ) -> Result<Flow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        R: AsyncBufRead + Unpin,
    {
        loop {
            let flow = match self.state {
                SessionState::SendingBatches => self.send_batches(transport, source).await?,
                SessionState::NotifyingDraw => self.notify_draw(transport).await?,
                SessionState::PollingResults => self.poll_results(transport).await?,
                SessionState::ShuttingDown => {
                    self.hang_up(transport).await;
                    return Ok(Flow::Advance(SessionState::Closed));
                }
                SessionState::Idle | SessionState::Closed => {
                    return Ok(Flow::Advance(SessionState::Closed))
                }
            };

            match flow {
                Flow::Advance(next) => self.transition(next),
                Flow::Cancelled => return Ok(Flow::Cancelled),
            }
        }
    }

    async fn send_batches<S, R>(
        &mut self,
        transport: &mut Transport<S>,
        source: &mut BatchSource<R>,
    ) -> Result<Flow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        R: AsyncBufRead + Unpin,
    {
        loop {
            if self.shutdown.is_triggered() {
                return Ok(Flow::Cancelled);
            }

            let (batch, more) = source.next_batch().await?;
            if !batch.is_empty() {
                let request = ProtocolMessage::submit_bets(&batch);
                let reply = exchange(transport, &request, self.config.request_timeout).await?;
                let accepted = parse_ack(&reply.payload)? == Ack::Success;

                self.report.batches_sent += 1;
                self.report.bets_sent += batch.len() as u64;
                if !accepted {
                    self.report.batches_rejected += 1;
                }
                self.observer.on_batch_sent(batch.len(), accepted);
            }

            if !more {
                return Ok(Flow::Advance(SessionState::NotifyingDraw));
            }
            self.shutdown.pause(self.config.loop_period).await;
        }
    }

    /// Repeat NOTIFY_ALL_SENT until the server accepts it
    async fn notify_draw<S>(&mut self, transport: &mut Transport<S>) -> Result<Flow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let request = ProtocolMessage::notify_all_sent(self.config.agency_id);
        let mut attempt = 0;

        loop {
            if self.shutdown.is_triggered() {
                return Ok(Flow::Cancelled);
            }

            attempt += 1;
            self.report.notify_attempts = attempt;
            let reply = exchange(transport, &request, self.config.request_timeout).await?;

            match parse_ack(&reply.payload)? {
                Ack::Success => {
                    self.observer.on_draw_notified(attempt, true);
                    return Ok(Flow::Advance(SessionState::PollingResults));
                }
                Ack::Fail => {
                    self.observer.on_draw_notified(attempt, false);
                    self.shutdown.pause(self.config.loop_period).await;
                }
            }
        }
    }

    async fn poll_results<S>(&mut self, transport: &mut Transport<S>) -> Result<Flow>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let request = ProtocolMessage::query_results(self.config.agency_id);
        let mut attempt = 0;

        loop {
            if self.shutdown.is_triggered() {
                return Ok(Flow::Cancelled);
            }

            attempt += 1;
            self.report.result_polls = attempt;
            let reply = exchange(transport, &request, self.config.request_timeout).await?;
            let result = parse_draw_results(&reply.payload)?;
            self.observer.on_results_polled(attempt, &result);

            match result {
                DrawResult::Available(winners) => {
                    self.report.winners = winners;
                    return Ok(Flow::Advance(SessionState::ShuttingDown));
                }
                DrawResult::Pending => self.shutdown.pause(self.config.loop_period).await,
                DrawResult::Failure => {
                    return Err(ClientError::Rejected(format!(
                        "winners query for agency {}",
                        self.config.agency_id
                    )))
                }
            }
        }
    }

    /// Best-effort SHUTDOWN; any failure is ignored
    async fn hang_up<S>(&mut self, transport: &mut Transport<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let timeout = self.config.request_timeout;
        let request = ProtocolMessage::shutdown().encode();

        let sent = bounded("send", timeout, transport.send_all(&request)).await;
        if sent.is_ok() {
            let reply = bounded("receive", timeout, transport.receive_frame()).await;
            self.report.shutdown_acknowledged = reply.is_ok();
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        if from != to {
            self.observer.on_state_change(from, to);
            self.state = to;
        }
    }

    fn abort(&mut self, err: ClientError) -> ClientError {
        self.observer.on_session_failed(self.state, &err);
        self.transition(SessionState::Closed);
        err
    }
}

/// Stop-and-wait round trip: send `request`, read and check its reply
async fn exchange<S>(
    transport: &mut Transport<S>,
    request: &ProtocolMessage,
    timeout: Option<Duration>,
) -> Result<ProtocolMessage>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    bounded("send", timeout, transport.send_all(&request.encode())).await?;
    let frame = bounded("receive", timeout, transport.receive_frame()).await?;
    let reply = ProtocolMessage::decode(&frame)?;

    if reply.kind != request.kind {
        return Err(ClientError::UnexpectedResponse {
            expected: request.kind.to_string(),
            actual: reply.kind.to_string(),
        });
    }
    Ok(reply)
}

async fn bounded<T>(
    operation: &str,
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ClientError::Timeout(format!("{operation} after {limit:?}")))?,
        None => fut.await,
    }
}
