//! Default session observer that reports progress through `tracing`

use tracing::{debug, error, info, warn};

use crate::common::errors::ClientError;
use crate::common::traits::SessionObserver;
use crate::common::types::{DrawResult, SessionState};

/// Emits one structured event per session milestone
#[derive(Debug, Clone)]
pub struct TracingObserver {
    agency_id: u32,
}

impl TracingObserver {
    /// Create an observer tagging every event with `agency_id`
    pub fn new(agency_id: u32) -> Self {
        Self { agency_id }
    }
}

impl SessionObserver for TracingObserver {
    fn on_state_change(&mut self, from: SessionState, to: SessionState) {
        debug!(agency = self.agency_id, %from, %to, "Session state changed");
    }

    fn on_batch_sent(&mut self, records: usize, accepted: bool) {
        if accepted {
            info!(
                action = "bets_sent",
                result = "success",
                agency = self.agency_id,
                records
            );
        } else {
            warn!(
                action = "bets_sent",
                result = "fail",
                agency = self.agency_id,
                records
            );
        }
    }

    fn on_draw_notified(&mut self, attempt: u32, accepted: bool) {
        if accepted {
            info!(
                action = "draw_notified",
                result = "success",
                agency = self.agency_id,
                attempt
            );
        } else {
            warn!(
                action = "draw_notified",
                result = "fail",
                agency = self.agency_id,
                attempt
            );
        }
    }

    fn on_results_polled(&mut self, attempt: u32, result: &DrawResult) {
        match result {
            DrawResult::Available(winners) => info!(
                action = "winners_query",
                result = "success",
                agency = self.agency_id,
                winners = winners.len(),
                attempt
            ),
            DrawResult::Pending => debug!(
                action = "winners_query",
                result = "pending",
                agency = self.agency_id,
                attempt
            ),
            DrawResult::Failure => error!(
                action = "winners_query",
                result = "fail",
                agency = self.agency_id,
                attempt
            ),
        }
    }

    fn on_session_failed(&mut self, state: SessionState, err: &ClientError) {
        error!(
            action = "session",
            result = "fail",
            agency = self.agency_id,
            %state,
            kind = err.kind(),
            error = %err
        );
    }

    fn on_cancelled(&mut self, state: SessionState) {
        info!(
            action = "exit",
            result = "success",
            agency = self.agency_id,
            %state,
            "Shutdown requested"
        );
    }
}
