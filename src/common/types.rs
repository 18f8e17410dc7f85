//! Domain types shared by the codec, the batch source and the session

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::{ClientError, Result};

/// Separator substituted for whitespace inside names on the wire
pub const NAME_SEPARATOR: &str = "-";

/// Date format expected for birthdates
pub const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

/// A single lottery entry placed at an agency
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WagerRecord {
    /// Agency the bet was placed at
    pub agency_id: u32,
    /// First name, whitespace already normalized
    pub first_name: String,
    /// Last name, whitespace already normalized
    pub last_name: String,
    /// Identity document of the participant
    pub document: String,
    /// Birthdate as `YYYY-MM-DD`
    pub birthdate: String,
    /// Chosen number
    pub number: u32,
}

impl WagerRecord {
    /// Build a validated record.
    ///
    /// Names have their internal whitespace replaced by [`NAME_SEPARATOR`];
    /// every other field must already be a single wire token.
    pub fn new(
        agency_id: u32,
        first_name: &str,
        last_name: &str,
        document: &str,
        birthdate: &str,
        number: u32,
    ) -> Result<Self> {
        let first_name = normalize_name(first_name);
        let last_name = normalize_name(last_name);
        let document = document.trim();
        let birthdate = birthdate.trim();

        for (field, value) in [
            ("first_name", first_name.as_str()),
            ("last_name", last_name.as_str()),
            ("document", document),
            ("birthdate", birthdate),
        ] {
            validate_token(field, value)?;
        }

        NaiveDate::parse_from_str(birthdate, BIRTHDATE_FORMAT).map_err(|e| {
            ClientError::MalformedRecord(format!("birthdate {birthdate:?}: {e}"))
        })?;

        Ok(Self {
            agency_id,
            first_name,
            last_name,
            document: document.to_string(),
            birthdate: birthdate.to_string(),
            number,
        })
    }
}

/// Ordered group of records sent in one SUBMIT_BETS frame
pub type WagerBatch = Vec<WagerRecord>;

/// Replace runs of whitespace with the wire separator. One-way.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

fn validate_token(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ClientError::MalformedRecord(format!("{field} is empty")));
    }
    if value.chars().any(|c| c.is_whitespace() || c == '&') {
        return Err(ClientError::MalformedRecord(format!(
            "{field} {value:?} contains a reserved character"
        )));
    }
    Ok(())
}

/// Outcome of a winners query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawResult {
    /// Draw is done; documents of this agency's winners (possibly none)
    Available(Vec<String>),
    /// Draw has not happened yet
    Pending,
    /// Server refused the query
    Failure,
}

/// Session state machine positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    SendingBatches,
    NotifyingDraw,
    PollingResults,
    ShuttingDown,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::SendingBatches => write!(f, "sending_batches"),
            SessionState::NotifyingDraw => write!(f, "notifying_draw"),
            SessionState::PollingResults => write!(f, "polling_results"),
            SessionState::ShuttingDown => write!(f, "shutting_down"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}
