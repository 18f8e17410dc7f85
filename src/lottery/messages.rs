//! Wire codec for the agency protocol
//!
//! Every frame is a single line: a header token, one space and a payload.
//!
//! ```text
//! bet <agency> <first> <last> <document> <birthdate> <number>[&<agency> ...]
//! betdraw <agency>
//! betdrawresults <agency>
//! shutdown-connection success
//! ```

use std::str::FromStr;

use crate::common::errors::{ClientError, Result};
use crate::common::types::{DrawResult, WagerRecord};

/// Separator between records and between winner documents
pub const LIST_SEPARATOR: &str = "&";

/// Payload token for a positive answer
pub const SUCCESS: &str = "success";

/// Payload token for a negative answer
pub const FAIL: &str = "fail";

/// Message vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    SubmitBets,
    NotifyAllSent,
    QueryResults,
    Shutdown,
}

impl MessageType {
    /// Header token on the wire
    pub fn header(&self) -> &'static str {
        match self {
            MessageType::SubmitBets => "bet",
            MessageType::NotifyAllSent => "betdraw",
            MessageType::QueryResults => "betdrawresults",
            MessageType::Shutdown => "shutdown-connection",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for MessageType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bet" => Ok(MessageType::SubmitBets),
            "betdraw" => Ok(MessageType::NotifyAllSent),
            "betdrawresults" => Ok(MessageType::QueryResults),
            "shutdown-connection" => Ok(MessageType::Shutdown),
            other => Err(ClientError::UnknownHeader(other.to_string())),
        }
    }
}

/// One protocol frame, header plus payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMessage {
    pub kind: MessageType,
    pub payload: String,
}

impl ProtocolMessage {
    /// SUBMIT_BETS carrying the given records, in order
    pub fn submit_bets(records: &[WagerRecord]) -> Self {
        let payload = records
            .iter()
            .map(encode_record)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);
        Self {
            kind: MessageType::SubmitBets,
            payload,
        }
    }

    /// NOTIFY_ALL_SENT for an agency
    pub fn notify_all_sent(agency_id: u32) -> Self {
        Self {
            kind: MessageType::NotifyAllSent,
            payload: agency_id.to_string(),
        }
    }

    /// QUERY_RESULTS for an agency
    pub fn query_results(agency_id: u32) -> Self {
        Self {
            kind: MessageType::QueryResults,
            payload: agency_id.to_string(),
        }
    }

    /// Courtesy SHUTDOWN sent before closing
    pub fn shutdown() -> Self {
        Self {
            kind: MessageType::Shutdown,
            payload: SUCCESS.to_string(),
        }
    }

    /// Encode as a single delimited line.
    ///
    /// Callers build payloads from validated records, so the payload never
    /// holds a newline.
    pub fn encode(&self) -> Vec<u8> {
        debug_assert!(!self.payload.contains('\n'));
        let mut bytes = Vec::with_capacity(self.kind.header().len() + self.payload.len() + 2);
        bytes.extend_from_slice(self.kind.header().as_bytes());
        bytes.push(b' ');
        bytes.extend_from_slice(self.payload.as_bytes());
        bytes.push(b'\n');
        bytes
    }

    /// Decode one frame (delimiter already stripped).
    ///
    /// The header ends at the first space; a frame without a space is a bare
    /// header with an empty payload.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(frame)
            .map_err(|e| ClientError::MalformedPayload(format!("invalid utf-8: {e}")))?;
        let text = text.strip_suffix('\n').unwrap_or(text);

        let (header, payload) = text.split_once(' ').unwrap_or((text, ""));
        let kind = header.parse::<MessageType>()?;

        Ok(Self {
            kind,
            payload: payload.to_string(),
        })
    }
}

fn encode_record(record: &WagerRecord) -> String {
    format!(
        "{} {} {} {} {} {}",
        record.agency_id,
        record.first_name,
        record.last_name,
        record.document,
        record.birthdate,
        record.number
    )
}

/// Parse a SUBMIT_BETS payload back into records
pub fn decode_bets(payload: &str) -> Result<Vec<WagerRecord>> {
    payload
        .split(LIST_SEPARATOR)
        .map(|raw| {
            let fields: Vec<&str> = raw.split(' ').collect();
            let [agency, first, last, document, birthdate, number] = fields.as_slice() else {
                return Err(ClientError::MalformedPayload(format!(
                    "expected 6 bet fields, got {}: {raw:?}",
                    fields.len()
                )));
            };
            let agency_id = agency
                .parse()
                .map_err(|_| ClientError::MalformedPayload(format!("agency {agency:?}")))?;
            let number = number
                .parse()
                .map_err(|_| ClientError::MalformedPayload(format!("number {number:?}")))?;
            WagerRecord::new(agency_id, first, last, document, birthdate, number)
                .map_err(|e| ClientError::MalformedPayload(e.to_string()))
        })
        .collect()
}

/// Server answer to SUBMIT_BETS and NOTIFY_ALL_SENT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Success,
    Fail,
}

/// Parse a `success` / `fail` payload
pub fn parse_ack(payload: &str) -> Result<Ack> {
    match payload.trim() {
        SUCCESS => Ok(Ack::Success),
        FAIL => Ok(Ack::Fail),
        other => Err(ClientError::MalformedPayload(format!(
            "expected success or fail, got {other:?}"
        ))),
    }
}

/// Parse a QUERY_RESULTS answer.
///
/// - empty: the draw has not happened yet
/// - `fail`: the server refused the query
/// - `success` followed by an optional `&`-joined document list
///
/// Anything else is [`ClientError::MalformedPayload`].
pub fn parse_draw_results(payload: &str) -> Result<DrawResult> {
    let malformed = || ClientError::MalformedPayload(format!("draw results {payload:?}"));

    let list = match payload {
        "" => return Ok(DrawResult::Pending),
        FAIL => return Ok(DrawResult::Failure),
        SUCCESS => "",
        _ => match payload.split_once(' ') {
            Some((SUCCESS, rest)) => rest,
            _ => return Err(malformed()),
        },
    };

    if list.is_empty() {
        return Ok(DrawResult::Available(Vec::new()));
    }

    list.split(LIST_SEPARATOR)
        .map(|document| {
            if document.is_empty() || document.contains(char::is_whitespace) {
                Err(malformed())
            } else {
                Ok(document.to_string())
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(DrawResult::Available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(first: &str, last: &str, document: &str, number: u32) -> WagerRecord {
        WagerRecord::new(7, first, last, document, "1990-01-01", number).unwrap()
    }

    #[test]
    fn test_encode_single_bet() {
        let msg = ProtocolMessage::submit_bets(&[record("Ana", "Lopez", "30000111", 4521)]);
        assert_eq!(
            msg.encode(),
            b"bet 7 Ana Lopez 30000111 1990-01-01 4521\n".to_vec()
        );
    }

    #[test]
    fn test_encode_control_messages() {
        assert_eq!(ProtocolMessage::notify_all_sent(7).encode(), b"betdraw 7\n".to_vec());
        assert_eq!(
            ProtocolMessage::query_results(7).encode(),
            b"betdrawresults 7\n".to_vec()
        );
        assert_eq!(
            ProtocolMessage::shutdown().encode(),
            b"shutdown-connection success\n".to_vec()
        );
    }

    #[test]
    fn test_batch_round_trip() {
        let batch = vec![
            record("Ana Maria", "Lopez", "30000111", 4521),
            record("Juan", "De la Cruz", "30000222", 17),
            record("Eva", "Diaz", "30000333", 0),
        ];

        let encoded = ProtocolMessage::submit_bets(&batch).encode();
        let frame = &encoded[..encoded.len() - 1];
        let decoded = ProtocolMessage::decode(frame).unwrap();

        assert_eq!(decoded.kind, MessageType::SubmitBets);
        assert_eq!(decode_bets(&decoded.payload).unwrap(), batch);
        assert_eq!(batch[0].first_name, "Ana-Maria");
        assert_eq!(batch[1].last_name, "De-la-Cruz");
    }

    #[test]
    fn test_decode_splits_on_first_space() {
        let msg = ProtocolMessage::decode(b"betdrawresults success 1&2").unwrap();
        assert_eq!(msg.kind, MessageType::QueryResults);
        assert_eq!(msg.payload, "success 1&2");
    }

    #[test]
    fn test_decode_bare_header() {
        let msg = ProtocolMessage::decode(b"betdrawresults").unwrap();
        assert_eq!(msg.kind, MessageType::QueryResults);
        assert_eq!(msg.payload, "");

        let msg = ProtocolMessage::decode(b"betdrawresults ").unwrap();
        assert_eq!(msg.payload, "");
    }

    #[test]
    fn test_decode_unknown_header() {
        let err = ProtocolMessage::decode(b"hello success").unwrap_err();
        assert!(matches!(err, ClientError::UnknownHeader(h) if h == "hello"));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = ProtocolMessage::decode(&[0x62, 0x65, 0x74, 0x20, 0xff]).unwrap_err();
        assert!(matches!(err, ClientError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_bets_rejects_short_record() {
        assert!(decode_bets("7 Ana Lopez 30000111 4521").is_err());
        assert!(decode_bets("7 Ana Lopez 30000111 1990-01-01 many").is_err());
    }

    #[test]
    fn test_parse_ack() {
        assert_eq!(parse_ack("success").unwrap(), Ack::Success);
        assert_eq!(parse_ack("fail").unwrap(), Ack::Fail);
        assert!(parse_ack("maybe").is_err());
    }

    #[test]
    fn test_parse_draw_results() {
        assert_eq!(parse_draw_results("").unwrap(), DrawResult::Pending);
        assert_eq!(parse_draw_results("fail").unwrap(), DrawResult::Failure);
        assert_eq!(
            parse_draw_results("success").unwrap(),
            DrawResult::Available(vec![])
        );
        assert_eq!(
            parse_draw_results("success ").unwrap(),
            DrawResult::Available(vec![])
        );
        assert_eq!(
            parse_draw_results("success 30000111&30000222").unwrap(),
            DrawResult::Available(vec!["30000111".into(), "30000222".into()])
        );
    }

    #[test]
    fn test_parse_draw_results_rejects_anything_else() {
        for payload in [
            "pending",
            "30000111",
            "error: agency not found",
            "success 1 2",
            "success 1&&2",
            "success &1",
            "successful 1",
            " fail",
        ] {
            let err = parse_draw_results(payload).unwrap_err();
            assert!(
                matches!(err, ClientError::MalformedPayload(_)),
                "{payload:?} gave {err:?}"
            );
        }
    }
}
