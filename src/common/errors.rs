//! Error types for the application

use thiserror::Error;

/// Result type alias using our ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Main error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Could not establish the connection to the server
    #[error("Connection error: {0}")]
    Connect(String),

    /// Writing a frame to the connection failed
    #[error("Send error: {0}")]
    Send(String),

    /// Reading a frame from the connection failed
    #[error("Receive error: {0}")]
    Receive(String),

    /// The peer closed the connection before sending any byte of a frame
    #[error("Connection closed by peer")]
    EndOfStream,

    /// Incoming frame exceeded the receive buffer limit
    #[error("Frame exceeds {limit} bytes without a delimiter")]
    FrameTooLarge { limit: usize },

    /// The frame header is not part of the protocol vocabulary
    #[error("Unknown packet header: {0}")]
    UnknownHeader(String),

    /// The frame payload could not be interpreted
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The reply header does not belong to the request that was sent
    #[error("Unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse { expected: String, actual: String },

    /// The server answered with a terminal `fail`
    #[error("Request rejected by server: {0}")]
    Rejected(String),

    /// An input line could not be turned into a bet record
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Local I/O errors (bet file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Connection level failure, including timeouts
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Connect(_)
                | ClientError::Send(_)
                | ClientError::Receive(_)
                | ClientError::EndOfStream
                | ClientError::Timeout(_)
        )
    }

    /// Protocol violation by the peer
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            ClientError::FrameTooLarge { .. }
                | ClientError::UnknownHeader(_)
                | ClientError::MalformedPayload(_)
                | ClientError::UnexpectedResponse { .. }
        )
    }

    /// Short label used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Connect(_) => "connect",
            ClientError::Send(_) => "send",
            ClientError::Receive(_) | ClientError::EndOfStream => "receive",
            ClientError::Timeout(_) => "timeout",
            ClientError::FrameTooLarge { .. }
            | ClientError::UnknownHeader(_)
            | ClientError::MalformedPayload(_)
            | ClientError::UnexpectedResponse { .. } => "decode",
            ClientError::Rejected(_) => "rejected",
            ClientError::MalformedRecord(_) => "record",
            ClientError::Configuration(_) => "configuration",
            ClientError::Io(_) => "io",
        }
    }
}
