//! LotteryClient Library
//!
//! Agency client that submits bet batches to a lottery server over a
//! newline-framed TCP protocol, then polls for the draw winners.

pub mod common;
pub mod config;
pub mod lottery;

// Re-export commonly used types
pub use common::errors::{ClientError, Result};
pub use common::shutdown::ShutdownSignal;
pub use common::traits::{Connector, SessionObserver};
pub use common::types::{DrawResult, SessionState, WagerBatch, WagerRecord};
pub use config::types::AppConfig;
pub use lottery::batch::BatchSource;
pub use lottery::messages::{MessageType, ProtocolMessage};
pub use lottery::observer::TracingObserver;
pub use lottery::session::{SessionConfig, SessionController, SessionOutcome, SessionReport};
pub use lottery::transport::{TcpConnector, Transport};
