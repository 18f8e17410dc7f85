//! Lottery module - agency client for the bet submission protocol

pub mod batch;
pub mod messages;
pub mod observer;
pub mod session;
pub mod transport;

pub use session::SessionController;
