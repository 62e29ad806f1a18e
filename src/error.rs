//! Error types
//!
//! Failures of backend construction and of the dispatch loop. Nothing on
//! the event path returns these; translation problems are logged and the
//! event is dropped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to connect to the X server: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("X connection error: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("X request failed: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("X request failed: {0}")]
    ReplyOrId(#[from] x11rb::errors::ReplyOrIdError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("display connection lost")]
    ConnectionLost,
}

pub type Result<T> = std::result::Result<T, Error>;
