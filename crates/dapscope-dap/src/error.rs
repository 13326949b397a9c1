//! DAP error types.

use thiserror::Error;

use crate::session::SessionState;

/// Errors from DAP client operations.
#[derive(Debug, Error)]
pub enum DapError {
    /// Could not open the TCP connection to the adapter.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// The `host:port` that was dialed.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// The adapter closed the connection before the expected bytes arrived.
    #[error("connection closed by adapter")]
    ConnectionClosed,

    /// Socket read or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed framing or message body.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Debuggee process failed to start.
    #[error("failed to launch {program}: {source}")]
    ProcessSpawn {
        /// The program that was launched.
        program: String,
        /// The spawn error.
        #[source]
        source: std::io::Error,
    },

    /// A request or event wait exceeded its deadline.
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout {
        /// What was being waited for (a command or an event name).
        what: String,
        /// The deadline that expired.
        after: std::time::Duration,
    },

    /// Adapter answered a request with `success: false`.
    #[error("adapter rejected {command}: {message}")]
    Rejected {
        /// The rejected command.
        command: String,
        /// The adapter's error message.
        message: String,
    },

    /// Adapter sent a response that does not have the expected shape.
    #[error("adapter sent invalid response: {0}")]
    InvalidResponse(String),

    /// An awaited request was issued while another one is still pending.
    #[error("cannot send {command}: another request is awaiting its response")]
    RequestInFlight {
        /// The command that was refused.
        command: String,
    },

    /// The handshake state machine was driven out of order.
    #[error("invalid session transition: {from:?} -> {to:?}")]
    InvalidState {
        /// State the session was in.
        from: SessionState,
        /// State that was requested.
        to: SessionState,
    },

    /// The session was interrupted by a shutdown signal.
    #[error("session interrupted")]
    Interrupted,
}
