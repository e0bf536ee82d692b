//! The daemon's internal error type.
//!
//! Everything below the supervisor's `tokio::select!` loop reports failures through
//! [`CoreError`] rather than `anyhow::Error`: callers that branch on *what kind* of failure
//! happened (the supervisor's reconnect-vs-give-up decision, the publish path's retry policy)
//! need a discriminant to match on, not just a message.

use derive_more::Display;

#[derive(Debug, Display, PartialEq, Eq, Clone)]
pub enum CoreError {
    /// The HTTP or WebSocket transport failed: connection refused, timed out, or dropped.
    #[display("transport error: {_0}")]
    Transport(String),
    /// A response didn't fit the JSON-RPC or wire protocol we expected from it.
    #[display("protocol error: {_0}")]
    Protocol(String),
    /// The on-chain program rejected a submitted transaction.
    #[display("on-chain rejection: {_0}")]
    OnChainReject(String),
    /// Account bytes failed a structural or invariant check (bad magic, truncated data, ...).
    #[display("integrity error: {_0}")]
    Integrity(String),
    /// An operation was attempted before its preconditions were met (e.g. publishing before the
    /// mapping chain has been mirrored).
    #[display("precondition not met: {_0}")]
    Precondition(String),
    /// The on-disk or command-line configuration is invalid.
    #[display("configuration error: {_0}")]
    Config(String),
}

impl std::error::Error for CoreError {}

impl CoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn on_chain_reject(message: impl Into<String>) -> Self {
        Self::OnChainReject(message.into())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_the_message() {
        let err = CoreError::integrity("bad magic number");
        assert_eq!(err.to_string(), "integrity error: bad magic number");
    }
}
