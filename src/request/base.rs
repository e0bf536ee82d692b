//! Common request lifecycle shared by every state-machine request.

use crate::error::CoreError;

/// `pending → ready → submitted → (responded | subscribed → confirmed) → done | error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created, but its preconditions (`get_is_ready`) are not yet satisfied.
    Pending,
    /// Preconditions satisfied; eligible to be drained and submitted by the supervisor.
    Ready,
    /// Sent over the RPC client; awaiting either a direct response or a subscription id.
    Submitted,
    /// A direct (non-subscription) response arrived.
    Responded,
    /// Subscribed to a signature at the configured commitment; awaiting notification.
    Subscribed,
    /// The subscribed-for notification arrived.
    Confirmed,
    /// Terminal success.
    Done,
    /// Terminal failure.
    Error(CoreError),
}

impl Lifecycle {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Lifecycle::Done | Lifecycle::Error(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Lifecycle::Ready)
    }
}

/// Preconditions a request checks before it can move from `Pending` to `Ready`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Readiness {
    pub rpc_connected: bool,
    pub has_block_hash: bool,
    pub has_mapping: bool,
}

impl Readiness {
    /// Requests that only touch the mapping account itself don't need `HAS_MAPPING` (they are
    /// what establishes it); requests that touch product/price accounts do.
    pub fn satisfied(&self, requires_mapping: bool) -> bool {
        self.rpc_connected && self.has_block_hash && (!requires_mapping || self.has_mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_requires_mapping_only_when_asked() {
        let readiness = Readiness {
            rpc_connected: true,
            has_block_hash: true,
            has_mapping: false,
        };
        assert!(readiness.satisfied(false));
        assert!(!readiness.satisfied(true));
    }

    #[test]
    fn terminal_states_are_done_or_error() {
        assert!(Lifecycle::Done.is_terminal());
        assert!(Lifecycle::Error(CoreError::transport("x")).is_terminal());
        assert!(!Lifecycle::Submitted.is_terminal());
    }
}
