//! Account mirrors: `mapping`, `product`, `price` mirror objects with subscription,
//! deserialization, invariant checks and change fan-out.

pub mod mapping;
pub mod price;
pub mod product;

/// Shared subscription lifecycle for every mirror kind: on reconnect, internal state resets to
/// `subscribe` and is re-issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorState {
    /// Not yet subscribed, or reset back to this state by a reconnect.
    Subscribe,
    /// `account_subscribe` has been sent; awaiting the subscription's first notification.
    SentSubscribe,
    /// At least one valid account payload has been received and deserialized.
    Ready,
    /// Deserialization rejected the last payload received; the
    /// mirror stops accepting updates until `reset()`.
    Error,
}

impl MirrorState {
    pub fn reset(&mut self) {
        *self = MirrorState::Subscribe;
    }
}
