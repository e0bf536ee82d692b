//! `update_price` publish path: at-most-one-in-flight-per-price gating with coalescing, and the
//! publish statistics attached to each price mirror.
//!
//! Shaped on a small hand-rolled in-flight-transaction state enum, the same idiom the original
//! admin tool's transaction submission helper used for tracking one outstanding signature at a
//! time.

use solana_sdk::signature::Signature;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub price: i64,
    pub conf: u64,
    pub status: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Submitted, the supervisor has a signature and is waiting for it to be confirmed at the
    /// publish commitment level.
    InFlight { signature: Signature },
}

/// The embedded publish-request singleton a [`crate::accounts::price::PriceMirror`] owns.
pub struct UpdatePriceRequest {
    state: State,
    pending: Option<Quote>,
    coalesced: u64,
}

/// What the caller of [`UpdatePriceRequest::update`] should do next.
pub enum UpdateOutcome {
    /// No publish is in flight; submit this quote now.
    Submit(Quote),
    /// A publish is already in flight; this quote overwrote the coalesced pending one and will
    /// be submitted once the in-flight transaction settles.
    Coalesced,
}

impl Default for UpdatePriceRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdatePriceRequest {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            pending: None,
            coalesced: 0,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, State::InFlight { .. })
    }

    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }

    /// At most one in-flight publish per price mirror: a call while a publish is awaiting
    /// signature confirmation overwrites the pending payload instead of enqueuing a second
    /// transaction.
    pub fn update(&mut self, quote: Quote) -> UpdateOutcome {
        match self.state {
            State::Idle => UpdateOutcome::Submit(quote),
            State::InFlight { .. } => {
                if self.pending.is_some() {
                    self.coalesced += 1;
                }
                self.pending = Some(quote);
                UpdateOutcome::Coalesced
            }
        }
    }

    pub fn on_submitted(&mut self, signature: Signature) {
        self.state = State::InFlight { signature };
    }

    /// The submitted transaction's signature reached the configured commitment, or it was
    /// rejected. Either way the in-flight slot frees up; if a quote was coalesced while we
    /// waited, it becomes the next thing to submit.
    pub fn on_settled(&mut self, result: Result<(), CoreError>) -> Option<UpdateOutcome> {
        self.state = State::Idle;
        if let Err(err) = result {
            log::warn!("publish transaction settled with an error: {err}");
        }
        self.pending.take().map(|quote| self.update(quote))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(price: i64) -> Quote {
        Quote {
            price,
            conf: 1,
            status: 1,
        }
    }

    #[test]
    fn first_update_submits_immediately() {
        let mut request = UpdatePriceRequest::new();
        assert!(matches!(
            request.update(quote(100)),
            UpdateOutcome::Submit(_)
        ));
    }

    #[test]
    fn a_second_update_before_confirmation_coalesces() {
        let mut request = UpdatePriceRequest::new();
        request.update(quote(100));
        request.on_submitted(Signature::new_unique());

        let outcome = request.update(quote(101));
        assert!(matches!(outcome, UpdateOutcome::Coalesced));
        assert!(request.is_in_flight());
    }

    #[test]
    fn never_two_simultaneously_on_the_wire() {
        let mut request = UpdatePriceRequest::new();
        request.update(quote(100));
        request.on_submitted(Signature::new_unique());
        request.update(quote(101));

        assert!(request.is_in_flight());
        let outcome = request.on_settled(Ok(()));
        assert!(matches!(outcome, Some(UpdateOutcome::Submit(q)) if q.price == 101));
    }

    #[test]
    fn coalescing_twice_is_counted_once_per_overwrite() {
        let mut request = UpdatePriceRequest::new();
        request.update(quote(100));
        request.on_submitted(Signature::new_unique());
        request.update(quote(101));
        request.update(quote(102));

        assert_eq!(request.coalesced_count(), 1);
    }
}
