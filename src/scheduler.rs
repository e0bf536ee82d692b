//! Deterministic phase-hashed scheduling of price submissions across a publish interval, driven
//! by the supervisor's slot-subscribe tick.

use std::time::Duration;

use solana_program::pubkey::Pubkey;

/// Nothing documents why a prime near 1000 was chosen here; kept literally to preserve the
/// phase spread rather than "simplified" to a round number.
pub const FRACTION: u64 = 997;

/// `hash(pub_key) mod FRACTION`.
pub fn phase_hash(address: &Pubkey) -> u64 {
    let bytes = address.to_bytes();
    let mut hash: u64 = 0xcbf29ce484222325; // FNV-1a offset basis
    for byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash % FRACTION
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    hash: u64,
    address: Pubkey,
}

/// A sorted `Vec<(phase_hash, address)>`, maintained by insertion-sort on registration (entries
/// "one-step bubble suffices because insertions are rare").
pub struct Scheduler {
    entries: Vec<Entry>,
    interval: Duration,
    pub_base: Option<Duration>,
    next_index: usize,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            entries: Vec::new(),
            interval,
            pub_base: None,
            next_index: 0,
        }
    }

    pub fn register(&mut self, address: Pubkey) {
        let hash = phase_hash(&address);
        let position = self
            .entries
            .partition_point(|entry| entry.hash < hash);
        self.entries.insert(position, Entry { hash, address });
    }

    /// Called on each slot-subscribe tick: resets the publish cycle for the interval starting
    /// now.
    pub fn on_slot_tick(&mut self, slot_recv_time: Duration) {
        self.pub_base = Some(slot_recv_time);
        self.next_index = 0;
    }

    pub fn is_publishing(&self) -> bool {
        self.pub_base.is_some()
    }

    /// Returns every price address whose target time has been reached by `now`, advancing past
    /// them, in ascending-hash order. Clears the publishing cycle once every entry has
    /// fired.
    pub fn due(&mut self, now: Duration) -> Vec<Pubkey> {
        let Some(pub_base) = self.pub_base else {
            return Vec::new();
        };

        let mut fired = Vec::new();
        while self.next_index < self.entries.len() {
            let entry = self.entries[self.next_index];
            let target = pub_base + self.interval * entry.hash as u32 / FRACTION as u32;
            if now < target {
                break;
            }
            fired.push(entry.address);
            self.next_index += 1;
        }

        if self.next_index == self.entries.len() {
            self.pub_base = None;
        }

        fired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_keeps_entries_sorted_by_hash() {
        let mut scheduler = Scheduler::new(Duration::from_millis(300));
        for _ in 0..8 {
            scheduler.register(Pubkey::new_unique());
        }
        let hashes: Vec<u64> = scheduler.entries.iter().map(|entry| entry.hash).collect();
        let mut sorted = hashes.clone();
        sorted.sort_unstable();
        assert_eq!(hashes, sorted);
    }

    #[test]
    fn spreads_publishes_across_the_interval_by_phase_hash() {
        // Three prices whose hash mod 997 are {100, 500, 900} and P = 300ms. At t=0 none fires;
        // by t=271ms all three have.
        let mut scheduler = Scheduler::new(Duration::from_millis(300));
        scheduler.entries.push(Entry {
            hash: 100,
            address: Pubkey::new_unique(),
        });
        scheduler.entries.push(Entry {
            hash: 500,
            address: Pubkey::new_unique(),
        });
        scheduler.entries.push(Entry {
            hash: 900,
            address: Pubkey::new_unique(),
        });
        scheduler.on_slot_tick(Duration::ZERO);

        assert!(scheduler.due(Duration::from_millis(0)).is_empty());
        assert_eq!(scheduler.due(Duration::from_millis(31)).len(), 1);
        assert_eq!(scheduler.due(Duration::from_millis(151)).len(), 1);
        assert_eq!(scheduler.due(Duration::from_millis(271)).len(), 1);
        assert!(!scheduler.is_publishing());
    }

    #[test]
    fn clears_publishing_flag_once_every_entry_has_fired() {
        let mut scheduler = Scheduler::new(Duration::from_millis(10));
        scheduler.register(Pubkey::new_unique());
        scheduler.on_slot_tick(Duration::ZERO);
        assert!(scheduler.is_publishing());

        scheduler.due(Duration::from_millis(100));
        assert!(!scheduler.is_publishing());
    }
}
