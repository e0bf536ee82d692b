//! Per-price-mirror publish statistics.

use derive_more::{Add, AddAssign};

const LATENCY_BUCKETS: usize = 32;

#[derive(Debug, Clone, Copy, Default, Add, AddAssign)]
pub struct PublishStats {
    pub num_sent: u64,
    pub num_recv: u64,
    pub num_agg: u64,
    pub num_sub_drop: u64,
}

/// A histogram of slot latency between a publish transaction's `pub_slot` and the slot its
/// component quote actually lands in the aggregate at, bucketed geometrically so both sub-slot
/// and multi-slot latencies get useful resolution.
#[derive(Debug, Clone, Copy)]
pub struct LatencyHistogram {
    buckets: [u64; LATENCY_BUCKETS],
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self {
            buckets: [0; LATENCY_BUCKETS],
        }
    }
}

impl LatencyHistogram {
    pub fn record(&mut self, latency_slots: u64) {
        let bucket = Self::bucket_for(latency_slots);
        self.buckets[bucket] += 1;
    }

    pub fn get(&self, bucket: usize) -> u64 {
        self.buckets[bucket]
    }

    fn bucket_for(latency_slots: u64) -> usize {
        // Bucket i covers latencies in [2^(i-1), 2^i), with bucket 0 reserved for latency 0.
        if latency_slots == 0 {
            return 0;
        }
        let bucket = 64 - latency_slots.leading_zeros() as usize;
        bucket.min(LATENCY_BUCKETS - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_add_assign_accumulates() {
        let mut total = PublishStats::default();
        total += PublishStats {
            num_sent: 1,
            num_recv: 1,
            num_agg: 0,
            num_sub_drop: 0,
        };
        total += PublishStats {
            num_sent: 1,
            num_recv: 0,
            num_agg: 1,
            num_sub_drop: 1,
        };
        assert_eq!(total.num_sent, 2);
        assert_eq!(total.num_recv, 1);
        assert_eq!(total.num_agg, 1);
        assert_eq!(total.num_sub_drop, 1);
    }

    #[test]
    fn histogram_zero_latency_goes_to_bucket_zero() {
        let mut hist = LatencyHistogram::default();
        hist.record(0);
        assert_eq!(hist.get(0), 1);
    }

    #[test]
    fn histogram_caps_at_last_bucket() {
        let mut hist = LatencyHistogram::default();
        hist.record(u64::MAX);
        assert_eq!(hist.get(LATENCY_BUCKETS - 1), 1);
    }
}
