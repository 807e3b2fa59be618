use serde::{Deserialize, Serialize};

/// Serialized form of a fixed-bucket histogram.
///
/// `counts[i]` is the number of samples in bucket `i`, `values[i]` is its exclusive upper boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedHistogram {
    pub counts: Vec<u64>,
    pub values: Vec<u64>,
}

impl SerializedHistogram {
    /// Total number of samples across all buckets.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Iterate over `(upper_boundary, count)` pairs.
    pub fn buckets(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.values.iter().copied().zip(self.counts.iter().copied())
    }
}
