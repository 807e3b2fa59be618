//! Bounded, fixed-bucket histogram over non-negative integer samples.
//!
//! The domain `[0, max)` is split into `ceil(max / bucket_size)` buckets.
//! Samples past the last bucket are clipped into it rather than dropped,
//! and every raw sample is kept until [`SimpleHistogram::reset`] so exact
//! percentiles can be recomputed downstream.
use thiserror::Error;

use runlens_model::SerializedHistogram;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistogramError {
    #[error("invalid histogram sample: {0}")]
    InvalidSample(String),

    #[error("invalid histogram bounds: bucket size {bucket_size} with max {max}")]
    InvalidBounds { max: u64, bucket_size: u64 },
}

/// Upper limit on the number of buckets a histogram may allocate.
pub const MAX_BUCKETS: u64 = 1 << 20;

#[derive(Debug, Clone)]
pub struct SimpleHistogram {
    max: u64,
    bucket_size: u64,
    counts: Vec<u64>,
    values: Vec<u64>,
}

impl SimpleHistogram {
    /// Number of buckets for the given bounds, without allocating anything.
    ///
    /// Fails if `bucket_size` is zero, greater than `max`, or would need more than
    /// [`MAX_BUCKETS`] buckets.
    pub fn bucket_count_for(max: u64, bucket_size: u64) -> Result<usize, HistogramError> {
        if bucket_size == 0 || bucket_size > max {
            return Err(HistogramError::InvalidBounds { max, bucket_size });
        }
        let buckets = max.div_ceil(bucket_size);
        if buckets > MAX_BUCKETS {
            return Err(HistogramError::InvalidBounds { max, bucket_size });
        }
        usize::try_from(buckets).map_err(|_| HistogramError::InvalidBounds { max, bucket_size })
    }

    /// Create an empty histogram. Bounds are checked by [`Self::bucket_count_for`].
    pub fn new(max: u64, bucket_size: u64) -> Result<Self, HistogramError> {
        let buckets = Self::bucket_count_for(max, bucket_size)?;
        Ok(Self {
            max,
            bucket_size,
            counts: vec![0; buckets],
            values: Vec::new(),
        })
    }

    #[inline]
    pub fn max(&self) -> u64 {
        self.max
    }

    #[inline]
    pub fn bucket_size(&self) -> u64 {
        self.bucket_size
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    /// Number of recorded samples since the last reset.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Record one sample.
    ///
    /// Negative values are rejected with [`HistogramError::InvalidSample`] and leave the histogram untouched.
    pub fn record(&mut self, value: i64) -> Result<(), HistogramError> {
        let value = u64::try_from(value)
            .map_err(|_| HistogramError::InvalidSample(format!("negative value {value}")))?;

        let last = self.counts.len() - 1;
        let idx = usize::try_from(value / self.bucket_size).map_or(last, |i| i.min(last));
        self.counts[idx] += 1;
        self.values.push(value);
        Ok(())
    }

    /// Record a duration in seconds, rounded to the nearest integer (halves round up).
    pub fn record_seconds(&mut self, secs: f64) -> Result<(), HistogramError> {
        if !secs.is_finite() {
            return Err(HistogramError::InvalidSample(format!("non-finite value {secs}")));
        }
        let rounded = (secs + 0.5).floor();
        if rounded < 0.0 {
            return Err(HistogramError::InvalidSample(format!("negative value {secs}")));
        }
        // `as` saturates at i64::MAX, which lands in the last bucket anyway.
        self.record(rounded as i64)
    }

    /// Exclusive upper boundary of every bucket.
    pub fn boundaries(&self) -> Vec<u64> {
        (1..=self.counts.len() as u64)
            .map(|i| i * self.bucket_size)
            .collect()
    }

    /// Bucket boundaries and current counts.
    pub fn serialize(&self) -> SerializedHistogram {
        SerializedHistogram {
            counts: self.counts.clone(),
            values: self.boundaries(),
        }
    }

    /// Same shape as [`SimpleHistogram::serialize`] with all counts at zero.
    pub fn serialize_empty(&self) -> SerializedHistogram {
        SerializedHistogram {
            counts: vec![0; self.counts.len()],
            values: self.boundaries(),
        }
    }

    /// Every recorded sample, in insertion order.
    pub fn get_all_values(&self) -> Vec<u64> {
        self.values.clone()
    }

    /// Clear bucket counts and raw samples.
    pub fn reset(&mut self) {
        self.counts.fill(0);
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_sample_per_bucket() {
        let mut h = SimpleHistogram::new(30, 10).unwrap();
        for v in [5, 15, 25] {
            h.record(v).unwrap();
        }

        let s = h.serialize();
        assert_eq!(s.counts, vec![1, 1, 1]);
        assert_eq!(s.values, vec![10, 20, 30]);
    }

    #[test]
    fn out_of_range_value_is_clipped_into_last_bucket() {
        let mut h = SimpleHistogram::new(30, 10).unwrap();
        h.record(1000).unwrap();
        h.record(30).unwrap();

        assert_eq!(h.serialize().counts, vec![0, 0, 2]);
        assert_eq!(h.get_all_values(), vec![1000, 30]);
    }

    #[test]
    fn too_many_buckets_are_rejected_before_allocation() {
        assert!(matches!(
            SimpleHistogram::new(u64::MAX, 1),
            Err(HistogramError::InvalidBounds { .. })
        ));
        assert!(SimpleHistogram::bucket_count_for(MAX_BUCKETS + 1, 1).is_err());
        assert_eq!(
            SimpleHistogram::bucket_count_for(5_400, 10).unwrap(),
            540
        );
    }

    #[test]
    fn zero_lands_in_first_bucket() {
        let mut h = SimpleHistogram::new(30, 10).unwrap();
        h.record(0).unwrap();
        assert_eq!(h.serialize().counts, vec![1, 0, 0]);
    }

    #[test]
    fn boundaries_fall_into_upper_bucket() {
        let mut h = SimpleHistogram::new(30, 10).unwrap();
        h.record(10).unwrap();
        h.record(19).unwrap();
        assert_eq!(h.serialize().counts, vec![0, 2, 0]);
    }

    #[test]
    fn negative_value_is_rejected_without_side_effects() {
        let mut h = SimpleHistogram::new(30, 10).unwrap();
        let err = h.record(-1).unwrap_err();

        assert!(matches!(err, HistogramError::InvalidSample(_)));
        assert!(h.is_empty());
        assert_eq!(h.serialize().total(), 0);
    }

    #[test]
    fn bucket_count_rounds_up() {
        let h = SimpleHistogram::new(25, 10).unwrap();
        assert_eq!(h.bucket_count(), 3);
        assert_eq!(h.boundaries(), vec![10, 20, 30]);
    }

    #[test]
    fn default_task_manager_shape() {
        let h = SimpleHistogram::new(5400, 10).unwrap();
        assert_eq!(h.bucket_count(), 540);
        assert_eq!(h.boundaries().last(), Some(&5400));
    }

    #[test]
    fn rejects_invalid_bounds() {
        assert_eq!(
            SimpleHistogram::new(10, 0).unwrap_err(),
            HistogramError::InvalidBounds { max: 10, bucket_size: 0 }
        );
        assert!(SimpleHistogram::new(10, 11).is_err());
        assert!(SimpleHistogram::new(10, 10).is_ok());
    }

    #[test]
    fn record_seconds_rounds_half_up() {
        let mut h = SimpleHistogram::new(30, 10).unwrap();
        h.record_seconds(9.5).unwrap();
        h.record_seconds(9.49).unwrap();
        h.record_seconds(-0.4).unwrap();

        assert_eq!(h.get_all_values(), vec![10, 9, 0]);
    }

    #[test]
    fn record_seconds_rejects_bad_input() {
        let mut h = SimpleHistogram::new(30, 10).unwrap();

        assert!(h.record_seconds(-3.0).is_err());
        assert!(h.record_seconds(f64::NAN).is_err());
        assert!(h.record_seconds(f64::INFINITY).is_err());
        assert!(h.is_empty());
    }

    #[test]
    fn reset_clears_counts_and_values() {
        let mut h = SimpleHistogram::new(30, 10).unwrap();
        h.record(5).unwrap();
        h.record(50).unwrap();
        h.reset();

        assert!(h.get_all_values().is_empty());
        assert_eq!(h.serialize(), h.serialize_empty());
    }
}
