//! Epoch-aligned, fixed-width time buckets.
//!
//! A bucket is the half-open interval `[start, start + width)` where `start`
//! is a multiple of `width` seconds counted from the Unix epoch. Alignment to
//! the epoch (never to a query's start) is what lets two different but
//! overlapping queries share cache entries.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tranche_types::TrancheError;

/// Validated bucket width in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketWidth {
    secs: i64,
    delta: TimeDelta,
}

impl BucketWidth {
    /// Width of `secs` seconds.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `secs` is not positive or too large to be
    /// represented as a time delta.
    pub fn from_secs(secs: i64) -> Result<Self, TrancheError> {
        if secs <= 0 {
            return Err(TrancheError::InvalidArg(format!(
                "bucket width must be positive, got {secs}s"
            )));
        }
        let delta = TimeDelta::try_seconds(secs).ok_or_else(|| {
            TrancheError::InvalidArg(format!("bucket width {secs}s is out of range"))
        })?;
        Ok(Self { secs, delta })
    }

    /// Width from a `Duration` that must be a whole number of seconds.
    ///
    /// # Errors
    /// Returns `InvalidArg` for zero, fractional or out-of-range durations.
    pub fn from_duration(d: Duration) -> Result<Self, TrancheError> {
        if d.subsec_nanos() != 0 {
            return Err(TrancheError::InvalidArg(format!(
                "bucket width must be a whole number of seconds, got {d:?}"
            )));
        }
        let secs = i64::try_from(d.as_secs())
            .map_err(|_| TrancheError::InvalidArg(format!("bucket width {d:?} is out of range")))?;
        Self::from_secs(secs)
    }

    /// Width in seconds.
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.secs
    }

    /// Width as a `Duration`.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.secs.unsigned_abs())
    }
}

impl TryFrom<Duration> for BucketWidth {
    type Error = TrancheError;

    fn try_from(d: Duration) -> Result<Self, Self::Error> {
        Self::from_duration(d)
    }
}

/// One epoch-aligned half-open interval `[start, end)`.
///
/// Equality, ordering and hashing consider `start` only.
#[derive(Debug, Clone, Copy)]
pub struct Bucket {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Bucket {
    fn aligned(start_secs: i64, width: BucketWidth) -> Result<Self, TrancheError> {
        let start = DateTime::from_timestamp(start_secs, 0).ok_or_else(out_of_range)?;
        let end = start
            .checked_add_signed(width.delta)
            .ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }

    /// Inclusive start of the bucket.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end of the bucket.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True if `t` falls in `[start, end)`.
    #[must_use]
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// True while the bucket's end has not passed (`end >= now`).
    ///
    /// An open bucket may still receive new upstream data.
    #[must_use]
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.end >= now
    }

    /// The bucket immediately following this one.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the next bucket would leave the representable
    /// UTC range.
    pub fn next(&self) -> Result<Self, TrancheError> {
        let width = self.end - self.start;
        let end = self.end.checked_add_signed(width).ok_or_else(out_of_range)?;
        Ok(Self {
            start: self.end,
            end,
        })
    }
}

impl PartialEq for Bucket {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
    }
}
impl Eq for Bucket {}

impl Hash for Bucket {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
    }
}

impl PartialOrd for Bucket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Bucket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
    }
}

fn out_of_range() -> TrancheError {
    TrancheError::InvalidArg("bucket boundary outside the representable UTC range".into())
}

/// Return the unique bucket of `width` whose interval contains `t`.
///
/// The start is `floor(t / width) * width` in Unix seconds; instants before
/// the epoch round towards negative infinity, so the result never depends on
/// the caller, the process, or the local timezone.
///
/// # Errors
/// Returns `InvalidArg` if the bucket boundaries are not representable.
pub fn bucket_containing(t: DateTime<Utc>, width: BucketWidth) -> Result<Bucket, TrancheError> {
    let w = width.as_secs();
    let start_secs = t
        .timestamp()
        .div_euclid(w)
        .checked_mul(w)
        .ok_or_else(out_of_range)?;
    Bucket::aligned(start_secs, width)
}

/// Return every bucket overlapping `[start, end)`, in chronological order.
///
/// The first bucket contains `start`; buckets are appended until one ends at
/// or after `end`. The result covers the range without gaps and with the
/// minimal number of buckets.
///
/// # Errors
/// Returns `InvalidRange` if `end <= start`, or `InvalidArg` if a boundary is
/// not representable.
pub fn buckets_overlapping(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    width: BucketWidth,
) -> Result<Vec<Bucket>, TrancheError> {
    if end <= start {
        return Err(TrancheError::invalid_range(start, end));
    }
    let mut current = bucket_containing(start, width)?;
    let mut buckets = vec![current];
    while current.end() < end {
        current = current.next()?;
        buckets.push(current);
    }
    Ok(buckets)
}

/// Number of buckets [`buckets_overlapping`] would return, without
/// materialising them.
///
/// # Errors
/// Returns `InvalidRange` if `end <= start`.
pub fn bucket_count(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    width: BucketWidth,
) -> Result<u64, TrancheError> {
    if end <= start {
        return Err(TrancheError::invalid_range(start, end));
    }
    let w = width.as_secs();
    let first = start.timestamp().div_euclid(w);
    let e = end.timestamp();
    // an end exactly on a boundary does not open the next bucket
    let last = if end.timestamp_subsec_nanos() == 0 && e.rem_euclid(w) == 0 {
        e.div_euclid(w) - 1
    } else {
        e.div_euclid(w)
    };
    Ok((last - first).unsigned_abs() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DAY: i64 = 86_400;

    fn week() -> BucketWidth {
        BucketWidth::from_secs(7 * DAY).unwrap()
    }

    #[test]
    fn aligns_to_epoch_multiples() {
        // 1970-01-01 was a Thursday; weekly buckets start on Thursdays.
        let t = Utc.with_ymd_and_hms(2024, 1, 3, 15, 30, 0).unwrap();
        let b = bucket_containing(t, week()).unwrap();
        assert_eq!(b.start().timestamp() % (7 * DAY), 0);
        assert!(b.contains(t));
        assert_eq!(b.start(), Utc.with_ymd_and_hms(2023, 12, 28, 0, 0, 0).unwrap());
        assert_eq!(b.end(), Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn pre_epoch_instants_floor_downwards() {
        let t = DateTime::from_timestamp(-1, 0).unwrap();
        let b = bucket_containing(t, week()).unwrap();
        assert_eq!(b.start().timestamp(), -7 * DAY);
        assert_eq!(b.end().timestamp(), 0);
    }

    #[test]
    fn sub_second_instant_stays_in_its_bucket() {
        let edge = DateTime::from_timestamp(7 * DAY - 1, 999_999_999).unwrap();
        let b = bucket_containing(edge, week()).unwrap();
        assert_eq!(b.start().timestamp(), 0);
        assert!(b.contains(edge));
    }

    #[test]
    fn boundary_instant_starts_new_bucket() {
        let t = DateTime::from_timestamp(7 * DAY, 0).unwrap();
        let b = bucket_containing(t, week()).unwrap();
        assert_eq!(b.start(), t);
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        let t = DateTime::from_timestamp(10 * DAY, 0).unwrap();
        let e = buckets_overlapping(t, t, week()).unwrap_err();
        assert!(matches!(e, TrancheError::InvalidRange { .. }));
        let earlier = DateTime::from_timestamp(DAY, 0).unwrap();
        assert!(buckets_overlapping(t, earlier, week()).is_err());
    }

    #[test]
    fn range_ending_on_boundary_does_not_spill_over() {
        let start = DateTime::from_timestamp(0, 0).unwrap();
        let end = DateTime::from_timestamp(14 * DAY, 0).unwrap();
        let buckets = buckets_overlapping(start, end, week()).unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[1].end(), end);
    }

    #[test]
    fn count_matches_materialised_buckets() {
        let start = DateTime::from_timestamp(DAY, 0).unwrap();
        let on_boundary = DateTime::from_timestamp(14 * DAY, 0).unwrap();
        let past_boundary = DateTime::from_timestamp(14 * DAY, 1).unwrap();
        assert_eq!(bucket_count(start, on_boundary, week()).unwrap(), 2);
        assert_eq!(bucket_count(start, past_boundary, week()).unwrap(), 3);
        assert!(bucket_count(start, start, week()).is_err());
    }

    #[test]
    fn equality_ignores_end() {
        let a = bucket_containing(DateTime::from_timestamp(0, 0).unwrap(), week()).unwrap();
        let day = BucketWidth::from_secs(DAY).unwrap();
        let b = bucket_containing(DateTime::from_timestamp(0, 0).unwrap(), day).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn width_validation() {
        assert!(BucketWidth::from_secs(0).is_err());
        assert!(BucketWidth::from_secs(-5).is_err());
        assert!(BucketWidth::from_duration(Duration::from_millis(1_500)).is_err());
        assert_eq!(
            BucketWidth::from_duration(Duration::from_secs(60))
                .unwrap()
                .as_secs(),
            60
        );
    }
}
