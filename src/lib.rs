//! HdrHist provides recording and analyzing of sampled data value counts across a large,
//! configurable integer value range with configurable precision within the range. The resulting
//! "HDR" histogram allows for fast and accurate analysis of the extreme ranges of data with
//! non-normal distributions, like latency.
//!
//! # HDR histograms
//!
//! A histogram could be configured to track the counts of observed integer values between 0 and
//! 3,600,000,000 while maintaining a value precision of 3 significant digits across that range.
//! Value quantization within the range will thus be no larger than 1/1,000th (or 0.1%) of any
//! value. Such a histogram could be used to track and analyze the counts of observed response
//! times ranging between 1 microsecond and 1 hour in magnitude, while maintaining a value
//! resolution of 1 microsecond up to 1 millisecond, a resolution of 1 millisecond (or better) up
//! to one second, and a resolution of 1 second (or better) up to 1,000 seconds.
//!
//! Recording a sample is a constant-time bucket index computation plus one counter increment; no
//! searching or iteration is ever involved, and (with auto-resize off) no allocation either. The
//! memory footprint depends solely on the dynamic range and precision chosen, not on how many
//! samples have been recorded.
//!
//! # Recording samples
//!
//! A histogram instance is created using the `::new` methods on the `Histogram` struct, or via
//! [`Histogram::builder`]. The `new` constructors come in three variants: `new`, `new_with_max`,
//! and `new_with_bounds`. The first of these only sets the required precision of the sampled
//! data, but leaves the value range open such that any value may be recorded. A `Histogram`
//! created this way (or one where auto-resize has been explicitly enabled) will automatically
//! resize itself if a value that is too large to fit in the current dataset is encountered.
//! `new_with_max` sets an upper bound on the values to be recorded, and disables auto-resizing,
//! thus preventing any re-allocation during recording. If the application attempts to record a
//! larger value than this maximum bound, the record call will fail. Finally, `new_with_bounds`
//! restricts the lowest representible value of the dataset, such that a smaller range needs to
//! be covered (thus reducing the overall allocation size).
//!
//! For example the example below shows how to create a `Histogram` that can count values in the
//! `[1..3600000]` range with 1% precision, which could be used to track latencies in the range
//! `[1 msec..1 hour]`.
//!
//! ```
//! use hdrhist::Histogram;
//! let mut hist = Histogram::<u64>::new_with_bounds(1, 60 * 60 * 1000, 2).unwrap();
//!
//! // samples can be recorded using .record, which will error if the value is too small or large
//! hist.record(54321).expect("value 54321 should be in range");
//!
//! // for ergonomics, samples can also be recorded with +=
//! // this call will panic if the value is out of range!
//! hist += 54321;
//!
//! // if the code that generates the values is subject to Coordinated Omission,
//! // the self-correcting record method should be used instead.
//! // for example, if the expected sampling interval is 10 msec:
//! hist.record_correct(54321, 10).expect("value 54321 should be in range");
//! ```
//!
//! Note the `u64` annotation. This type can be changed to reduce the storage overhead for all
//! the histogram bins, at the cost of a risk of saturating if a large number of samples end up
//! in the same bin. Histograms whose bins are mostly empty can instead use the packed storage
//! kind ([`Histogram::builder`] with `packed(true)`), which keeps 64-bit logical bins but stores
//! each one in as few bytes as its count needs.
//!
//! # Querying samples
//!
//! At any time, the histogram can be queried to return interesting statistical measurements,
//! such as the total number of recorded samples, or the value at a given percentile:
//!
//! ```
//! use hdrhist::Histogram;
//! let hist = Histogram::<u64>::new(2).unwrap();
//! // ...
//! println!("# of samples: {}", hist.len());
//! println!("99.9'th percentile: {}", hist.value_at_percentile(99.9));
//! ```
//!
//! Several useful iterators are also provided for quickly getting an overview of the dataset.
//! The simplest one is `iter_recorded()`, which yields one item for every non-empty sample bin.
//!
//! ```
//! use hdrhist::Histogram;
//! let hist = Histogram::<u64>::new(2).unwrap();
//! // ...
//! for v in hist.iter_recorded() {
//!     println!("{}'th percentile of data is {} with {} samples",
//!              v.percentile(), v.value_iterated_to(), v.count_at_value());
//! }
//! ```
//!
//! A formatted percentile distribution (the classic `Value / Percentile / TotalCount /
//! 1/(1-Percentile)` table, or its CSV variant) can be written to any `io::Write` with
//! [`Histogram::output_percentile_distribution`].
//!
//! For interval sampling -- handing a stable snapshot to a reader thread while recording
//! continues -- see [`recorder::Recorder`], which flips between two histograms so that neither
//! side ever observes a half-updated one.
//!
//! # Limitations and Caveats
//!
//! A number of features from the wider HdrHistogram lineage are out of scope here and left to
//! external collaborators: histogram serialization and encoding/decoding, the interval log
//! reader/writer, floating-point sample values, and concurrent recording from multiple producer
//! threads (the `Recorder` flip supports a single producer plus a single reader, serialized by
//! the host).

#![warn(missing_docs)]

use std::borrow::Borrow;
use std::cmp;
use std::convert::TryFrom;
use std::marker::PhantomData;
use std::ops::{AddAssign, SubAssign};

mod core;
pub mod errors;
pub mod iterators;
pub mod recorder;
mod report;
mod storage;

#[cfg(test)]
mod tests;

pub use crate::core::counter::Counter;
pub use crate::errors::*;

use crate::storage::Counts;

/// Builder default for the highest trackable value: the largest integer a 64-bit float can still
/// represent exactly, so counts keep round-tripping through double-based consumers.
const DEFAULT_HIGHEST_TRACKABLE_VALUE: u64 = (1 << 53) - 1;

/// A sampled-value histogram over `[lowest_discernible_value, highest_trackable_value]` with a
/// configured number of significant value digits.
///
/// The value range is covered by buckets of exponentially growing cell width: bucket `k` holds
/// cells `2^k` units wide, and each bucket splits into a power-of-two number of sub-bucket
/// cells chosen so that cell width never exceeds the requested precision. Values are mapped to
/// cells with shift/mask arithmetic only.
#[derive(Debug, Clone)]
pub struct Histogram<C: Counter> {
    pub(crate) auto_resize: bool,

    pub(crate) highest_trackable_value: u64,
    pub(crate) lowest_discernible_value: u64,
    pub(crate) significant_value_digits: u8,

    pub(crate) bucket_count: u8,
    pub(crate) sub_bucket_count: u32,
    pub(crate) sub_bucket_half_count: u32,
    pub(crate) sub_bucket_half_count_magnitude: u8,
    pub(crate) sub_bucket_mask: u64,

    pub(crate) unit_magnitude: u8,
    pub(crate) unit_magnitude_mask: u64,

    pub(crate) leading_zero_count_base: u8,

    // max is stored with the unit-magnitude bits forced on, min with them forced off, so both
    // are exact cell-equivalent values regardless of what raw values were recorded
    pub(crate) max_value: u64,
    pub(crate) min_non_zero_value: u64,

    pub(crate) total_count: u64,

    pub(crate) start_timestamp_msec: u64,
    pub(crate) end_timestamp_msec: u64,
    pub(crate) tag: Option<String>,

    // ties interval snapshots back to the Recorder that produced them; 0 when unowned
    pub(crate) containing_instance_id: u64,

    pub(crate) counts: Counts<C>,
}

/// Configures and creates a [`Histogram`].
///
/// Defaults: lowest discernible value 1, highest trackable value 2^53 - 1, three significant
/// value digits, auto-resize off, dense storage. The storage width is the counter type
/// parameter (`u32` for dense-32, `u64` for dense-64); `packed(true)` selects the sparse
/// packed representation instead.
#[derive(Debug, Clone)]
pub struct Builder<C: Counter> {
    lowest_discernible_value: u64,
    highest_trackable_value: u64,
    significant_value_digits: u8,
    auto_resize: bool,
    packed: bool,
    counter: PhantomData<C>,
}

impl<C: Counter> Builder<C> {
    /// Set the lowest value that can be discerned from 0. Must be >= 1; may be internally
    /// rounded down to the nearest power of 2.
    pub fn lowest_discernible_value(mut self, value: u64) -> Builder<C> {
        self.lowest_discernible_value = value;
        self
    }

    /// Set the highest value to be tracked. Must be >= 2 * the lowest discernible value.
    pub fn highest_trackable_value(mut self, value: u64) -> Builder<C> {
        self.highest_trackable_value = value;
        self
    }

    /// Set the number of significant decimal digits to which the histogram will maintain value
    /// resolution and separation. Must be in `[0, 5]`.
    pub fn significant_value_digits(mut self, digits: u8) -> Builder<C> {
        self.significant_value_digits = digits;
        self
    }

    /// Control whether the histogram grows its trackable range on demand instead of failing
    /// over-range records.
    pub fn auto_resize(mut self, enabled: bool) -> Builder<C> {
        self.auto_resize = enabled;
        self
    }

    /// Use the packed counts representation: 64-bit logical bins stored in as few bytes as each
    /// count needs. Worthwhile when most bins stay empty.
    pub fn packed(mut self, enabled: bool) -> Builder<C> {
        self.packed = enabled;
        self
    }

    /// Build the configured histogram.
    pub fn build(self) -> Result<Histogram<C>, CreationError> {
        let mut h = Histogram::with_storage(
            self.lowest_discernible_value,
            self.highest_trackable_value,
            self.significant_value_digits,
            self.packed,
        )?;
        h.auto_resize = self.auto_resize;
        Ok(h)
    }
}

// construction

impl<C: Counter> Histogram<C> {
    /// Construct an auto-resizing histogram with a lowest discernible value of 1 and an
    /// auto-adjusting highest trackable value.
    ///
    /// `sigfig` specifies the precision to use. This is the number of significant decimal digits
    /// to which the histogram will maintain value resolution and separation. Must be in the
    /// range `[0, 5]`.
    pub fn new(sigfig: u8) -> Result<Histogram<C>, CreationError> {
        let mut h = Self::new_with_bounds(1, 2, sigfig)?;
        h.auto_resize = true;
        Ok(h)
    }

    /// Construct a histogram given the highest value to be tracked and a number of significant
    /// decimal digits. The histogram will be constructed to implicitly track (distinguish from
    /// 0) values as low as 1.
    pub fn new_with_max(high: u64, sigfig: u8) -> Result<Histogram<C>, CreationError> {
        Self::new_with_bounds(1, high, sigfig)
    }

    /// Construct a histogram given the lowest and highest values to be tracked and a number of
    /// significant decimal digits.
    ///
    /// Providing a `low` is useful in situations where the units used for the histogram's
    /// values are much smaller than the minimal accuracy required. E.g. when tracking time
    /// values stated in nanosecond units, where the minimal accuracy required is a microsecond,
    /// the proper value for `low` would be 1000. `low` must be >= 1, `high` >= 2 * `low`, and
    /// `sigfig` in `[0, 5]`.
    pub fn new_with_bounds(low: u64, high: u64, sigfig: u8) -> Result<Histogram<C>, CreationError> {
        Self::with_storage(low, high, sigfig, false)
    }

    /// Begin building a histogram, choosing bounds, precision, auto-resize, and the storage
    /// kind.
    pub fn builder() -> Builder<C> {
        Builder {
            lowest_discernible_value: 1,
            highest_trackable_value: DEFAULT_HIGHEST_TRACKABLE_VALUE,
            significant_value_digits: 3,
            auto_resize: false,
            packed: false,
            counter: PhantomData,
        }
    }

    /// Construct a histogram with the same range settings, precision, auto-resize flag, and
    /// storage kind as a given source histogram, but none of its contents.
    pub fn new_from<F: Counter>(source: &Histogram<F>) -> Histogram<C> {
        let mut h = Self::with_storage(
            source.lowest_discernible_value,
            source.highest_trackable_value,
            source.significant_value_digits,
            source.counts.is_packed(),
        )
        .expect("source histogram parameters were already validated");
        h.auto_resize = source.auto_resize;
        // match a source that was auto-resized past its construction parameters
        if source.counts.len() > h.counts.len() {
            h.bucket_count = source.bucket_count;
            h.counts.resize(source.counts.len());
        }
        h
    }

    fn with_storage(
        low: u64,
        high: u64,
        sigfig: u8,
        packed: bool,
    ) -> Result<Histogram<C>, CreationError> {
        if low < 1 {
            return Err(CreationError::LowIsZero);
        }
        if low > u64::max_value() / 2 {
            return Err(CreationError::LowExceedsMax);
        }
        if high < 2 * low {
            return Err(CreationError::HighLessThanTwiceLow);
        }
        if sigfig > 5 {
            return Err(CreationError::SigFigExceedsMax);
        }

        // Given a 3 decimal point accuracy, the expectation is obviously for "+/- 1 unit at
        // 1000". It also means that it's "ok to be +/- 2 units at 2000". The "tricky" thing is
        // that it is NOT ok to be +/- 2 units at 1999. Only starting at 2000. So internally, we
        // need to maintain single unit resolution to 2x 10^decimal_points.
        let largest_value_with_single_unit_resolution = 2 * 10_u32.pow(u32::from(sigfig));

        let unit_magnitude = (63 - low.leading_zeros()) as u8;
        let unit_magnitude_mask = (1_u64 << unit_magnitude) - 1;

        // We need to maintain power-of-two sub_bucket_count (for clean direct indexing) that is
        // large enough to provide unit resolution to at least
        // largest_value_with_single_unit_resolution. So figure out its nearest power-of-two
        // (rounded up), and use that.
        let sub_bucket_count_magnitude =
            (32 - (largest_value_with_single_unit_resolution - 1).leading_zeros()) as u8;
        if u32::from(unit_magnitude) + u32::from(sub_bucket_count_magnitude) > 63 {
            // cells of the first bucket would not fit in a u64
            return Err(CreationError::CannotRepresentSigFigBeyondLow);
        }

        let sub_bucket_half_count_magnitude = cmp::max(sub_bucket_count_magnitude, 1) - 1;
        let sub_bucket_count = 1_u32 << (sub_bucket_half_count_magnitude + 1);
        let sub_bucket_half_count = sub_bucket_count / 2;
        let sub_bucket_mask = (u64::from(sub_bucket_count) - 1) << unit_magnitude;

        let bucket_count = Self::buckets_needed_to_cover(high, sub_bucket_count, unit_magnitude);
        let counts_len =
            Self::counts_array_len(bucket_count, sub_bucket_count, sub_bucket_half_count)
                .ok_or(CreationError::UsizeTypeTooSmall)?;

        Ok(Histogram {
            auto_resize: false,

            highest_trackable_value: high,
            lowest_discernible_value: low,
            significant_value_digits: sigfig,

            bucket_count,
            sub_bucket_count,
            sub_bucket_half_count,
            sub_bucket_half_count_magnitude,
            sub_bucket_mask,

            unit_magnitude,
            unit_magnitude_mask,

            // subtract the bits used by the largest value in bucket 0, for the
            // bucket_for() fast path
            leading_zero_count_base: 64 - unit_magnitude - sub_bucket_half_count_magnitude - 1,

            max_value: 0,
            min_non_zero_value: u64::max_value(),

            total_count: 0,

            start_timestamp_msec: 0,
            end_timestamp_msec: 0,
            tag: None,

            containing_instance_id: 0,

            counts: if packed {
                Counts::packed(counts_len)
            } else {
                Counts::dense(counts_len)
            },
        })
    }

    /// The k'th bucket can express from `0 * 2^k` to `sub_bucket_count * 2^k` in units of `2^k`.
    fn buckets_needed_to_cover(value: u64, sub_bucket_count: u32, unit_magnitude: u8) -> u8 {
        let mut smallest_untrackable_value = u64::from(sub_bucket_count) << unit_magnitude;

        // always have at least 1 bucket
        let mut buckets_needed = 1;
        while smallest_untrackable_value <= value {
            if smallest_untrackable_value > u64::max_value() / 2 {
                // next shift will overflow, meaning that bucket could represent values up to
                // ones greater than u64::max_value, so it's the last bucket
                return buckets_needed + 1;
            }
            smallest_untrackable_value <<= 1;
            buckets_needed += 1;
        }
        buckets_needed
    }

    /// If we have N such that `sub_bucket_count * 2^N` > max value, we need storage for N+1
    /// buckets, each with enough slots to hold the top half of the sub_bucket_count (the lower
    /// half is covered by previous buckets), and the +1 being used for the lower half of the
    /// 0'th bucket.
    fn counts_array_len(
        bucket_count: u8,
        sub_bucket_count: u32,
        sub_bucket_half_count: u32,
    ) -> Option<usize> {
        let half = usize::try_from(sub_bucket_half_count).ok()?;
        let full = usize::try_from(sub_bucket_count).ok()?;
        usize::from(bucket_count - 1).checked_mul(half)?.checked_add(full)
    }

    /// Grow bucket coverage (and the counts store) so `value` becomes representable, then
    /// re-derive the highest trackable value as the exact top of the new last cell.
    fn resize_to_cover(&mut self, value: u64) -> Result<(), UsizeTypeTooSmall> {
        let bucket_count =
            Self::buckets_needed_to_cover(value, self.sub_bucket_count, self.unit_magnitude);
        let counts_len =
            Self::counts_array_len(bucket_count, self.sub_bucket_count, self.sub_bucket_half_count)
                .ok_or(UsizeTypeTooSmall)?;

        // growth only appends buckets, so existing cells keep their indices
        self.bucket_count = bucket_count;
        self.counts.resize(counts_len);
        self.highest_trackable_value =
            self.highest_equivalent(self.value_for(self.last_index()));
        Ok(())
    }
}

// accessors

impl<C: Counter> Histogram<C> {
    /// Get the total number of samples recorded.
    pub fn len(&self) -> u64 {
        self.total_count
    }

    /// Returns true if this histogram has no recorded values.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Get the number of distinct counts cells in the histogram.
    pub fn distinct_values(&self) -> usize {
        self.counts.len()
    }

    /// Get the number of buckets the value range is currently covered by.
    pub fn buckets(&self) -> u8 {
        self.bucket_count
    }

    /// Get the index of the last counts cell.
    pub fn last_index(&self) -> usize {
        self.counts.len() - 1
    }

    /// Get the configured lowest discernible value.
    pub fn low(&self) -> u64 {
        self.lowest_discernible_value
    }

    /// Get the highest trackable value. May grow over time if auto-resize is enabled.
    pub fn high(&self) -> u64 {
        self.highest_trackable_value
    }

    /// Get the configured number of significant value digits.
    pub fn sigfig(&self) -> u8 {
        self.significant_value_digits
    }

    /// Returns true if the histogram grows its range on demand.
    pub fn is_auto_resize(&self) -> bool {
        self.auto_resize
    }

    /// Control whether or not the histogram can auto-resize and auto-adjust its highest
    /// trackable value.
    pub fn set_auto_resize(&mut self, enabled: bool) {
        self.auto_resize = enabled;
    }

    /// The start of the interval this histogram covers, in milliseconds since the epoch.
    /// 0 when never set.
    pub fn start_timestamp_msec(&self) -> u64 {
        self.start_timestamp_msec
    }

    /// Set the start of the interval this histogram covers.
    pub fn set_start_timestamp_msec(&mut self, msec: u64) {
        self.start_timestamp_msec = msec;
    }

    /// The end of the interval this histogram covers, in milliseconds since the epoch.
    /// 0 when never set.
    pub fn end_timestamp_msec(&self) -> u64 {
        self.end_timestamp_msec
    }

    /// Set the end of the interval this histogram covers.
    pub fn set_end_timestamp_msec(&mut self, msec: u64) {
        self.end_timestamp_msec = msec;
    }

    /// The tag attached to this histogram, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Attach a tag to this histogram, or clear it with `None`.
    pub fn set_tag(&mut self, tag: Option<String>) {
        self.tag = tag;
    }

    pub(crate) fn count_at_index(&self, index: usize) -> C {
        self.counts.get(index)
    }
}

// cell index math

impl<C: Counter> Histogram<C> {
    /// Return the lowest (and therefore highest precision) bucket index that can represent the
    /// value.
    fn bucket_for(&self, value: u64) -> u8 {
        // Calculates the number of powers of two by which the value is greater than the biggest
        // value that fits in bucket 0. This is the bucket index since each successive bucket can
        // hold a value 2x greater. The mask maps small values to bucket 0.
        self.leading_zero_count_base - (value | self.sub_bucket_mask).leading_zeros() as u8
    }

    fn sub_bucket_for(&self, value: u64, bucket_index: u8) -> u32 {
        // For bucket_index 0, this is just value, so it may be anywhere in 0 to
        // sub_bucket_count. For other bucket_index, this will always end up in the top half of
        // sub_bucket_count: assume that for some bucket k > 0, this calculation will yield a
        // value in the bottom half of 0 to sub_bucket_count. Then, because of how buckets
        // overlap, it would have also been in the top half of bucket k-1, and therefore would
        // have returned k-1 in bucket_for(). Since we would then shift it one fewer bits here,
        // it would be twice as big, and therefore in the top half of sub_bucket_count.
        (value >> (bucket_index + self.unit_magnitude)) as u32
    }

    fn index_for(&self, value: u64) -> usize {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);

        debug_assert!(sub_bucket_index < self.sub_bucket_count);
        debug_assert!(bucket_index == 0 || sub_bucket_index >= self.sub_bucket_half_count);

        // Calculate the index for the first entry that will be used in the bucket (halfway
        // through sub_bucket_count). For bucket_index 0, all sub_bucket_count entries may be
        // used, but bucket_base_index is still set in the middle.
        let bucket_base_index =
            (usize::from(bucket_index) + 1) << self.sub_bucket_half_count_magnitude;

        // The offset in the bucket is negative only in the lower half of bucket 0, which
        // bucket_base_index's half-count bias exactly absorbs.
        (bucket_base_index as isize + sub_bucket_index as isize
            - self.sub_bucket_half_count as isize) as usize
    }

    /// Get the lowest value of the cell at `index`.
    pub fn value_for(&self, index: usize) -> u64 {
        let mut bucket_index = (index >> self.sub_bucket_half_count_magnitude) as isize - 1;
        let mut sub_bucket_index = (index & (self.sub_bucket_half_count as usize - 1))
            + self.sub_bucket_half_count as usize;
        if bucket_index < 0 {
            // lower half of bucket 0
            sub_bucket_index -= self.sub_bucket_half_count as usize;
            bucket_index = 0;
        }
        (sub_bucket_index as u64) << (bucket_index as u8 + self.unit_magnitude)
    }

    /// Get the lowest value that is equivalent to the given value within the histogram's
    /// resolution. Where "equivalent" means that value samples recorded for any two equivalent
    /// values are counted in a common total count.
    pub fn lowest_equivalent(&self, value: u64) -> u64 {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);
        u64::from(sub_bucket_index) << (bucket_index + self.unit_magnitude)
    }

    /// Get the highest value that is equivalent to the given value within the histogram's
    /// resolution.
    pub fn highest_equivalent(&self, value: u64) -> u64 {
        if value == u64::max_value() {
            u64::max_value()
        } else {
            self.next_non_equivalent(value) - 1
        }
    }

    /// Get a value that lies in the middle (rounded up) of the range of values equivalent to
    /// the given value.
    pub fn median_equivalent(&self, value: u64) -> u64 {
        // adding half the range to the bottom of the top cell can overflow
        self.lowest_equivalent(value)
            .saturating_add(self.equivalent_range(value) >> 1)
    }

    /// Get the next value that is *not* equivalent to the given value within the histogram's
    /// resolution.
    pub fn next_non_equivalent(&self, value: u64) -> u64 {
        self.lowest_equivalent(value)
            .saturating_add(self.equivalent_range(value))
    }

    /// Get the size (in value units) of the range of values that are equivalent to the given
    /// value within the histogram's resolution.
    pub fn equivalent_range(&self, value: u64) -> u64 {
        let bucket_index = self.bucket_for(value);
        1_u64 << (self.unit_magnitude + bucket_index)
    }

    /// Determine if two values are equivalent with the histogram's resolution, i.e. whether they
    /// are counted in a common cell.
    pub fn equivalent(&self, value1: u64, value2: u64) -> bool {
        self.lowest_equivalent(value1) == self.lowest_equivalent(value2)
    }
}

// recording

impl<C: Counter> Histogram<C> {
    /// Record `value` in the histogram.
    ///
    /// Returns an error if `value` exceeds the highest trackable value and auto-resize is
    /// disabled.
    pub fn record(&mut self, value: u64) -> Result<(), RecordError> {
        self.record_n(value, C::one())
    }

    /// Record multiple occurrences of `value` in the histogram.
    ///
    /// This is observationally equivalent to `count` calls of `record(value)`. Returns an error
    /// if `value` exceeds the highest trackable value and auto-resize is disabled.
    pub fn record_n(&mut self, value: u64, count: C) -> Result<(), RecordError> {
        let index = self.index_for(value);
        if index < self.counts.len() {
            self.counts.add(index, count);
        } else {
            if !self.auto_resize {
                return Err(RecordError::ValueOutOfRangeResizeDisabled);
            }
            self.resize_to_cover(value)
                .map_err(|_| RecordError::ResizeFailedUsizeTypeTooSmall)?;
            let index = self.index_for(value);
            self.counts.add(index, count);
        }

        self.update_min_max(value);
        self.total_count = self.total_count.saturating_add(count.as_u64());
        Ok(())
    }

    /// Record a value in the histogram while correcting for coordinated omission.
    ///
    /// To compensate for the loss of sampled values when a recorded value is larger than the
    /// expected interval between value samples, this auto-generates an additional series of
    /// decreasingly-smaller (down to the `interval`) value records.
    ///
    /// Note: This is an at-recording correction method, as opposed to the post-recording
    /// correction method provided by `clone_correct`. The two methods are mutually exclusive,
    /// and only one of the two should be be used on a given data set to correct for the same
    /// coordinated omission issue.
    pub fn record_correct(&mut self, value: u64, interval: u64) -> Result<(), RecordError> {
        self.record_n_correct(value, C::one(), interval)
    }

    /// Record multiple occurrences of a value in the histogram while correcting for coordinated
    /// omission. See `record_correct`.
    pub fn record_n_correct(
        &mut self,
        value: u64,
        count: C,
        interval: u64,
    ) -> Result<(), RecordError> {
        self.record_n(value, count)?;
        if interval == 0 || value < interval {
            return Ok(());
        }

        let mut missing_value = value - interval;
        while missing_value >= interval {
            self.record_n(missing_value, count)?;
            missing_value -= interval;
        }
        Ok(())
    }

    /// Set internally tracked max value to new value if new value is greater than current one.
    fn update_max(&mut self, value: u64) {
        let internal_value = value | self.unit_magnitude_mask; // max unit-equivalent value
        if internal_value > self.max_value {
            self.max_value = internal_value;
        }
    }

    /// Set internally tracked min non-zero value to new value if new value is smaller than
    /// current one.
    fn update_min_nz(&mut self, value: u64) {
        if value <= self.unit_magnitude_mask {
            return; // unit-equivalent to 0
        }

        let internal_value = value & !self.unit_magnitude_mask; // min unit-equivalent value
        if internal_value < self.min_non_zero_value {
            self.min_non_zero_value = internal_value;
        }
    }

    fn update_min_max(&mut self, value: u64) {
        if value > self.max_value {
            self.update_max(value);
        }
        if value != 0 && value < self.min_non_zero_value {
            self.update_min_nz(value);
        }
    }
}

// administrative (reset, copies)

impl<C: Counter> Histogram<C> {
    /// Reset the contents and stats of this histogram: all cells zeroed, total count and
    /// min/max cleared, timestamps zeroed, tag removed. The configured range, precision,
    /// auto-resize flag, and storage kind are kept.
    pub fn reset(&mut self) {
        self.counts.clear();
        self.total_count = 0;
        self.max_value = 0;
        self.min_non_zero_value = u64::max_value();
        self.start_timestamp_msec = 0;
        self.end_timestamp_msec = 0;
        self.tag = None;
    }

    /// Get a copy of this histogram, corrected for coordinated omission.
    ///
    /// The new histogram will include an auto-generated additional series of
    /// decreasingly-smaller (down to the `interval`) value records for each count found in the
    /// current histogram that is larger than the `interval`.
    ///
    /// Note: This is a post-correction method, as opposed to the at-recording correction method
    /// provided by `record_correct`. The two methods are mutually exclusive, and only one of
    /// the two should be be used on a given data set to correct for the same coordinated
    /// omission issue.
    pub fn clone_correct(&self, interval: u64) -> Histogram<C> {
        let mut h = Histogram::new_from(self);
        for v in self.iter_recorded() {
            h.record_n_correct(v.value_iterated_to(), v.count_at_value(), interval)
                .expect("same dimensions, all recorded values are representable");
        }
        h.start_timestamp_msec = self.start_timestamp_msec;
        h.end_timestamp_msec = self.end_timestamp_msec;
        h.tag = self.tag.clone();
        h
    }
}

// merging

impl<C: Counter> Histogram<C> {
    /// Add the contents of another histogram to this one.
    ///
    /// The start/end timestamp range of this histogram is extended to cover the source's. Fails
    /// with `OtherAddendValueExceedsRange` if the source holds values outside this histogram's
    /// range and auto-resize is disabled.
    pub fn add<B: Borrow<Histogram<C>>>(&mut self, source: B) -> Result<(), AdditionError> {
        let source = source.borrow();

        // make sure we can take the values in source
        let top = self.highest_equivalent(self.value_for(self.last_index()));
        if top < source.max() {
            if !self.auto_resize {
                return Err(AdditionError::OtherAddendValueExceedsRange);
            }
            self.resize_to_cover(source.max())
                .map_err(|_| AdditionError::ResizeFailedUsizeTypeTooSmall)?;
        }

        if self.cells_match(source) {
            // Counts arrays are of the same meaning, so we can just iterate and add directly.
            let mut observed_source_total = 0_u64;
            for i in 0..source.counts.len() {
                let count = source.counts.get(i);
                if count != C::zero() {
                    self.counts.add(i, count);
                    observed_source_total = observed_source_total.saturating_add(count.as_u64());
                }
            }

            self.total_count = self.total_count.saturating_add(observed_source_total);
            let mx = source.max();
            if mx > self.max() {
                self.update_max(mx);
            }
            let mn = source.min_nz();
            if mn < self.min_nz() {
                self.update_min_nz(mn);
            }
        } else {
            // Arrays are not a direct match, so we can't just stream through and add them.
            // Instead, go through the array and add each non-zero value found at its proper
            // median-equivalent value.
            for i in 0..source.counts.len() {
                let count = source.counts.get(i);
                if count != C::zero() {
                    let value = source.median_equivalent(source.value_for(i));
                    // the range check above makes this infallible
                    self.record_n(value, count)
                        .map_err(|_| AdditionError::OtherAddendValueExceedsRange)?;
                }
            }
        }

        // widen the covered time range to include the source's
        if source.start_timestamp_msec != 0
            && (self.start_timestamp_msec == 0
                || source.start_timestamp_msec < self.start_timestamp_msec)
        {
            self.start_timestamp_msec = source.start_timestamp_msec;
        }
        if source.end_timestamp_msec > self.end_timestamp_msec {
            self.end_timestamp_msec = source.end_timestamp_msec;
        }
        Ok(())
    }

    /// Add the contents of another histogram to this one, while correcting the added values for
    /// coordinated omission. See `record_correct`.
    pub fn add_correct<B: Borrow<Histogram<C>>>(
        &mut self,
        source: B,
        interval: u64,
    ) -> Result<(), RecordError> {
        let source = source.borrow();
        for v in source.iter_recorded() {
            self.record_n_correct(v.value_iterated_to(), v.count_at_value(), interval)?;
        }
        Ok(())
    }

    /// Subtract the contents of another histogram from this one.
    ///
    /// Fails with `SubtrahendValueExceedsMinuendRange` if the other histogram holds values
    /// outside this histogram's range, and with `SubtrahendCountExceedsMinuendCount` if any
    /// resulting cell count would go negative. On error this histogram is left unchanged.
    pub fn subtract<B: Borrow<Histogram<C>>>(
        &mut self,
        subtrahend: B,
    ) -> Result<(), SubtractionError> {
        let other = subtrahend.borrow();

        let top = self.highest_equivalent(self.value_for(self.last_index()));
        if top < other.max() {
            return Err(SubtractionError::SubtrahendValueExceedsMinuendRange);
        }

        let mut observed_other_total = 0_u64;
        if self.cells_match(other) {
            // cells line up one to one, so verify every cell before touching any
            for i in 0..other.counts.len() {
                let count = other.counts.get(i);
                if count != C::zero() && self.counts.get(i) < count {
                    return Err(SubtractionError::SubtrahendCountExceedsMinuendCount);
                }
            }
            for i in 0..other.counts.len() {
                let count = other.counts.get(i);
                if count != C::zero() {
                    let remaining = self.counts.get(i) - count;
                    self.counts.set(i, remaining);
                    observed_other_total = observed_other_total.saturating_add(count.as_u64());
                }
            }
        } else {
            // Differing cell layouts can fold several subtrahend cells into one of ours, so a
            // per-cell precheck is not sound. Apply against a scratch copy instead.
            let mut scratch = self.counts.clone();
            for i in 0..other.counts.len() {
                let count = other.counts.get(i);
                if count == C::zero() {
                    continue;
                }
                let index = self.index_for(other.median_equivalent(other.value_for(i)));
                match scratch.get(index).checked_sub(&count) {
                    Some(remaining) => scratch.set(index, remaining),
                    None => return Err(SubtractionError::SubtrahendCountExceedsMinuendCount),
                }
                observed_other_total = observed_other_total.saturating_add(count.as_u64());
            }
            self.counts = scratch;
        }

        if self.total_count == u64::max_value()
            || (other.min_non_zero_value != u64::max_value()
                && self.lowest_equivalent(other.min_nz()) <= self.min_nz())
            || self.highest_equivalent(other.max()) >= self.max()
        {
            // counts were removed at (or past) the tracked extremes, or the total had
            // saturated; re-derive all three from the cells
            self.restat();
        } else {
            self.total_count -= observed_other_total;
        }
        Ok(())
    }

    /// Whether `other`'s cell indices mean the same value ranges as ours.
    fn cells_match<F: Counter>(&self, other: &Histogram<F>) -> bool {
        self.unit_magnitude == other.unit_magnitude
            && self.sub_bucket_count == other.sub_bucket_count
            && other.counts.len() <= self.counts.len()
    }

    /// Re-derive total count, max, and min non-zero value from the cells.
    fn restat(&mut self) {
        self.max_value = 0;
        self.min_non_zero_value = u64::max_value();

        let mut total = 0_u64;
        let mut max_index = None;
        let mut min_nz_index = None;
        for i in 0..self.counts.len() {
            let count = self.counts.get(i);
            if count != C::zero() {
                total = total.saturating_add(count.as_u64());
                max_index = Some(i);
                if min_nz_index.is_none() && i != 0 {
                    min_nz_index = Some(i);
                }
            }
        }

        if let Some(i) = max_index {
            let max = self.highest_equivalent(self.value_for(i));
            self.update_max(max);
        }
        if let Some(i) = min_nz_index {
            self.update_min_nz(self.value_for(i));
        }
        self.total_count = total;
    }
}

// data statistics

impl<C: Counter> Histogram<C> {
    /// Get the lowest recorded value level in the histogram.
    /// If the histogram has no recorded values, the value returned is undefined.
    pub fn min(&self) -> u64 {
        if self.total_count == 0 || self.counts.get(0) != C::zero() {
            0
        } else {
            self.min_nz()
        }
    }

    /// Get the lowest recorded non-zero value level in the histogram.
    /// `u64::max_value()` if the histogram has no recorded values.
    pub fn min_nz(&self) -> u64 {
        if self.min_non_zero_value == u64::max_value() {
            u64::max_value()
        } else {
            self.lowest_equivalent(self.min_non_zero_value)
        }
    }

    /// Get the highest recorded value level in the histogram.
    /// If the histogram has no recorded values, the value returned is undefined.
    pub fn max(&self) -> u64 {
        if self.max_value == 0 {
            0
        } else {
            self.highest_equivalent(self.max_value)
        }
    }

    /// Get the computed mean value of all recorded values in the histogram, weighting each cell
    /// by its median-equivalent value. 0 if the histogram is empty.
    pub fn mean(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }

        self.iter_recorded().fold(0.0, |total, v| {
            total
                + self.median_equivalent(v.value_iterated_to()) as f64 * v.count_at_value().as_f64()
                    / self.total_count as f64
        })
    }

    /// Get the computed standard deviation of all recorded values in the histogram.
    /// 0 if the histogram is empty.
    pub fn stdev(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }

        let mean = self.mean();
        let geom_dev_tot = self.iter_recorded().fold(0.0, |gdt, v| {
            let dev = self.median_equivalent(v.value_iterated_to()) as f64 - mean;
            gdt + (dev * dev) * v.count_at_value().as_f64()
        });

        (geom_dev_tot / self.total_count as f64).sqrt()
    }

    /// Get the value at a given percentile.
    ///
    /// The percentile is clamped to `[0, 100]`. The returned value is the highest value that is
    /// equivalent to the value reached when, walking cells in ascending value order, the
    /// cumulative count first meets `ceil(percentile/100 * total)` (at least one sample is
    /// always consumed). 0 if the histogram is empty.
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        if self.total_count == 0 {
            return 0;
        }

        let requested = percentile.max(0.0).min(100.0);
        let mut count_at_percentile = ((requested / 100.0) * self.total_count as f64).ceil() as u64;
        // make sure we at least reach the first recorded entry
        if count_at_percentile < 1 {
            count_at_percentile = 1;
        }

        let mut total_to_current_index = 0_u64;
        for i in 0..self.counts.len() {
            total_to_current_index =
                total_to_current_index.saturating_add(self.counts.get(i).as_u64());
            if total_to_current_index >= count_at_percentile {
                return self.highest_equivalent(self.value_for(i));
            }
        }
        0
    }

    /// Get the percentile of recorded values that are at or below the given value.
    /// 100.0 if the histogram is empty.
    pub fn percentile_below(&self, value: u64) -> f64 {
        if self.total_count == 0 {
            return 100.0;
        }

        let target_index = cmp::min(self.index_for(value), self.last_index());
        let total_to_current_index: u64 = (0..=target_index)
            .map(|i| self.counts.get(i).as_u64())
            .fold(0_u64, |t, v| t.saturating_add(v));
        100.0 * total_to_current_index as f64 / self.total_count as f64
    }

    /// Get the count of recorded values within a range of value levels (inclusive to within the
    /// histogram's resolution). `low` is rounded down to its lowest equivalent value, `high` up
    /// to its highest.
    pub fn count_between(&self, low: u64, high: u64) -> u64 {
        let low_index = self.index_for(low);
        let high_index = cmp::min(self.index_for(high), self.last_index());
        (low_index..=high_index)
            .map(|i| self.counts.get(i).as_u64())
            .fold(0_u64, |t, v| t.saturating_add(v))
    }

    /// Get the count of recorded values at a specific value (to within the histogram's
    /// resolution at that value level).
    pub fn count_at(&self, value: u64) -> C {
        self.counts
            .get(cmp::min(self.index_for(value), self.last_index()))
    }
}

// iterators

impl<C: Counter> Histogram<C> {
    /// Iterate through histogram values by percentile levels. The iteration starts at 0% and
    /// reduces its distance to 100% according to `ticks_per_half_distance`, ultimately reaching
    /// 100% when all recorded values are exhausted.
    pub fn iter_percentiles(
        &self,
        ticks_per_half_distance: u32,
    ) -> iterators::HistogramIterator<'_, C, iterators::percentile::Iter<'_, C>> {
        iterators::percentile::Iter::new(self, ticks_per_half_distance)
    }

    /// Iterate through histogram values using linear value steps of `value_units_per_bucket`,
    /// terminating when all recorded histogram values are exhausted.
    pub fn iter_linear(
        &self,
        value_units_per_bucket: u64,
    ) -> iterators::HistogramIterator<'_, C, iterators::linear::Iter<'_, C>> {
        iterators::linear::Iter::new(self, value_units_per_bucket)
    }

    /// Iterate through histogram values at logarithmically increasing levels, starting at
    /// `value_units_in_first_bucket` and growing by `log_base` each step, terminating when all
    /// recorded histogram values are exhausted.
    pub fn iter_log(
        &self,
        value_units_in_first_bucket: u64,
        log_base: f64,
    ) -> iterators::HistogramIterator<'_, C, iterators::log::Iter<'_, C>> {
        iterators::log::Iter::new(self, value_units_in_first_bucket, log_base)
    }

    /// Iterate through all cells with non-zero recorded counts, at the finest granularity the
    /// histogram supports.
    pub fn iter_recorded(
        &self,
    ) -> iterators::HistogramIterator<'_, C, iterators::recorded::Iter> {
        iterators::recorded::Iter::new(self)
    }

    /// Iterate through all cells, recorded or not, at the finest granularity the histogram
    /// supports.
    pub fn iter_all(&self) -> iterators::HistogramIterator<'_, C, iterators::all::Iter> {
        iterators::all::Iter::new(self)
    }
}

// comparison

impl<C: Counter, F: Counter> PartialEq<Histogram<F>> for Histogram<C> {
    fn eq(&self, other: &Histogram<F>) -> bool {
        if self.lowest_discernible_value != other.lowest_discernible_value
            || self.significant_value_digits != other.significant_value_digits
        {
            return false;
        }
        if self.total_count != other.total_count
            || self.max() != other.max()
            || self.min_nz() != other.min_nz()
        {
            return false;
        }

        // matching low + sigfig pins the cell layout, so equal indices mean equal value ranges;
        // lengths may still differ after a resize, in which case the excess must be all zeros
        let shared = cmp::min(self.counts.len(), other.counts.len());
        if (0..shared).any(|i| self.counts.get(i).as_u64() != other.counts.get(i).as_u64()) {
            return false;
        }
        (shared..self.counts.len()).all(|i| self.counts.get(i) == C::zero())
            && (shared..other.counts.len()).all(|i| other.counts.get(i) == F::zero())
    }
}

// recording sugar

impl<C: Counter> AddAssign<u64> for Histogram<C> {
    /// Record a value. Panics if the value is out of range and auto-resize is disabled.
    fn add_assign(&mut self, value: u64) {
        self.record(value).unwrap();
    }
}

impl<'a, C: Counter> AddAssign<&'a Histogram<C>> for Histogram<C> {
    /// Add another histogram. Panics if it holds out-of-range values and auto-resize is
    /// disabled.
    fn add_assign(&mut self, source: &'a Histogram<C>) {
        self.add(source).unwrap();
    }
}

impl<'a, C: Counter> SubAssign<&'a Histogram<C>> for Histogram<C> {
    /// Subtract another histogram. Panics if the subtraction would underflow a cell or the
    /// subtrahend holds out-of-range values.
    fn sub_assign(&mut self, subtrahend: &'a Histogram<C>) {
        self.subtract(subtrahend).unwrap();
    }
}
