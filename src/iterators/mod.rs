//! Iterators over histogram cells, from finest-granularity walks to percentile distributions.

use crate::core::counter::Counter;
use crate::Histogram;

/// An iterator that yields at percentile steps through the histogram's value range.
pub mod percentile;

/// An iterator that yields at fixed-size value steps through the histogram's value range.
pub mod linear;

/// An iterator that yields at logarithmically growing value steps.
pub mod log;

/// An iterator that yields every cell with a non-zero recorded count.
pub mod recorded;

/// An iterator that yields every cell.
pub mod all;

/// Extra information a [`PickyIterator`] can attach to a picked cell: an override for the
/// percentile level and/or the value to report for this step.
#[derive(Debug, Clone, Copy)]
pub struct PickMetadata {
    percentile_iterated_to: Option<f64>,
    value_iterated_to: Option<u64>,
}

impl PickMetadata {
    /// Construct metadata for a picked cell. `None` leaves the respective field at the
    /// iteration's naturally computed value.
    pub fn new(percentile_iterated_to: Option<f64>, value_iterated_to: Option<u64>) -> Self {
        PickMetadata {
            percentile_iterated_to,
            value_iterated_to,
        }
    }
}

/// A trait for designing a subset iterator over cells in a `Histogram`.
pub trait PickyIterator<C: Counter> {
    /// Should an item be yielded for the given cell index? `total_count_to_index` and
    /// `count_at_index` describe the cell the iteration is currently visiting.
    fn pick(
        &mut self,
        index: usize,
        total_count_to_index: u64,
        count_at_index: C,
    ) -> Option<PickMetadata>;

    /// Should iteration continue even though all recorded counts have already been observed?
    /// Policies that step through value or percentile levels use this for their trailing steps.
    fn more(&mut self, index_to_pick: usize) -> bool;
}

/// One step of a histogram iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationValue<C: Counter> {
    value_iterated_to: u64,
    percentile: f64,
    percentile_iterated_to: f64,
    count_at_value: C,
    count_since_last_iteration: u64,
    total_count_to_this_value: u64,
    total_value_to_this_value: u64,
}

impl<C: Counter> IterationValue<C> {
    /// The value this step reports: the highest value equivalent to the current cell, unless
    /// the policy substituted its own reporting level (as linear/log steps do).
    pub fn value_iterated_to(&self) -> u64 {
        self.value_iterated_to
    }

    /// Percent of recorded values that are at or below the current cell.
    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// The percentile level the iteration stepped to, which may be lower than `percentile()`
    /// when a single cell spans several percentile ticks.
    pub fn percentile_iterated_to(&self) -> f64 {
        self.percentile_iterated_to
    }

    /// Recorded count at the current cell.
    pub fn count_at_value(&self) -> C {
        self.count_at_value
    }

    /// Recorded counts accumulated since the last yielded step.
    pub fn count_since_last_iteration(&self) -> u64 {
        self.count_since_last_iteration
    }

    /// Total recorded counts up to and including the current cell.
    pub fn total_count_to_this_value(&self) -> u64 {
        self.total_count_to_this_value
    }

    /// Sum of `count * median equivalent value` over all cells up to and including the current
    /// one.
    pub fn total_value_to_this_value(&self) -> u64 {
        self.total_value_to_this_value
    }
}

/// `HistogramIterator` provides a base iterator for a `Histogram`.
///
/// It iterates over all discrete cells until there are no more recorded values (i.e., *not*
/// necessarily until all cells have been visited). To facilitate the development of more
/// sophisticated iterators, a *picker* decides which of the visited cells yield a step, and may
/// extend the iteration past the last recorded count (for trailing linear/percentile steps).
///
/// One peculiarity of this iterator is that, if the picker does choose to yield a particular
/// cell, that cell *is re-visited* before moving on to later cells. This is how the iterators
/// in the HdrHistogram lineage have always behaved, and the linear/log policies depend on it to
/// emit several steps inside one wide cell.
pub struct HistogramIterator<'a, C: 'a + Counter, P: PickyIterator<C>> {
    hist: &'a Histogram<C>,
    total_count_to_index: u64,
    total_value_to_index: u64,
    prev_total_count: u64,
    // accumulated separately instead of diffing totals, which would collapse to 0 once the
    // running total saturates
    count_since_last_iteration: u64,
    current_index: usize,
    // the cell holding the histogram's max value; counts past it are all zero
    last_recorded_index: usize,
    fresh: bool,
    ended: bool,
    picker: P,
}

impl<'a, C: Counter, P: PickyIterator<C>> HistogramIterator<'a, C, P> {
    pub(crate) fn new(hist: &'a Histogram<C>, picker: P) -> HistogramIterator<'a, C, P> {
        HistogramIterator {
            hist,
            total_count_to_index: 0,
            total_value_to_index: 0,
            prev_total_count: 0,
            count_since_last_iteration: 0,
            current_index: 0,
            last_recorded_index: hist.index_for(hist.max()),
            fresh: true,
            ended: false,
            picker,
        }
    }
}

impl<'a, C: Counter, P: PickyIterator<C>> Iterator for HistogramIterator<'a, C, P> {
    type Item = IterationValue<C>;

    fn next(&mut self) -> Option<Self::Item> {
        // We iterate over the cells of the histogram's counts array, but most of those cells
        // (especially towards the end) will be zeros, which a finished iteration must not crawl
        // through one yield at a time. So: we iterate until we have seen the total *count*;
        // after that we only continue while the picker's more() asks for trailing steps.
        while !self.ended {
            // have we reached the end?
            if self.current_index == self.hist.distinct_values() {
                self.ended = true;
                return None;
            }

            if self.fresh {
                // a cell's count and value sum are folded in exactly once, no matter how many
                // times the cell is re-visited afterwards
                let count = self.hist.count_at_index(self.current_index);
                self.total_count_to_index = self.total_count_to_index.saturating_add(count.as_u64());
                self.count_since_last_iteration =
                    self.count_since_last_iteration.saturating_add(count.as_u64());
                self.total_value_to_index = self.total_value_to_index.saturating_add(
                    count
                        .as_u64()
                        .saturating_mul(self.hist.median_equivalent(
                            self.hist.value_for(self.current_index),
                        )),
                );
                self.fresh = false;
            } else if self.prev_total_count == self.hist.len()
                && self.current_index >= self.last_recorded_index
            {
                // Every non-zero count has been yielded and the max-value cell has been visited;
                // the picker decides whether to keep producing trailing steps. The index bound
                // matters when the total count has saturated: counts alone can no longer tell
                // whether recorded cells remain ahead.
                if !self.picker.more(self.current_index) {
                    self.ended = true;
                    return None;
                }
            }

            let count = self.hist.count_at_index(self.current_index);
            if let Some(metadata) = self.picker.pick(self.current_index, self.total_count_to_index, count)
            {
                let value_iterated_to = metadata.value_iterated_to.unwrap_or_else(|| {
                    self.hist
                        .highest_equivalent(self.hist.value_for(self.current_index))
                });
                let percentile =
                    100.0 * self.total_count_to_index as f64 / self.hist.len() as f64;
                let iteration_value = IterationValue {
                    value_iterated_to,
                    percentile,
                    percentile_iterated_to: metadata.percentile_iterated_to.unwrap_or(percentile),
                    count_at_value: count,
                    count_since_last_iteration: self.count_since_last_iteration,
                    total_count_to_this_value: self.total_count_to_index,
                    total_value_to_this_value: self.total_value_to_index,
                };

                // note that we don't advance current_index: the picker is exposed to the same
                // cell again before we move on
                self.prev_total_count = self.total_count_to_index;
                self.count_since_last_iteration = 0;
                return Some(iteration_value);
            }

            // check the next cell
            self.current_index += 1;
            self.fresh = true;
        }
        None
    }
}
