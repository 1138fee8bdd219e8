use crate::core::counter::Counter;
use crate::iterators::{HistogramIterator, PickMetadata, PickyIterator};
use crate::Histogram;

/// An iterator that will yield at percentile steps through the histogram's value range.
pub struct Iter<'a, C: 'a + Counter> {
    hist: &'a Histogram<C>,
    ticks_per_half_distance: u32,
    percentile_to_iterate_to: f64,
    reached_end: bool,
}

impl<'a, C: 'a + Counter> Iter<'a, C> {
    /// Construct a new percentile iterator. See `Histogram::iter_percentiles` for details.
    pub fn new(
        hist: &'a Histogram<C>,
        ticks_per_half_distance: u32,
    ) -> HistogramIterator<'a, C, Iter<'a, C>> {
        assert!(
            ticks_per_half_distance > 0,
            "ticks_per_half_distance must be > 0"
        );

        HistogramIterator::new(
            hist,
            Iter {
                hist,
                ticks_per_half_distance,
                percentile_to_iterate_to: 0.0,
                reached_end: false,
            },
        )
    }
}

impl<'a, C: 'a + Counter> PickyIterator<C> for Iter<'a, C> {
    #[allow(clippy::float_cmp)]
    fn pick(&mut self, _: usize, total_count_to_index: u64, count_at_index: C) -> Option<PickMetadata> {
        if count_at_index == C::zero() {
            return None;
        }

        let current_percentile =
            100.0 * total_count_to_index as f64 / self.hist.len() as f64;
        if current_percentile < self.percentile_to_iterate_to {
            return None;
        }

        // Because there are effectively two percentiles in play (the percentile of the cell
        // we're at, and the level we're iterating to, which may be significantly different in
        // highly non-uniform distributions), the behavior around 100% is a little tricky: we
        // always iterate until the iteration level reaches 100%, but once the cell percentile
        // reaches 100% (the last cell with a non-zero count), the remaining intermediate ticks
        // inside that cell are skipped and the iteration jumps straight to the single final
        // 100% tick. A run of all-but-identical ticks at the end of a distribution output
        // helps nobody.

        if self.reached_end {
            // the final tick was already emitted; refuse the remaining re-visits so the base
            // iteration can wind down
            return None;
        }

        if self.percentile_to_iterate_to == 100.0 {
            // the single final tick; the tick math below is undefined at 100%, so don't touch it
            self.reached_end = true;
            return Some(PickMetadata::new(Some(100.0), None));
        }

        // The choice to maintain fixed-sized "ticks" in each half-distance to 100% (starting
        // from 0%), as opposed to a "tick" size that varies with each interval, was made to make
        // the steps easily comprehensible and readable to humans. The resulting percentile
        // steps are much easier to browse through in a percentile distribution output.
        //
        // We calculate the number of equal-sized "ticks" that the 0-100 range will be divided
        // by at the current scale. The scale is determined by the percentile level we are
        // iterating to. The following math determines the tick size for the current scale, and
        // maintains a fixed tick size for the remaining "half the distance to 100%" (from
        // either 0% or from the previous half-distance). When that half-distance is crossed,
        // the scale changes and the tick size is effectively cut in half.
        //
        // num_halvings is the number of times the distance to 100% has been halved: 1 at 50%,
        // 2 at 75%, 3 at 87.5%, and so on. 2^num_halvings slices then fit into the 0-100 range,
        // and each slice carries ticks_per_half_distance ticks in each of its two halves.
        let num_halvings = (100.0 / (100.0 - self.percentile_to_iterate_to)).log2() as u32;
        let total_ticks = u64::from(self.ticks_per_half_distance)
            .checked_mul(
                1_u64
                    .checked_shl(num_halvings + 1)
                    .expect("too many halvings"),
            )
            .expect("too many total ticks");
        let increment = 100.0 / total_ticks as f64;

        let metadata = PickMetadata::new(Some(self.percentile_to_iterate_to), None);

        let sum = self.percentile_to_iterate_to + increment;
        self.percentile_to_iterate_to = if sum == self.percentile_to_iterate_to {
            // the increment has become too small to change an f64 just below 100; short
            // circuit to the final tick instead of spinning
            100.0
        } else {
            sum
        };
        Some(metadata)
    }

    fn more(&mut self, _: usize) -> bool {
        if self.reached_end {
            return false;
        }

        // All recorded counts have been consumed while the iteration level was still below
        // 100%: jump to the single final tick, which the next pick() will emit.
        self.percentile_to_iterate_to = 100.0;
        true
    }
}
