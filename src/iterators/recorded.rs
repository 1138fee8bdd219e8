use crate::core::counter::Counter;
use crate::iterators::{HistogramIterator, PickMetadata, PickyIterator};
use crate::Histogram;

/// An iterator that will yield only the cells with a non-zero recorded count.
pub struct Iter {
    visited: Option<usize>,
}

impl Iter {
    /// Construct a new recorded-values iterator. See `Histogram::iter_recorded` for details.
    pub fn new<C: Counter>(hist: &Histogram<C>) -> HistogramIterator<'_, C, Iter> {
        HistogramIterator::new(hist, Iter { visited: None })
    }
}

impl<C: Counter> PickyIterator<C> for Iter {
    fn pick(&mut self, index: usize, _: u64, count_at_index: C) -> Option<PickMetadata> {
        if count_at_index == C::zero() || self.visited == Some(index) {
            return None;
        }
        self.visited = Some(index);
        Some(PickMetadata::new(None, None))
    }

    fn more(&mut self, _: usize) -> bool {
        false
    }
}
