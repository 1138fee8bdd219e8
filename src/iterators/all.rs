use crate::core::counter::Counter;
use crate::iterators::{HistogramIterator, PickMetadata, PickyIterator};
use crate::Histogram;

/// An iterator that will yield every cell.
pub struct Iter {
    visited: Option<usize>,
}

impl Iter {
    /// Construct a new full iterator. See `Histogram::iter_all` for details.
    pub fn new<C: Counter>(hist: &Histogram<C>) -> HistogramIterator<'_, C, Iter> {
        HistogramIterator::new(hist, Iter { visited: None })
    }
}

impl<C: Counter> PickyIterator<C> for Iter {
    fn pick(&mut self, index: usize, _: u64, _: C) -> Option<PickMetadata> {
        if self.visited == Some(index) {
            // yield each cell exactly once despite the post-pick re-visit
            return None;
        }
        self.visited = Some(index);
        Some(PickMetadata::new(None, None))
    }

    fn more(&mut self, _: usize) -> bool {
        true
    }
}
