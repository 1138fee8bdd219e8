//! Interval sampling support.
//!
//! A [`Recorder`] owns the histogram being actively recorded into and flips it with a
//! replacement whenever an interval snapshot is requested, so the reader always gets a
//! histogram nobody is writing to and the writer never observes a half-reset one. Snapshots can
//! be handed back for recycling to make the flip allocation-free in steady state.
//!
//! The flip is the only coordination point: one writer and one reader are supported, serialized
//! by the `&mut self` borrow (or an external host mechanism). For recording from multiple
//! producer threads, aggregate per-thread histograms with [`Histogram::add`] instead.
//!
//! ```
//! use hdrhist::recorder::Recorder;
//!
//! let mut recorder = Recorder::<u64>::new(1, 60 * 60 * 1000, 3).unwrap();
//! recorder.record(1234).unwrap();
//!
//! // hand the current interval to the reporting side and keep recording
//! let interval = recorder.interval_histogram();
//! assert_eq!(interval.len(), 1);
//!
//! recorder.record(5678).unwrap();
//!
//! // recycle the consumed snapshot so the next flip reuses its allocation
//! let interval = recorder.interval_histogram_recycling(interval).unwrap();
//! assert_eq!(interval.len(), 1);
//! ```

use crate::core::counter::Counter;
use crate::errors::{CreationError, RecordError, RecorderError};
use crate::Histogram;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// Instance ids must be unique per process so a histogram recycled into the wrong recorder is
// always caught; 0 is reserved for histograms no recorder has ever owned.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

fn wall_clock_msec() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_millis() as u64)
        .unwrap_or(0)
}

/// Records values into an active histogram and yields stable interval snapshots by flipping the
/// active histogram with a reset replacement.
#[derive(Debug)]
pub struct Recorder<C: Counter> {
    active: Histogram<C>,
    instance_id: u64,
}

impl<C: Counter> Recorder<C> {
    /// Construct a recorder whose histograms track `[low, high]` with `sigfig` significant
    /// value digits. See [`Histogram::new_with_bounds`] for the parameter rules.
    pub fn new(low: u64, high: u64, sigfig: u8) -> Result<Recorder<C>, CreationError> {
        Ok(Self::from_histogram(Histogram::new_with_bounds(
            low, high, sigfig,
        )?))
    }

    /// Construct a recorder around an already-configured histogram, adopting its range,
    /// precision, auto-resize flag, and storage kind for every interval histogram it produces.
    pub fn from_histogram(mut active: Histogram<C>) -> Recorder<C> {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        active.containing_instance_id = instance_id;
        active.start_timestamp_msec = wall_clock_msec();
        Recorder {
            active,
            instance_id,
        }
    }

    /// Record `value` into the current interval. See [`Histogram::record`].
    pub fn record(&mut self, value: u64) -> Result<(), RecordError> {
        self.active.record(value)
    }

    /// Record multiple occurrences of `value` into the current interval. See
    /// [`Histogram::record_n`].
    pub fn record_n(&mut self, value: u64, count: C) -> Result<(), RecordError> {
        self.active.record_n(value, count)
    }

    /// Record `value` into the current interval, correcting for coordinated omission. See
    /// [`Histogram::record_correct`].
    pub fn record_correct(&mut self, value: u64, interval: u64) -> Result<(), RecordError> {
        self.active.record_correct(value, interval)
    }

    /// Record multiple occurrences of `value` into the current interval, correcting for
    /// coordinated omission. See [`Histogram::record_n_correct`].
    pub fn record_n_correct(
        &mut self,
        value: u64,
        count: C,
        interval: u64,
    ) -> Result<(), RecordError> {
        self.active.record_n_correct(value, count, interval)
    }

    /// Take a snapshot of the interval recorded so far and start a fresh one.
    ///
    /// Allocates a new replacement histogram; when the previous snapshot has been consumed,
    /// prefer [`Recorder::interval_histogram_recycling`].
    pub fn interval_histogram(&mut self) -> Histogram<C> {
        let mut replacement = Histogram::new_from(&self.active);
        replacement.containing_instance_id = self.instance_id;
        self.flip(replacement)
    }

    /// Take a snapshot of the interval recorded so far, reusing a previously returned snapshot
    /// as the new active histogram instead of allocating.
    ///
    /// Fails with `HistogramNotFromThisRecorder` if `recycled` was not produced by this
    /// recorder, since a foreign histogram could differ in range, precision, or storage kind.
    pub fn interval_histogram_recycling(
        &mut self,
        mut recycled: Histogram<C>,
    ) -> Result<Histogram<C>, RecorderError> {
        if recycled.containing_instance_id != self.instance_id {
            return Err(RecorderError::HistogramNotFromThisRecorder);
        }
        recycled.reset();
        Ok(self.flip(recycled))
    }

    fn flip(&mut self, mut replacement: Histogram<C>) -> Histogram<C> {
        let now = wall_clock_msec();
        replacement.start_timestamp_msec = now;
        let mut sampled = mem::replace(&mut self.active, replacement);
        sampled.end_timestamp_msec = now;
        sampled
    }
}
