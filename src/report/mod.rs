//! Percentile distribution output in the classic HdrHistogram formats.

use crate::core::counter::Counter;
use crate::Histogram;
use std::io;
use std::io::Write;

impl<C: Counter> Histogram<C> {
    /// Write the percentile distribution of this histogram in the classic tabular format:
    /// right-aligned `Value`, `Percentile`, `TotalCount`, and `1/(1-Percentile)` columns, one
    /// row per percentile tick, followed by `#[...]` footer lines carrying mean, standard
    /// deviation, max, total count, and the bucket geometry.
    ///
    /// Values (and the mean, standard deviation, and max in the footer) are divided by
    /// `value_scale` before printing, so a histogram recorded in nanoseconds can be reported in
    /// milliseconds with `value_scale = 1_000_000.0`. Pass `1.0` to report raw values. The
    /// number of value decimals equals the histogram's significant digits.
    pub fn output_percentile_distribution<W: Write>(
        &self,
        writer: &mut W,
        ticks_per_half_distance: u32,
        value_scale: f64,
    ) -> io::Result<()> {
        writeln!(
            writer,
            "{:>12} {:>14} {:>10} {:>14}\n",
            "Value", "Percentile", "TotalCount", "1/(1-Percentile)"
        )?;

        let decimals = usize::from(self.significant_value_digits);
        for v in self.iter_percentiles(ticks_per_half_distance) {
            let value = v.value_iterated_to() as f64 / value_scale;
            let percentile = v.percentile_iterated_to() / 100.0;
            if v.percentile_iterated_to() < 100.0 {
                writeln!(
                    writer,
                    "{:12.prec$} {:2.12} {:10} {:14.2}",
                    value,
                    percentile,
                    v.total_count_to_this_value(),
                    1.0 / (1.0 - percentile),
                    prec = decimals
                )?;
            } else {
                // the 100th percentile row has no meaningful ratio
                writeln!(
                    writer,
                    "{:12.prec$} {:2.12} {:10}",
                    value,
                    percentile,
                    v.total_count_to_this_value(),
                    prec = decimals
                )?;
            }
        }

        writeln!(
            writer,
            "#[Mean    = {:12.prec$}, StdDeviation   = {:12.prec$}]",
            self.mean() / value_scale,
            self.stdev() / value_scale,
            prec = decimals
        )?;
        writeln!(
            writer,
            "#[Max     = {:12.prec$}, Total count    = {:12}]",
            self.max() as f64 / value_scale,
            self.len(),
            prec = decimals
        )?;
        writeln!(
            writer,
            "#[Buckets = {:12}, SubBuckets     = {:12}]",
            self.bucket_count, self.sub_bucket_count
        )?;
        Ok(())
    }

    /// Write the percentile distribution as CSV: a quoted header row, then
    /// `value,percentile,total_count,ratio` rows. The final (100th percentile) row writes
    /// `Infinity` in the ratio column. No footer is emitted.
    ///
    /// See [`Histogram::output_percentile_distribution`] for `value_scale`.
    pub fn output_percentile_distribution_csv<W: Write>(
        &self,
        writer: &mut W,
        ticks_per_half_distance: u32,
        value_scale: f64,
    ) -> io::Result<()> {
        writeln!(
            writer,
            "\"Value\",\"Percentile\",\"TotalCount\",\"1/(1-Percentile)\""
        )?;

        let decimals = usize::from(self.significant_value_digits);
        for v in self.iter_percentiles(ticks_per_half_distance) {
            let value = v.value_iterated_to() as f64 / value_scale;
            let percentile = v.percentile_iterated_to() / 100.0;
            if v.percentile_iterated_to() < 100.0 {
                writeln!(
                    writer,
                    "{:.prec$},{:.12},{},{:.2}",
                    value,
                    percentile,
                    v.total_count_to_this_value(),
                    1.0 / (1.0 - percentile),
                    prec = decimals
                )?;
            } else {
                writeln!(
                    writer,
                    "{:.prec$},{:.12},{},Infinity",
                    value,
                    percentile,
                    v.total_count_to_this_value(),
                    prec = decimals
                )?;
            }
        }
        Ok(())
    }
}
