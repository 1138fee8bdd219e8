//! Iterator behavior: recorded, all-values, linear, logarithmic, and percentile traversals.

use hdrhist::Histogram;

#[test]
fn iter_recorded_yields_non_zero_cells() {
    let mut h = Histogram::<u64>::new_with_bounds(1, u64::max_value(), 3).unwrap();

    h.record(1).unwrap();
    h.record(1_000).unwrap();
    h.record(1_000_000).unwrap();

    let expected = vec![1, 1_000, h.highest_equivalent(1_000_000)];
    assert_eq!(
        expected,
        h.iter_recorded()
            .map(|v| v.value_iterated_to())
            .collect::<Vec<u64>>()
    );
}

#[test]
fn iter_recorded_saturated_total_count() {
    let mut h = Histogram::<u64>::new_with_bounds(1, u64::max_value(), 3).unwrap();

    h.record_n(1, u64::max_value()).unwrap();
    h.record_n(1_000, u64::max_value()).unwrap();

    let expected = vec![1, 1_000];
    assert_eq!(
        expected,
        h.iter_recorded()
            .map(|v| v.value_iterated_to())
            .collect::<Vec<u64>>()
    );
}

#[test]
fn iter_recorded_accumulates_totals() {
    let mut h = Histogram::<u64>::new_with_bounds(1, u64::max_value(), 3).unwrap();

    h.record_n(10, 4).unwrap();
    h.record_n(20, 6).unwrap();

    let steps: Vec<_> = h.iter_recorded().collect();
    assert_eq!(2, steps.len());

    assert_eq!(4, steps[0].count_at_value());
    assert_eq!(4, steps[0].count_since_last_iteration());
    assert_eq!(4, steps[0].total_count_to_this_value());
    assert_eq!(40, steps[0].total_value_to_this_value());
    assert!((steps[0].percentile() - 40.0).abs() < 1e-9);

    assert_eq!(6, steps[1].count_at_value());
    assert_eq!(6, steps[1].count_since_last_iteration());
    assert_eq!(10, steps[1].total_count_to_this_value());
    assert_eq!(40 + 120, steps[1].total_value_to_this_value());
    assert!((steps[1].percentile() - 100.0).abs() < 1e-9);
}

#[test]
fn iter_all_covers_every_cell() {
    let mut h = Histogram::<u64>::new_with_max(2000, 3).unwrap();
    h.record(1).unwrap();
    h.record(2000).unwrap();

    let steps: Vec<_> = h.iter_all().collect();
    assert_eq!(h.distinct_values(), steps.len());
    assert_eq!(1, steps[1].count_at_value());
    assert_eq!(2, steps.last().unwrap().total_count_to_this_value());
}

#[test]
fn iter_linear_count_since_last_iteration_saturates() {
    let mut h = Histogram::<u64>::new_with_bounds(1, u64::max_value(), 3).unwrap();

    h.record_n(1, u64::max_value()).unwrap();
    h.record_n(4, u64::max_value() - 1).unwrap();
    h.record_n(5, u64::max_value() - 1).unwrap();
    h.record_n(6, 100).unwrap();
    h.record_n(7, 200).unwrap();
    h.record_n(10, 400).unwrap();

    let expected = vec![
        // 0-1 has 1's max value
        (1, u64::max_value()),
        // 2-3 has nothing
        (3, 0),
        // 4-5 has 2x (max - 1), should saturate
        (5, u64::max_value()),
        // 6-7 shouldn't be saturated from 4-5
        (7, 300),
        // 8-9 has nothing
        (9, 0),
        // 10-11 has just 10's count
        (11, 400),
    ];

    // step in 2s to test count accumulation for each step
    assert_eq!(
        expected,
        h.iter_linear(2)
            .map(|v| (v.value_iterated_to(), v.count_since_last_iteration()))
            .collect::<Vec<(u64, u64)>>()
    );
}

#[test]
fn iter_linear_visits_buckets_wider_than_step_size_multiple_times() {
    let mut h = Histogram::<u64>::new_with_bounds(1, u64::max_value(), 3).unwrap();

    h.record(1).unwrap();
    h.record(2047).unwrap();
    // bucket size 2
    h.record(2048).unwrap();
    h.record(2049).unwrap();
    h.record(4095).unwrap();
    // bucket size 4
    h.record(4096).unwrap();
    h.record(4097).unwrap();
    h.record(4098).unwrap();
    h.record(4099).unwrap();
    // 2nd bucket in size 4
    h.record(4100).unwrap();

    let iter_values = h
        .iter_linear(1)
        .map(|v| (v.value_iterated_to(), v.count_since_last_iteration()))
        .collect::<Vec<(u64, u64)>>();

    // bucket size 1
    assert_eq!((0, 0), iter_values[0]);
    assert_eq!((1, 1), iter_values[1]);
    assert_eq!((2046, 0), iter_values[2046]);
    assert_eq!((2047, 1), iter_values[2047]);
    // bucket size 2
    assert_eq!((2048, 2), iter_values[2048]);
    assert_eq!((2049, 0), iter_values[2049]);
    assert_eq!((2050, 0), iter_values[2050]);
    assert_eq!((2051, 0), iter_values[2051]);
    assert_eq!((4094, 1), iter_values[4094]);
    assert_eq!((4095, 0), iter_values[4095]);
    // bucket size 4
    assert_eq!((4096, 4), iter_values[4096]);
    assert_eq!((4097, 0), iter_values[4097]);
    assert_eq!((4098, 0), iter_values[4098]);
    assert_eq!((4099, 0), iter_values[4099]);
    // also size 4, last bucket
    assert_eq!((4100, 1), iter_values[4100]);
    assert_eq!((4101, 0), iter_values[4101]);
    assert_eq!((4102, 0), iter_values[4102]);
    assert_eq!((4103, 0), iter_values[4103]);

    assert_eq!(4104, iter_values.len());
}

#[test]
fn iter_linear_visits_buckets_once_when_step_size_equals_bucket_size() {
    let mut h = Histogram::<u64>::new_with_bounds(1, u64::max_value(), 3).unwrap();

    h.record(1).unwrap();
    h.record(2047).unwrap();
    // bucket size 2
    h.record(2048).unwrap();
    h.record(2049).unwrap();
    h.record(4095).unwrap();
    // bucket size 4
    h.record(4096).unwrap();
    h.record(4097).unwrap();
    h.record(4098).unwrap();
    h.record(4099).unwrap();
    // 2nd bucket in size 4
    h.record(4100).unwrap();

    let iter_values = h
        .iter_linear(4)
        .map(|v| (v.value_iterated_to(), v.count_since_last_iteration()))
        .collect::<Vec<(u64, u64)>>();

    // bucket size 1
    assert_eq!((3, 1), iter_values[0]);
    assert_eq!((2047, 1), iter_values[511]);
    // bucket size 2
    assert_eq!((2051, 2), iter_values[512]);
    assert_eq!((4095, 1), iter_values[1023]);
    // bucket size 4
    assert_eq!((4099, 4), iter_values[1024]);
    // also size 4, last bucket
    assert_eq!((4103, 1), iter_values[1025]);

    assert_eq!(1026, iter_values.len());
}

#[test]
fn iter_log_steps_multiply_by_base() {
    let mut h = Histogram::<u64>::new_with_bounds(1, u64::max_value(), 3).unwrap();

    h.record(1).unwrap();
    h.record(10).unwrap();
    h.record(100).unwrap();
    h.record(1000).unwrap();

    let steps: Vec<_> = h
        .iter_log(1, 10.0)
        .map(|v| (v.value_iterated_to(), v.count_since_last_iteration()))
        .collect();

    // levels 0, 9, 99, 999 (each level reports values at or below it since the previous)
    assert_eq!((0, 0), steps[0]);
    assert_eq!((9, 1), steps[1]);
    assert_eq!((99, 1), steps[2]);
    assert_eq!((999, 1), steps[3]);
    assert_eq!((9999, 1), steps[4]);
    assert_eq!(5, steps.len());
}

#[test]
fn iter_percentiles_tick_sequence() {
    let mut h = Histogram::<u64>::new_with_max((1 << 53) - 1, 3).unwrap();
    h += 25_u64;
    h += 50_u64;
    h += 75_u64;

    let ticks: Vec<_> = h
        .iter_percentiles(5)
        .map(|v| (v.value_iterated_to(), v.percentile_iterated_to()))
        .collect();

    // ticks at fifths of each half-distance; each recorded value spans the ticks its
    // cumulative percentile covers, and the iteration ends with a single 100% tick
    let expected = vec![
        (25, 0.0),
        (25, 10.0),
        (25, 20.0),
        (25, 30.0),
        (50, 40.0),
        (50, 50.0),
        (50, 55.0),
        (50, 60.0),
        (50, 65.0),
        (75, 70.0),
        (75, 100.0),
    ];

    assert_eq!(expected.len(), ticks.len());
    for (i, ((ev, ep), (av, ap))) in expected.iter().zip(ticks.iter()).enumerate() {
        assert_eq!(ev, av, "value at tick {}", i);
        assert!((ep - ap).abs() < 1e-9, "percentile at tick {}: {} vs {}", i, ep, ap);
    }
}

#[test]
fn iter_percentiles_empty_histogram_yields_nothing() {
    let h = Histogram::<u64>::new_with_max(2000, 3).unwrap();
    assert_eq!(0, h.iter_percentiles(5).count());
}

#[test]
fn iter_percentiles_single_value() {
    let mut h = Histogram::<u64>::new_with_max(2000, 3).unwrap();
    h += 1000_u64;

    let ticks: Vec<_> = h
        .iter_percentiles(1)
        .map(|v| (v.value_iterated_to(), v.percentile_iterated_to()))
        .collect();

    // the one recorded cell is already at percentile 100, so a 0% tick and the final 100% tick
    assert_eq!(2, ticks.len());
    assert_eq!((1000, 0.0), ticks[0]);
    assert_eq!((1000, 100.0), ticks[1]);
}
