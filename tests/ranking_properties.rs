//! Property tests for the rankers.
//!
//! 1. A ranking holds `min(n, eligible)` entries.
//! 2. Scores never increase down the list.
//! 3. Entries are distinct rows of the input.
//! 4. The ratio ranker excludes exactly the rows whose ratio is undefined:
//!    zero denominators and quotients that overflow.
//! 5. Ranking is a pure function of its input.

use proptest::prelude::*;
use spread_monitor::{Record, top_by_column, top_by_ratio};

// ── Helpers ─────────────────────────────────────────────────────────────

fn spread_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        1 => Just(0.0),
        1 => prop::sample::select(vec![1e-320, -4e-315, f64::MIN_POSITIVE]),
        4 => -500.0f64..500.0,
    ]
}

fn record_strategy() -> impl Strategy<Value = (f64, f64, u8)> {
    (0.0f64..30.0, spread_strategy(), 0u8..4)
}

fn records_strategy(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    proptest::collection::vec(record_strategy(), 0..=max_len).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(index, (duration, spread, sector))| {
                Record::new(
                    format!("Issuer{}", index % 3),
                    format!("Code{index}"),
                    duration,
                    spread,
                    format!("Sector{sector}"),
                )
            })
            .collect()
    })
}

fn scores(list: &spread_monitor::RankedList) -> Vec<f64> {
    list.entries
        .iter()
        .map(|entry| entry.score.expect("numeric rankings carry scores"))
        .collect()
}

// ── Column ranking ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn column_ranking_length_is_bounded(records in records_strategy(40), n in 0usize..50) {
        let list = top_by_column(&records, "base_spread", n).unwrap();
        prop_assert_eq!(list.len(), n.min(records.len()));
        prop_assert_eq!(list.excluded, 0);
    }

    #[test]
    fn column_ranking_is_non_increasing(records in records_strategy(40), n in 0usize..50) {
        let list = top_by_column(&records, "duration", n).unwrap();
        let scores = scores(&list);
        for pair in scores.windows(2) {
            prop_assert!(pair[0] >= pair[1], "{} ranked above {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn column_ranking_entries_are_distinct_input_rows(records in records_strategy(40), n in 0usize..50) {
        let list = top_by_column(&records, "base_spread", n).unwrap();
        let mut seen = std::collections::HashSet::new();
        for entry in &list.entries {
            prop_assert!(seen.insert(entry.source_index));
            prop_assert_eq!(&records[entry.source_index], &entry.record);
        }
    }

    #[test]
    fn column_ranking_keeps_the_largest_values(records in records_strategy(40), n in 1usize..10) {
        let list = top_by_column(&records, "base_spread", n).unwrap();
        if let Some(last) = list.entries.last() {
            let floor = last.record.base_spread;
            let above = records.iter().filter(|record| record.base_spread > floor).count();
            prop_assert!(above < list.len());
        }
    }

    #[test]
    fn column_ranking_is_deterministic(records in records_strategy(30), n in 0usize..10) {
        let first = top_by_column(&records, "base_spread", n).unwrap();
        let second = top_by_column(&records, "base_spread", n).unwrap();
        prop_assert_eq!(first, second);
    }
}

// ── Ratio ranking ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn ratio_ranking_counts_undefined_ratios(records in records_strategy(40), n in 0usize..50) {
        let undefined = records
            .iter()
            .filter(|record| record.base_spread == 0.0 || !(record.duration / record.base_spread).is_finite())
            .count();
        let list = top_by_ratio(&records, "duration", "base_spread", n).unwrap();
        prop_assert_eq!(list.excluded, undefined);
        prop_assert_eq!(list.len(), n.min(records.len() - undefined));
    }

    #[test]
    fn ratio_ranking_never_includes_zero_denominators(records in records_strategy(40), n in 0usize..50) {
        let list = top_by_ratio(&records, "duration", "base_spread", n).unwrap();
        for entry in &list.entries {
            prop_assert!(entry.record.base_spread != 0.0);
            let score = entry.score.unwrap();
            prop_assert!(score.is_finite());
        }
    }

    #[test]
    fn ratio_ranking_is_non_increasing(records in records_strategy(40), n in 0usize..50) {
        let list = top_by_ratio(&records, "duration", "base_spread", n).unwrap();
        let scores = scores(&list);
        for pair in scores.windows(2) {
            prop_assert!(pair[0] >= pair[1], "{} ranked above {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn ratio_ranking_is_deterministic(records in records_strategy(30), n in 0usize..10) {
        let first = top_by_ratio(&records, "duration", "base_spread", n).unwrap();
        let second = top_by_ratio(&records, "duration", "base_spread", n).unwrap();
        prop_assert_eq!(first, second);
    }
}
