//! End-to-end filter evaluation tests over encoded blocks.

use rayon::prelude::*;
use sift::{Bitmap, Block, BlockBuilder, Filter};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn build_block(field: &str, values: &[&str]) -> Block {
    BlockBuilder::new().column(field, values).build().unwrap()
}

fn matching_rows(filter: &Filter, block: &Block) -> Vec<usize> {
    let mut bm = Bitmap::all_set(block.row_count());
    filter.apply(block, &mut bm);
    bm.indices()
}

fn phrase(field: &str, phrase: &str) -> Filter {
    Filter::Phrase {
        field: field.to_string(),
        phrase: phrase.to_string(),
    }
}

fn prefix(field: &str, prefix: &str) -> Filter {
    Filter::Prefix {
        field: field.to_string(),
        prefix: prefix.to_string(),
    }
}

const WORDS: [&str; 10] = [
    "a foo",
    "a foobar",
    "aa abc a",
    "ca afdf a,foobar baz",
    "a fddf foobarbaz",
    "",
    "a foobar abcdef",
    "a kjlkjf dfff",
    "a ТЕСТЙЦУК НГКШ ",
    "a !!,23.(!1)",
];

#[test]
fn test_and_of_phrase_and_prefix() {
    init_logging();
    let block = build_block("foo", &WORDS);
    let filter = Filter::And(vec![phrase("foo", "a"), prefix("foo", "abc")]);
    assert_eq!(matching_rows(&filter, &block), vec![2, 6]);
}

#[test]
fn test_or_of_phrase_and_prefix() {
    init_logging();
    let block = build_block("foo", &WORDS);
    let filter = Filter::Or(vec![phrase("foo", "23"), prefix("foo", "abc")]);
    assert_eq!(matching_rows(&filter, &block), vec![2, 6, 9]);
}

#[test]
fn test_contains_all_unordered_phrases() {
    init_logging();
    let block = build_block("foo", &WORDS);
    // Empty values never constrain the match; " " has no token edges and
    // matches as a plain substring.
    let filter = Filter::ContainsAll {
        field: "foo".to_string(),
        values: vec![
            "a".to_string(),
            "".to_string(),
            " ".to_string(),
            "foobar".to_string(),
        ],
    };
    assert_eq!(matching_rows(&filter, &block), vec![1, 3, 6]);

    let all_empty = Filter::ContainsAll {
        field: "foo".to_string(),
        values: vec!["".to_string()],
    };
    assert_eq!(
        matching_rows(&all_empty, &block).len(),
        block.row_count()
    );
}

#[test]
fn test_range_over_uint_column() {
    init_logging();
    let values = ["123", "12", "32", "0", "0", "12", "1", "2", "3", "4", "5"];
    let block = build_block("foo", &values);
    assert_eq!(block.column("foo").unwrap().value_type(), sift::ValueType::Uint8);
    let filter = Filter::Range {
        field: "foo".to_string(),
        min: 0.1,
        max: 2.9,
    };
    assert_eq!(matching_rows(&filter, &block), vec![6, 7]);
}

fn sample_filters() -> Vec<Filter> {
    vec![
        Filter::Noop,
        Filter::Exact {
            field: "foo".to_string(),
            value: "a foobar".to_string(),
        },
        Filter::ExactPrefix {
            field: "foo".to_string(),
            prefix: "a fo".to_string(),
        },
        phrase("foo", "foobar"),
        Filter::AnyCasePhrase {
            field: "foo".to_string(),
            phrase: "тестйцук".to_string(),
        },
        prefix("foo", "foo"),
        Filter::AnyCasePrefix {
            field: "foo".to_string(),
            prefix: "FOOBAR".to_string(),
        },
        Filter::Sequence {
            field: "foo".to_string(),
            phrases: vec!["a".to_string(), "foobar".to_string()],
        },
        Filter::In {
            field: "foo".to_string(),
            values: vec!["".to_string(), "a foo".to_string()],
        },
        Filter::ContainsAll {
            field: "foo".to_string(),
            values: vec!["a".to_string(), "foobar".to_string()],
        },
        Filter::Range {
            field: "foo".to_string(),
            min: 0.0,
            max: 100.0,
        },
        Filter::StringRange {
            field: "foo".to_string(),
            min: "a".to_string(),
            max: "b".to_string(),
        },
        Filter::Ipv4Range {
            field: "foo".to_string(),
            min: 0,
            max: u32::MAX,
        },
        Filter::LenRange {
            field: "foo".to_string(),
            min: 1,
            max: 8,
        },
        Filter::regexp("foo", "foo(bar)?").unwrap(),
        Filter::ValueType {
            field: "foo".to_string(),
            type_name: "string".to_string(),
        },
        Filter::Not(Box::new(phrase("foo", "a"))),
        Filter::Or(vec![phrase("foo", "baz"), prefix("foo", "ab")]),
    ]
}

#[test]
fn test_monotonic_narrowing_and_idempotence() {
    let block = build_block("foo", &WORDS);
    for filter in sample_filters() {
        let mut entry = Bitmap::all_set(block.row_count());
        // Start from a partial bitmap so narrowing is observable.
        entry.for_each_set_bit(|i| i != 3);
        let entry_rows = entry.indices();

        let mut bm = entry.clone();
        filter.apply(&block, &mut bm);
        let once = bm.indices();
        assert!(
            once.iter().all(|i| entry_rows.contains(i)),
            "filter widened the bitmap: {filter:?}"
        );

        filter.apply(&block, &mut bm);
        assert_eq!(bm.indices(), once, "filter is not idempotent: {filter:?}");
    }
}

#[test]
fn test_and_result_is_order_independent() {
    let block = build_block("foo", &WORDS);
    let f1 = phrase("foo", "a");
    let f2 = prefix("foo", "foo");
    let forward = matching_rows(&Filter::And(vec![f1.clone(), f2.clone()]), &block);
    let backward = matching_rows(&Filter::And(vec![f2, f1]), &block);
    assert_eq!(forward, backward);
}

#[test]
fn test_or_of_duplicate_children_equals_child() {
    let block = build_block("foo", &WORDS);
    for filter in sample_filters() {
        let doubled = Filter::Or(vec![filter.clone(), filter.clone()]);
        assert_eq!(
            matching_rows(&doubled, &block),
            matching_rows(&filter, &block),
            "OR[f, f] != f for {filter:?}"
        );
    }
}

#[test]
fn test_not_complements_within_entry_bitmap() {
    let block = build_block("foo", &WORDS);
    for filter in sample_filters() {
        let mut entry = Bitmap::all_set(block.row_count());
        entry.for_each_set_bit(|i| i % 2 == 0);

        let mut pos = entry.clone();
        filter.apply(&block, &mut pos);
        let mut neg = entry.clone();
        Filter::Not(Box::new(filter.clone())).apply(&block, &mut neg);

        let mut union = pos.clone();
        union.or(&neg);
        assert_eq!(union.indices(), entry.indices(), "union broken: {filter:?}");

        assert!(
            pos.indices().iter().all(|&i| !neg.is_set(i)),
            "overlap: {filter:?}"
        );
    }
}

/// Dict columns evaluate predicates once per distinct value. The oracle
/// builds a one-row block per value, which takes the const path instead,
/// and both must agree for every filter kind.
#[test]
fn test_dict_fast_path_matches_per_row_oracle() {
    let values = [
        "foo bar", "127.0.0.1", "10", "", "FOO", "тест 123", "foo bar", "x_y",
    ];
    let block = build_block("foo", &values);
    assert_eq!(block.column("foo").unwrap().value_type(), sift::ValueType::Dict);

    for filter in sample_filters() {
        let via_dict = matching_rows(&filter, &block);
        let via_oracle: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| {
                let single = build_block("foo", &[v]);
                !matching_rows(&filter, &single).is_empty()
            })
            .map(|(i, _)| i)
            .collect();
        assert_eq!(via_dict, via_oracle, "dict/oracle mismatch: {filter:?}");
    }
}

#[test]
fn test_equivalent_timestamp_in_other_format_does_not_match() {
    let timestamps: Vec<String> = (1..=9)
        .map(|i| format!("2006-01-02T15:04:05.00{i}Z"))
        .collect();
    let refs: Vec<&str> = timestamps.iter().map(|s| s.as_str()).collect();
    let block = build_block("ts", &refs);
    assert_eq!(
        block.column("ts").unwrap().value_type(),
        sift::ValueType::TimestampIso8601
    );

    // Same instant as row 4, expressed with a timezone offset.
    let shifted = phrase("ts", "2006-01-02T16:04:05.005+01:00");
    assert_eq!(matching_rows(&shifted, &block), Vec::<usize>::new());

    let canonical = phrase("ts", "2006-01-02T15:04:05.005Z");
    assert_eq!(matching_rows(&canonical, &block), vec![4]);
}

#[test]
fn test_filter_tree_is_reentrant_across_threads() {
    let filter = Filter::And(vec![
        Filter::Or(vec![phrase("foo", "a"), prefix("foo", "ab")]),
        Filter::Not(Box::new(phrase("foo", "foobarbaz"))),
    ]);

    let blocks: Vec<Block> = (0..64)
        .map(|shift| {
            let mut values = WORDS.to_vec();
            values.rotate_left(shift % WORDS.len());
            build_block("foo", &values)
        })
        .collect();

    let sequential: Vec<Vec<usize>> = blocks
        .iter()
        .map(|b| matching_rows(&filter, b))
        .collect();
    let parallel: Vec<Vec<usize>> = blocks
        .par_iter()
        .map(|b| matching_rows(&filter, b))
        .collect();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_absent_field_behaves_as_empty_value() {
    let block = build_block("foo", &WORDS);

    // Only the empty string matches an empty phrase.
    let empty = phrase("missing", "");
    assert_eq!(matching_rows(&empty, &block).len(), block.row_count());

    let nonempty = phrase("missing", "a");
    assert!(matching_rows(&nonempty, &block).is_empty());

    let len_zero = Filter::LenRange {
        field: "missing".to_string(),
        min: 0,
        max: 0,
    };
    assert_eq!(matching_rows(&len_zero, &block).len(), block.row_count());
}

#[test]
fn test_time_and_week_filters_against_block_timestamps() {
    // 2024-01-01T00:00:00Z was a Monday.
    const DAY: i64 = 86_400_000_000_000;
    const MONDAY: i64 = 1_704_067_200_000_000_000;
    let timestamps: Vec<i64> = (0..7).map(|d| MONDAY + d * DAY).collect();
    let block = BlockBuilder::new()
        .column("msg", &["m0", "m1", "m2", "m3", "m4", "m5", "m6"])
        .timestamps(&timestamps)
        .build()
        .unwrap();

    let range = Filter::TimeRange {
        min: MONDAY + DAY,
        max: MONDAY + 3 * DAY,
    };
    assert_eq!(matching_rows(&range, &block), vec![1, 2, 3]);

    let weekend = Filter::WeekRange {
        start_day: chrono::Weekday::Sat,
        end_day: chrono::Weekday::Sun,
        offset: 0,
    };
    assert_eq!(matching_rows(&weekend, &block), vec![5, 6]);
}
