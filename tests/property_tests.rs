//! Property-based tests for urlchecker using proptest
//!
//! These tests generate random inputs for the pure parts of the pipeline:
//! partitioning, failure classification, line formats and collation.

use proptest::prelude::*;

use urlchecker::core::types::{ProbeResult, RecordType, UrlRecord};
use urlchecker::pipeline::partitioner::{partition, plan};
use urlchecker::reporting::collator::{Bucket, Collator};
use urlchecker::validation::classifier::{CLASSIFICATION_RULES, FALLBACK_CODE, classify};

/// Generate plausible catalog URLs
fn url_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::collection::vec("[a-z]{3,10}", 1..4)
            .prop_map(|parts| format!("https://{}.org", parts.join("."))),
        (r"[a-z]{3,8}", prop::collection::vec(r"[a-z0-9]{1,8}", 0..4)).prop_map(
            |(domain, path)| format!("http://{}.edu/{}", domain, path.join("/"))
        ),
        (r"[a-z]{3,8}", r"[a-z]{1,8}", r"[a-z0-9]{1,8}")
            .prop_map(|(domain, key, value)| format!("https://{domain}.com?{key}={value}")),
    ]
}

fn record_type_strategy() -> impl Strategy<Value = RecordType> {
    prop_oneof![Just(RecordType::Bibliographic), Just(RecordType::Portfolio)]
}

/// Status and synthetic codes, reported or not
fn code_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(400u16),
        Just(401),
        Just(403),
        Just(404),
        Just(410),
        Just(500),
        Just(501),
        Just(603),
        Just(605),
        Just(607),
        Just(608),
        Just(609),
        Just(610),
        100u16..1000,
    ]
}

/// Text that contains none of the classifier patterns
fn neutral_message_strategy() -> impl Strategy<Value = String> {
    r"[a-z ]{0,40}".prop_filter("must not contain a classifier pattern", |msg| {
        !msg.contains("Read timed out")
            && !msg.contains("No connection adapters")
            && !msg.contains("No schema supplied")
            && !msg.contains("Failed to establish a new")
            && !(msg.contains("Connection to") && msg.contains("timed out"))
    })
}

proptest! {
    #[test]
    fn test_plan_sizes_sum_to_total(total in 0usize..5000, workers in 1usize..64) {
        let plan = plan(total, workers).unwrap();

        prop_assert_eq!(plan.batch_sizes.iter().sum::<usize>(), total);
        prop_assert_eq!(plan.worker_count(), plan.batch_sizes.len());
        prop_assert!(plan.worker_count() <= workers + 1);
        if total >= workers {
            prop_assert!(plan.worker_count() >= workers);
        } else {
            prop_assert_eq!(plan.worker_count(), 1);
        }
    }

    #[test]
    fn test_plan_is_deterministic(total in 0usize..5000, workers in 1usize..64) {
        prop_assert_eq!(plan(total, workers).unwrap(), plan(total, workers).unwrap());
    }

    #[test]
    fn test_partition_preserves_every_line_in_order(
        lines in prop::collection::vec("[a-z0-9]{1,12}", 0..300),
        workers in 1usize..32,
    ) {
        let batches = partition(lines.clone(), workers).unwrap();

        for (i, batch) in batches.iter().enumerate() {
            prop_assert_eq!(batch.index, i);
        }
        let flattened: Vec<String> = batches.into_iter().flat_map(|b| b.lines).collect();
        prop_assert_eq!(flattened, lines);
    }

    #[test]
    fn test_classify_is_deterministic(message in ".{0,80}") {
        prop_assert_eq!(classify(&message), classify(&message));
    }

    #[test]
    fn test_classify_falls_back_without_pattern(message in neutral_message_strategy()) {
        prop_assert_eq!(classify(&message), FALLBACK_CODE);
    }

    #[test]
    fn test_classify_first_rule_wins(
        first in 0usize..4,
        second in 0usize..4,
        prefix in "[a-z ]{0,10}",
        suffix in "[a-z ]{0,10}",
    ) {
        // Fixed phrases of the first four rules, in table order
        let phrases = ["Failed to establish a new", "Read timed out", "No connection adapters", "No schema supplied"];
        let message = format!("{prefix}{}{suffix}{}", phrases[second], phrases[first]);

        let expected = CLASSIFICATION_RULES[first.min(second)].1;
        prop_assert_eq!(classify(&message), expected);
    }

    #[test]
    fn test_result_line_carries_record(
        url in url_strategy(),
        record_id in "[0-9]{1,18}",
        record_type in record_type_strategy(),
        code in code_strategy(),
    ) {
        let line = format!("{url}_|_{record_id}_|_{record_type}");
        let record = UrlRecord::parse_line(&line).unwrap();
        let result = ProbeResult::new(&record, code, &line);

        let parsed = ProbeResult::parse_line(&result.to_line()).unwrap();

        prop_assert_eq!(parsed.result_code, code);
        prop_assert_eq!(parsed.target_url, url);
        prop_assert_eq!(parsed.record_id, record_id);
        prop_assert_eq!(parsed.record_type, record_type);
        prop_assert_eq!(parsed.raw_line, line);
    }

    #[test]
    fn test_collator_routes_to_exactly_one_cell(
        url in url_strategy(),
        record_type in record_type_strategy(),
        code in code_strategy(),
    ) {
        let line = format!("{url}_|_42_|_{record_type}");
        let record = UrlRecord::parse_line(&line).unwrap();
        let result_line = ProbeResult::new(&record, code, &line).to_line();

        let mut collator = Collator::new();
        let bucket = collator.collate_line(&result_line);
        let accumulator = collator.finish();

        prop_assert_eq!(bucket, Bucket::from_code(code));
        match bucket {
            Some(bucket) => {
                prop_assert_eq!(accumulator.len(), 1);
                let expected = format!("{url} mms_id: 42\n");
                prop_assert_eq!(accumulator.cell(bucket, record_type), Some(expected.as_str()));
            }
            None => prop_assert!(accumulator.is_empty()),
        }
    }
}
