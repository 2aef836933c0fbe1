//! Folds raw per-answer rows into one record per question, then applies the
//! relevance filter.

use std::collections::HashMap;

use super::relevance;
use super::{ConsolidatedRecord, RawQARow, ANSWER_SEPARATOR};

/// A question group after folding but before relevance filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedQa {
    pub qid: String,
    pub question: String,
    pub metadata: String,
    pub consolidated_answer: String,
}

#[derive(Debug, Default)]
struct GroupAccumulator {
    question: Option<String>,
    metadata: Option<String>,
    variants_a: Vec<String>,
    variants_b: Vec<String>,
}

/// Groups rows by `qid` in first-seen order and folds each group.
///
/// `question` and `metadata` take the first non-null value observed for the
/// group. The two answer-variant columns are deduplicated independently
/// (exact, case-sensitive) preserving first occurrence, each joined with
/// [`ANSWER_SEPARATOR`], and the two joined strings concatenated with the
/// same separator.
pub fn group_rows(rows: Vec<RawQARow>) -> Vec<GroupedQa> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, GroupAccumulator> = HashMap::new();

    for row in rows {
        let accumulator = groups.entry(row.qid.clone()).or_insert_with(|| {
            order.push(row.qid.clone());
            GroupAccumulator::default()
        });
        if accumulator.question.is_none() && row.question.is_some() {
            accumulator.question = row.question;
        }
        if accumulator.metadata.is_none() && row.metadata.is_some() {
            accumulator.metadata = row.metadata;
        }
        if let Some(variant) = row.response_variant_a {
            if !accumulator.variants_a.contains(&variant) {
                accumulator.variants_a.push(variant);
            }
        }
        if let Some(variant) = row.response_variant_b {
            if !accumulator.variants_b.contains(&variant) {
                accumulator.variants_b.push(variant);
            }
        }
    }

    order
        .into_iter()
        .map(|qid| {
            let accumulator = groups.remove(&qid).expect("group recorded in order list");
            let consolidated_answer = format!(
                "{}{ANSWER_SEPARATOR}{}",
                accumulator.variants_a.join(ANSWER_SEPARATOR),
                accumulator.variants_b.join(ANSWER_SEPARATOR),
            );
            GroupedQa {
                qid,
                question: accumulator.question.unwrap_or_default(),
                metadata: accumulator.metadata.unwrap_or_default(),
                consolidated_answer,
            }
        })
        .collect()
}

/// Consolidates a batch of raw rows into relevance-filtered records.
///
/// `parent_index` is assigned as the dense position of each retained group
/// within this batch's output; the ingestion pipeline offsets it by the
/// running total so indices stay dense across batches.
pub fn consolidate(rows: Vec<RawQARow>) -> Vec<ConsolidatedRecord> {
    let mut records = Vec::new();
    for group in group_rows(rows) {
        let flags = relevance::classify(&group.question, &group.consolidated_answer);
        if !flags.retain() {
            continue;
        }
        records.push(ConsolidatedRecord {
            parent_index: records.len() as i64,
            qid: group.qid,
            question: group.question,
            metadata: group.metadata,
            consolidated_answer: group.consolidated_answer,
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(qid: &str, question: Option<&str>, a: Option<&str>, b: Option<&str>) -> RawQARow {
        RawQARow {
            qid: qid.to_string(),
            question: question.map(str::to_string),
            metadata: question.map(|_| format!("https://example.com/{qid}")),
            response_variant_a: a.map(str::to_string),
            response_variant_b: b.map(str::to_string),
        }
    }

    /// Answer text that passes the relevance filter on its own.
    const RELEVANT: &str = "python pandas numpy\n```\nimport pandas\n```";

    #[test]
    fn one_group_per_unique_qid() {
        let rows = vec![
            row("q1", Some("first?"), Some("a1"), None),
            row("q2", Some("second?"), Some("a2"), None),
            row("q1", None, Some("a3"), None),
            row("q3", Some("third?"), None, Some("b1")),
        ];
        let groups = group_rows(rows);
        assert_eq!(groups.len(), 3);
        assert_eq!(
            groups.iter().map(|g| g.qid.as_str()).collect::<Vec<_>>(),
            vec!["q1", "q2", "q3"],
        );
    }

    #[test]
    fn answer_variants_deduplicated_independently() {
        let rows = vec![
            row("q1", Some("q?"), Some("shared"), Some("unique-b")),
            row("q1", None, Some("shared"), Some("other-b")),
            row("q1", None, Some("distinct"), Some("other-b")),
        ];
        let groups = group_rows(rows);
        assert_eq!(groups.len(), 1);
        let answer = &groups[0].consolidated_answer;
        assert_eq!(answer.matches("shared").count(), 1);
        assert_eq!(answer.matches("distinct").count(), 1);
        assert_eq!(answer.matches("unique-b").count(), 1);
        assert_eq!(answer.matches("other-b").count(), 1);
        assert_eq!(
            answer,
            &format!(
                "shared{ANSWER_SEPARATOR}distinct{ANSWER_SEPARATOR}unique-b{ANSWER_SEPARATOR}other-b"
            )
        );
    }

    #[test]
    fn question_and_metadata_take_first_non_null() {
        let rows = vec![
            row("q1", None, Some("a1"), None),
            row("q1", Some("late question?"), Some("a2"), None),
        ];
        let groups = group_rows(rows);
        assert_eq!(groups[0].question, "late question?");
        assert_eq!(groups[0].metadata, "https://example.com/q1");
    }

    #[test]
    fn variant_dedup_is_case_sensitive() {
        let rows = vec![
            row("q1", Some("q?"), Some("Answer"), None),
            row("q1", None, Some("answer"), None),
        ];
        let groups = group_rows(rows);
        assert!(groups[0].consolidated_answer.contains("Answer"));
        assert!(groups[0].consolidated_answer.contains("answer"));
    }

    #[test]
    fn filtered_records_get_dense_parent_indices() {
        let rows = vec![
            row("keep-1", Some("q?"), Some(RELEVANT), None),
            row("drop-1", Some("q?"), Some("irrelevant prose"), None),
            row("keep-2", Some("q?"), Some(RELEVANT), None),
            row("drop-2", Some("q?"), Some("java\n```\ncode\n```"), None),
            row("keep-3", Some("q?"), Some(RELEVANT), None),
        ];
        let records = consolidate(rows);
        assert_eq!(
            records.iter().map(|r| r.qid.as_str()).collect::<Vec<_>>(),
            vec!["keep-1", "keep-2", "keep-3"],
        );
        assert_eq!(
            records.iter().map(|r| r.parent_index).collect::<Vec<_>>(),
            vec![0, 1, 2],
        );
    }

    #[test]
    fn group_missing_all_answers_still_folds() {
        let rows = vec![row("q1", Some("only a question"), None, None)];
        let groups = group_rows(rows);
        assert_eq!(groups[0].consolidated_answer, ANSWER_SEPARATOR);
        // ...and is dropped by the relevance filter.
        let records = consolidate(vec![row("q1", Some("only a question"), None, None)]);
        assert!(records.is_empty());
    }
}
