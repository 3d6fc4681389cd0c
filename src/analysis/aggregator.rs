//! Feedback aggregation and statistics.
//!
//! This module turns the current record set into an [`AggregateSnapshot`]:
//! brand counts, CSAT statistics, issue keyword and free-word tallies, and a
//! bounded sample of records for prompts. Everything here is pure and
//! recomputed for every request.

use crate::analysis::vocabulary::{is_stop_word, ISSUE_TERMS};
use crate::models::{AggregateSnapshot, FeedbackRecord};
use indexmap::IndexMap;
use tracing::debug;

/// Knobs for aggregation and for how much of it reaches a prompt or report.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    /// Free words listed in reports.
    pub top_words: usize,
    /// Issue keywords listed in reports and prompts.
    pub top_issues: usize,
    /// Records always sampled from each end of the set.
    pub sample_edge: usize,
    /// Approximate number of evenly strided samples.
    pub sample_target: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_words: 10,
            top_issues: 10,
            sample_edge: 5,
            sample_target: 20,
        }
    }
}

impl From<&crate::config::AnalysisConfig> for AggregateOptions {
    fn from(config: &crate::config::AnalysisConfig) -> Self {
        Self {
            top_words: config.top_words,
            top_issues: config.top_issues,
            sample_edge: config.sample_edge,
            sample_target: config.sample_target.max(1),
        }
    }
}

/// Compute the aggregate snapshot of a record set.
pub fn aggregate(records: &[FeedbackRecord], options: &AggregateOptions) -> AggregateSnapshot {
    let mut snapshot = AggregateSnapshot {
        record_count: records.len(),
        ..AggregateSnapshot::default()
    };
    let mut issue_counts = vec![0usize; ISSUE_TERMS.len()];

    for record in records {
        *snapshot
            .brand_counts
            .entry(record.brand.clone())
            .or_insert(0) += 1;

        if snapshot.date_range.first.is_none() {
            snapshot.date_range.first = Some(record.date.clone());
        }
        snapshot.date_range.last = Some(record.date.clone());

        if let Some(score) = record.csat_score() {
            snapshot.overall_csat.add(score);
            snapshot
                .csat_by_brand
                .entry(record.brand.clone())
                .or_default()
                .add(score);
            snapshot.csat_bins[csat_bin(score)] += 1;
        }

        if record.has_feedback() {
            let text = record.feedback.to_lowercase();

            for (slot, term) in issue_counts.iter_mut().zip(ISSUE_TERMS) {
                if text.contains(term) {
                    *slot += 1;
                }
            }

            for word in free_words(&text) {
                *snapshot.free_word_counts.entry(word).or_insert(0) += 1;
            }
        }
    }

    snapshot.issue_keyword_counts = ISSUE_TERMS
        .iter()
        .zip(issue_counts)
        .filter(|(_, count)| *count > 0)
        .map(|(term, count)| (*term, count))
        .collect::<IndexMap<_, _>>();

    snapshot.samples = sample_records(records, options.sample_edge, options.sample_target);

    debug!(
        "Aggregated {} records: {} brands, {} valid CSAT scores, {} distinct words",
        snapshot.record_count,
        snapshot.brand_counts.len(),
        snapshot.overall_csat.count,
        snapshot.free_word_counts.len()
    );

    snapshot
}

/// Index into the fixed CSAT histogram for a valid score.
pub fn csat_bin(score: f64) -> usize {
    if score <= 2.0 {
        0
    } else if score <= 4.0 {
        1
    } else if score <= 6.0 {
        2
    } else if score <= 8.0 {
        3
    } else {
        4
    }
}

/// Split already lower-cased text into countable words.
///
/// Punctuation is stripped rather than treated as a separator, so
/// "didn't" becomes "didnt".
pub fn free_words(lowercased: &str) -> Vec<String> {
    let cleaned: String = lowercased
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 3 && !is_stop_word(word))
        .map(String::from)
        .collect()
}

/// Pick the illustrative subset: both ends plus an even stride through the set.
pub fn sample_records(
    records: &[FeedbackRecord],
    edge: usize,
    target: usize,
) -> Vec<FeedbackRecord> {
    let len = records.len();
    let stride = (len / target.max(1)).max(1);

    records
        .iter()
        .enumerate()
        .filter(|(index, _)| {
            *index < edge || *index >= len.saturating_sub(edge) || index % stride == 0
        })
        .map(|(_, record)| record.clone())
        .collect()
}
