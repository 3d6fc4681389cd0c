//! Data models for the feedback query engine.
//!
//! This module contains the core data structures shared by the aggregation,
//! chart, delegate and report modules: feedback records, the per-request
//! aggregate snapshot, chart specifications and the final answer.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Placeholder shown wherever a CSAT mean cannot be computed.
pub const NOT_AVAILABLE: &str = "N/A";

/// One normalized customer-feedback entry, as produced by ingestion.
///
/// The CSAT score is kept as the raw text ingestion handed over; whether it
/// is a usable number is decided during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Response date (ingestion strips the time part).
    #[serde(default, alias = "Response Date")]
    pub date: String,
    /// Brand the feedback is about.
    #[serde(default, alias = "Brand")]
    pub brand: String,
    /// Raw CSAT score, if any.
    #[serde(
        default,
        alias = "Digital CSAT",
        deserialize_with = "deserialize_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub csat: Option<String>,
    /// Concatenated free-text comments.
    #[serde(default, alias = "Feedback")]
    pub feedback: String,
}

impl FeedbackRecord {
    /// Creates a record from its parts.
    pub fn new(date: &str, brand: &str, csat: Option<&str>, feedback: &str) -> Self {
        Self {
            date: date.to_string(),
            brand: brand.to_string(),
            csat: csat.map(String::from),
            feedback: feedback.to_string(),
        }
    }

    /// Returns the CSAT score if it parses to a finite number.
    pub fn csat_score(&self) -> Option<f64> {
        parse_csat(self.csat.as_deref())
    }

    /// Whether the record carries any feedback text.
    pub fn has_feedback(&self) -> bool {
        !self.feedback.trim().is_empty()
    }
}

/// Parse a raw CSAT value from its leading number.
///
/// Survey exports carry cells like "5 - Very Satisfied" or "4/5"; the
/// longest numeric prefix is the score. Values with no numeric prefix, or
/// that are not finite, are invalid.
pub fn parse_csat(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    let candidate_len = trimmed
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(trimmed.len());

    (1..=candidate_len)
        .rev()
        .find_map(|end| trimmed[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Ingestion may emit the score as a string, a number or null.
fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Text(String),
        Number(f64),
    }

    Ok(
        Option::<RawScore>::deserialize(deserializer)?.map(|raw| match raw {
            RawScore::Text(s) => s,
            RawScore::Number(n) => n.to_string(),
        }),
    )
}

/// Running count and sum of valid CSAT scores.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CsatStats {
    pub count: usize,
    pub sum: f64,
}

impl CsatStats {
    /// Adds one valid score.
    pub fn add(&mut self, score: f64) {
        self.count += 1;
        self.sum += score;
    }

    /// Mean score, or `None` when no valid score was seen.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    /// Mean formatted with two decimals, or [`NOT_AVAILABLE`].
    pub fn display_mean(&self) -> String {
        match self.mean() {
            Some(mean) => format!("{:.2}", mean),
            None => NOT_AVAILABLE.to_string(),
        }
    }
}

/// First and last response dates, in record order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRange {
    pub first: Option<String>,
    pub last: Option<String>,
}

/// Labels of the fixed CSAT histogram bins.
pub const CSAT_BIN_LABELS: [&str; 5] = ["1-2", "3-4", "5-6", "7-8", "9-10"];

/// Statistics derived from the record set for a single request.
///
/// Maps keep a stable order: brands and free words in first-seen order,
/// issue keywords in vocabulary order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateSnapshot {
    /// Number of records the snapshot was computed from.
    pub record_count: usize,
    /// Records per brand.
    pub brand_counts: IndexMap<String, usize>,
    /// Valid CSAT scores per brand (only brands with at least one).
    pub csat_by_brand: IndexMap<String, CsatStats>,
    /// Valid CSAT scores across all records.
    pub overall_csat: CsatStats,
    /// Response date range.
    pub date_range: DateRange,
    /// Histogram of valid CSAT scores over [`CSAT_BIN_LABELS`].
    pub csat_bins: [usize; 5],
    /// Records mentioning each issue keyword (non-zero entries only).
    pub issue_keyword_counts: IndexMap<&'static str, usize>,
    /// Free-word tallies.
    pub free_word_counts: IndexMap<String, usize>,
    /// Illustrative subset of records for prompts.
    pub samples: Vec<FeedbackRecord>,
}

impl AggregateSnapshot {
    /// Top `n` issue keywords by descending count; ties keep vocabulary order.
    pub fn top_issues(&self, n: usize) -> Vec<(&'static str, usize)> {
        let mut ranked: Vec<_> = self
            .issue_keyword_counts
            .iter()
            .map(|(term, count)| (*term, *count))
            .collect();
        ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        ranked.truncate(n);
        ranked
    }

    /// Top `n` free words by descending count; ties keep first-seen order.
    pub fn top_words(&self, n: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<_> = self
            .free_word_counts
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
            .collect();
        ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        ranked.truncate(n);
        ranked
    }

    /// Share of records belonging to `brand`, in percent.
    pub fn brand_share(&self, brand: &str) -> f64 {
        if self.record_count == 0 {
            return 0.0;
        }
        let count = self.brand_counts.get(brand).copied().unwrap_or(0);
        count as f64 / self.record_count as f64 * 100.0
    }
}

/// Kind of chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Doughnut,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Doughnut => write!(f, "doughnut"),
        }
    }
}

/// Rendering hints for a series. The renderer is free to ignore them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorHints {
    pub background: Vec<String>,
    pub border: Vec<String>,
    pub border_width: u32,
}

/// One data series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub values: Vec<f64>,
    pub colors: ColorHints,
}

/// Technology-neutral description of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// Which path produced an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AnswerSource {
    /// The store was empty.
    NoData,
    /// The question was a chart request.
    Chart,
    /// A delegate endpoint answered.
    Delegate { endpoint: String },
    /// Every delegate failed; the local report was used.
    Narrator,
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerSource::NoData => write!(f, "no data"),
            AnswerSource::Chart => write!(f, "chart"),
            AnswerSource::Delegate { endpoint } => write!(f, "delegate ({})", endpoint),
            AnswerSource::Narrator => write!(f, "local report"),
        }
    }
}

/// The engine's answer to one question.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnswer {
    /// Answer or caption text.
    pub text: String,
    /// Chart to display alongside the text.
    pub chart: Option<ChartSpec>,
    /// Number of records the answer is based on.
    pub records_used: usize,
    /// Path that produced the answer.
    pub source: AnswerSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csat() {
        assert_eq!(parse_csat(Some("4")), Some(4.0));
        assert_eq!(parse_csat(Some(" 3.5 ")), Some(3.5));
        assert_eq!(parse_csat(Some("")), None);
        assert_eq!(parse_csat(Some("great")), None);
        assert_eq!(parse_csat(Some("NaN")), None);
        assert_eq!(parse_csat(Some("inf")), None);
        assert_eq!(parse_csat(None), None);
    }

    #[test]
    fn test_parse_csat_reads_leading_number() {
        assert_eq!(parse_csat(Some("5 - Very Satisfied")), Some(5.0));
        assert_eq!(parse_csat(Some("4/5")), Some(4.0));
        assert_eq!(parse_csat(Some(" 3.5 stars")), Some(3.5));
        assert_eq!(parse_csat(Some("2e")), Some(2.0));
        assert_eq!(parse_csat(Some("- 3")), None);
        assert_eq!(parse_csat(Some("N/A")), None);
    }

    #[test]
    fn test_csat_stats_display() {
        let mut stats = CsatStats::default();
        assert_eq!(stats.display_mean(), NOT_AVAILABLE);

        stats.add(4.0);
        stats.add(5.0);
        stats.add(5.0);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.display_mean(), "4.67");
    }

    #[test]
    fn test_record_deserialize_ingestion_columns() {
        let json = r#"[
            {"Response Date": "2024-03-01", "Brand": "CB2", "Digital CSAT": "4", "Feedback": "Late delivery"},
            {"date": "2024-03-02", "brand": "Crate", "csat": 5, "feedback": ""},
            {"date": "2024-03-03", "brand": "Crate", "csat": null, "feedback": "ok"}
        ]"#;

        let records: Vec<FeedbackRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].brand, "CB2");
        assert_eq!(records[0].csat_score(), Some(4.0));
        assert_eq!(records[1].csat_score(), Some(5.0));
        assert!(!records[1].has_feedback());
        assert_eq!(records[2].csat, None);
    }

    #[test]
    fn test_top_issues_tie_keeps_vocabulary_order() {
        let mut snapshot = AggregateSnapshot::default();
        snapshot.issue_keyword_counts.insert("delivery", 2);
        snapshot.issue_keyword_counts.insert("damaged", 3);
        snapshot.issue_keyword_counts.insert("refund", 2);

        let top = snapshot.top_issues(2);
        assert_eq!(top, vec![("damaged", 3), ("delivery", 2)]);
    }

    #[test]
    fn test_answer_source_display() {
        let source = AnswerSource::Delegate {
            endpoint: "ollama".to_string(),
        };
        assert_eq!(source.to_string(), "delegate (ollama)");
        assert_eq!(AnswerSource::Narrator.to_string(), "local report");
    }
}
