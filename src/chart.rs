//! Chart intent resolution.
//!
//! A question is a chart request only if it contains one of the trigger
//! words. Given a trigger, an ordered rule table decides which chart is
//! meant; the first matching rule wins and anything else is not a chart.

use crate::models::{
    AggregateSnapshot, ChartKind, ChartSeries, ChartSpec, ColorHints, CSAT_BIN_LABELS,
};
use tracing::debug;

/// Words that mark a question as a visualization request.
pub const TRIGGER_WORDS: &[&str] = &["chart", "graph", "visualize", "plot"];

const PALETTE_BACKGROUND: &[&str] = &["#3B82F6", "#10B981", "#F59E0B", "#EF4444"];
const PALETTE_BORDER: &[&str] = &["#2563EB", "#059669", "#D97706", "#DC2626"];

/// The charts the engine knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartIntent {
    /// Mean CSAT per brand.
    CsatByBrand,
    /// Record count per brand.
    BrandDistribution,
    /// Valid CSAT scores in fixed bins.
    CsatDistribution,
}

/// A rule matches when every group has at least one keyword in the question.
struct IntentRule {
    intent: ChartIntent,
    all_of: &'static [&'static [&'static str]],
}

/// Priority order matters: a question about "csat by brand distribution"
/// resolves to the first rule.
const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: ChartIntent::CsatByBrand,
        all_of: &[&["csat"], &["brand", "compare"]],
    },
    IntentRule {
        intent: ChartIntent::BrandDistribution,
        all_of: &[&["brand"], &["distribution", "count", "breakdown"]],
    },
    IntentRule {
        intent: ChartIntent::CsatDistribution,
        all_of: &[&["csat"], &["distribution"]],
    },
];

impl IntentRule {
    fn matches(&self, lowered: &str) -> bool {
        self.all_of
            .iter()
            .all(|group| group.iter().any(|keyword| lowered.contains(keyword)))
    }
}

/// Work out which chart, if any, the question asks for.
pub fn resolve_intent(question: &str) -> Option<ChartIntent> {
    let lowered = question.to_lowercase();

    if !TRIGGER_WORDS.iter().any(|word| lowered.contains(word)) {
        return None;
    }

    let intent = INTENT_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.intent);

    debug!("Chart intent for {:?}: {:?}", question, intent);
    intent
}

/// Resolve the question and build the chart from the snapshot.
pub fn resolve_chart(question: &str, snapshot: &AggregateSnapshot) -> Option<ChartSpec> {
    resolve_intent(question).map(|intent| intent.build(snapshot))
}

impl ChartIntent {
    /// Build the chart for this intent.
    pub fn build(self, snapshot: &AggregateSnapshot) -> ChartSpec {
        match self {
            ChartIntent::CsatByBrand => csat_by_brand_chart(snapshot),
            ChartIntent::BrandDistribution => brand_distribution_chart(snapshot),
            ChartIntent::CsatDistribution => csat_distribution_chart(snapshot),
        }
    }
}

fn csat_by_brand_chart(snapshot: &AggregateSnapshot) -> ChartSpec {
    let (labels, values): (Vec<String>, Vec<f64>) = snapshot
        .csat_by_brand
        .iter()
        .filter_map(|(brand, stats)| stats.mean().map(|mean| (brand.clone(), round_one(mean))))
        .unzip();

    ChartSpec {
        kind: ChartKind::Bar,
        title: "Average CSAT Score by Brand".to_string(),
        labels,
        series: vec![ChartSeries {
            label: Some("Average CSAT Score".to_string()),
            values,
            colors: ColorHints {
                background: palette(PALETTE_BACKGROUND),
                border: palette(PALETTE_BORDER),
                border_width: 1,
            },
        }],
    }
}

fn brand_distribution_chart(snapshot: &AggregateSnapshot) -> ChartSpec {
    let (labels, values): (Vec<String>, Vec<f64>) = snapshot
        .brand_counts
        .iter()
        .map(|(brand, count)| (brand.clone(), *count as f64))
        .unzip();

    ChartSpec {
        kind: ChartKind::Doughnut,
        title: "Feedback Distribution by Brand".to_string(),
        labels,
        series: vec![ChartSeries {
            label: None,
            values,
            colors: ColorHints {
                background: palette(PALETTE_BACKGROUND),
                border: vec!["#ffffff".to_string()],
                border_width: 2,
            },
        }],
    }
}

fn csat_distribution_chart(snapshot: &AggregateSnapshot) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Bar,
        title: "CSAT Score Distribution".to_string(),
        labels: CSAT_BIN_LABELS.iter().map(|l| l.to_string()).collect(),
        series: vec![ChartSeries {
            label: Some("Number of Responses".to_string()),
            values: snapshot.csat_bins.iter().map(|n| *n as f64).collect(),
            colors: ColorHints {
                background: palette(&PALETTE_BACKGROUND[..1]),
                border: palette(&PALETTE_BORDER[..1]),
                border_width: 1,
            },
        }],
    }
}

fn palette(colors: &[&str]) -> Vec<String> {
    colors.iter().map(|c| c.to_string()).collect()
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, AggregateOptions};
    use crate::models::FeedbackRecord;

    fn snapshot_of(records: &[FeedbackRecord]) -> AggregateSnapshot {
        aggregate(records, &AggregateOptions::default())
    }

    fn abc_records() -> Vec<FeedbackRecord> {
        vec![
            FeedbackRecord::new("2024-01-01", "A", Some("4"), "fine"),
            FeedbackRecord::new("2024-01-02", "A", Some("2"), "slow delivery"),
            FeedbackRecord::new("2024-01-03", "B", Some("5"), "great"),
        ]
    }

    #[test]
    fn test_csat_by_brand_chart() {
        let snapshot = snapshot_of(&abc_records());
        let chart = resolve_chart("show me a chart comparing csat by brand", &snapshot).unwrap();

        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.labels, vec!["A", "B"]);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].values, vec![3.0, 5.0]);
    }

    #[test]
    fn test_no_trigger_word_is_not_a_chart() {
        let snapshot = snapshot_of(&abc_records());
        assert_eq!(resolve_chart("brand breakdown", &snapshot), None);
        assert_eq!(resolve_intent("compare csat by brand"), None);
    }

    #[test]
    fn test_trigger_without_rule_is_not_a_chart() {
        assert_eq!(resolve_intent("plot the distribution of issues"), None);
        assert_eq!(resolve_intent("draw a graph"), None);
    }

    #[test]
    fn test_rule_priority() {
        assert_eq!(
            resolve_intent("Graph the CSAT distribution by brand"),
            Some(ChartIntent::CsatByBrand)
        );
        assert_eq!(
            resolve_intent("visualize brand count"),
            Some(ChartIntent::BrandDistribution)
        );
        assert_eq!(
            resolve_intent("Plot CSAT distribution"),
            Some(ChartIntent::CsatDistribution)
        );
        assert_eq!(
            resolve_intent("chart to compare csat"),
            Some(ChartIntent::CsatByBrand)
        );
    }

    #[test]
    fn test_brand_distribution_chart() {
        let snapshot = snapshot_of(&abc_records());
        let chart = resolve_chart("Chart the brand breakdown", &snapshot).unwrap();

        assert_eq!(chart.kind, ChartKind::Doughnut);
        assert_eq!(chart.title, "Feedback Distribution by Brand");
        assert_eq!(chart.labels, vec!["A", "B"]);
        assert_eq!(chart.series[0].values, vec![2.0, 1.0]);
        assert_eq!(chart.series[0].label, None);
    }

    #[test]
    fn test_csat_distribution_chart() {
        let mut records = abc_records();
        records.push(FeedbackRecord::new("2024-01-04", "B", Some("9"), ""));
        records.push(FeedbackRecord::new("2024-01-05", "B", Some("oops"), ""));
        let snapshot = snapshot_of(&records);

        let chart = resolve_chart("plot csat distribution", &snapshot).unwrap();
        assert_eq!(chart.labels, vec!["1-2", "3-4", "5-6", "7-8", "9-10"]);
        assert_eq!(chart.series[0].values, vec![1.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_csat_means_rounded_to_one_decimal() {
        let records = vec![
            FeedbackRecord::new("d", "A", Some("4"), ""),
            FeedbackRecord::new("d", "A", Some("4"), ""),
            FeedbackRecord::new("d", "A", Some("5"), ""),
        ];
        let chart = resolve_chart("csat by brand chart", &snapshot_of(&records)).unwrap();
        assert_eq!(chart.series[0].values, vec![4.3]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let snapshot = snapshot_of(&abc_records());
        let question = "chart csat by brand";
        assert_eq!(
            resolve_chart(question, &snapshot),
            resolve_chart(question, &snapshot)
        );
    }
}
