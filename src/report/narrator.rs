//! Deterministic fallback answers.
//!
//! When no delegate answers, the narrator writes a fixed-structure report
//! straight from the aggregate snapshot. Its only input from the question is
//! which insight sentences to include.

use crate::models::AggregateSnapshot;

/// Answer given when there is nothing to analyze.
pub const NO_DATA_NARRATIVE: &str =
    "No data available for analysis. Please upload a CSV file first.";

/// Builds the local report.
#[derive(Debug, Clone)]
pub struct Narrator {
    top_words: usize,
    top_issues: usize,
}

impl Default for Narrator {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

impl Narrator {
    pub fn new(top_words: usize, top_issues: usize) -> Self {
        Self {
            top_words,
            top_issues,
        }
    }

    /// Write the report for `question`.
    ///
    /// `record_count` is checked first; with no records nothing else is
    /// looked at.
    pub fn narrate(&self, snapshot: &AggregateSnapshot, question: &str, record_count: usize) -> String {
        if record_count == 0 {
            return NO_DATA_NARRATIVE.to_string();
        }

        let mut output = String::new();

        output.push_str(&format!(
            "Based on analysis of your {} feedback entries:\n\n",
            record_count
        ));
        output.push_str(&self.csat_section(snapshot));
        output.push_str(&brand_section(snapshot));
        output.push_str(&self.terms_section(snapshot));
        output.push_str(&self.issues_section(snapshot));
        output.push_str(&insights_section(snapshot, question, record_count));
        output.push_str(&format!(
            "*Note: This analysis is generated directly from your data. All calculations are based on the complete dataset of {} entries.*",
            record_count
        ));

        output
    }

    fn csat_section(&self, snapshot: &AggregateSnapshot) -> String {
        let brand_csat: Vec<String> = snapshot
            .csat_by_brand
            .iter()
            .map(|(brand, stats)| format!("{}: {}", brand, stats.display_mean()))
            .collect();

        let mut section = String::from("**CSAT Analysis:**\n");
        section.push_str(&format!(
            "- Overall average CSAT score: {}/5\n",
            snapshot.overall_csat.display_mean()
        ));
        section.push_str(&format!("- Brand breakdown: {}\n", brand_csat.join(", ")));
        section.push_str(&format!(
            "- Total responses with CSAT data: {}\n\n",
            snapshot.overall_csat.count
        ));
        section
    }

    fn terms_section(&self, snapshot: &AggregateSnapshot) -> String {
        let words: Vec<String> = snapshot
            .top_words(self.top_words)
            .into_iter()
            .map(|(word, count)| format!("{} ({})", word, count))
            .collect();

        format!("**Most Common Feedback Terms:**\n{}\n\n", words.join(", "))
    }

    fn issues_section(&self, snapshot: &AggregateSnapshot) -> String {
        let issues: Vec<String> = snapshot
            .top_issues(self.top_issues)
            .into_iter()
            .map(|(term, count)| format!("{} ({} mentions)", term, count))
            .collect();

        format!("**Top Customer Issues:**\n{}\n\n", issues.join(", "))
    }
}

fn brand_section(snapshot: &AggregateSnapshot) -> String {
    let mut section = String::from("**Brand Distribution:**\n");

    for (brand, count) in &snapshot.brand_counts {
        section.push_str(&format!(
            "- {}: {} responses ({:.1}%)\n",
            brand,
            count,
            snapshot.brand_share(brand)
        ));
    }
    section.push('\n');
    section
}

fn insights_section(snapshot: &AggregateSnapshot, question: &str, record_count: usize) -> String {
    let lowered = question.to_lowercase();
    let mut insights = Vec::new();

    if lowered.contains("csat") || lowered.contains("score") {
        insights.push(format!(
            "The average CSAT score across all {} responses is {} out of 5.",
            record_count,
            snapshot.overall_csat.display_mean()
        ));
    }

    for (brand, count) in &snapshot.brand_counts {
        if mentions(&lowered, &brand.to_lowercase()) {
            insights.push(format!(
                "{} has {} responses out of {} total ({:.1}%).",
                brand,
                count,
                record_count,
                snapshot.brand_share(brand)
            ));
        }
    }

    format!("**Key Insights:**\n{}\n\n", insights.join("\n"))
}

/// Whether `name` occurs in `text` as a whole word, not inside a longer one.
fn mentions(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    text.match_indices(name).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + name.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, AggregateOptions};
    use crate::models::FeedbackRecord;

    fn snapshot() -> AggregateSnapshot {
        let records = vec![
            FeedbackRecord::new("2024-01-01", "Crate", Some("5"), "Lovely sofa, quick delivery"),
            FeedbackRecord::new("2024-01-02", "CB2", Some("2"), "Sofa arrived damaged"),
            FeedbackRecord::new("2024-01-03", "CB2", Some("3"), "Delivery window missed"),
        ];
        aggregate(&records, &AggregateOptions::default())
    }

    #[test]
    fn test_no_records_short_circuits() {
        let narrator = Narrator::default();
        let report = narrator.narrate(&AggregateSnapshot::default(), "anything", 0);
        assert_eq!(report, NO_DATA_NARRATIVE);
    }

    #[test]
    fn test_sections_in_order() {
        let report = Narrator::default().narrate(&snapshot(), "What do people say?", 3);

        let order = [
            "Based on analysis of your 3 feedback entries:",
            "**CSAT Analysis:**",
            "**Brand Distribution:**",
            "**Most Common Feedback Terms:**",
            "**Top Customer Issues:**",
            "**Key Insights:**",
            "*Note:",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|heading| report.find(heading).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(report.contains("- Overall average CSAT score: 3.33/5"));
        assert!(report.contains("- Brand breakdown: Crate: 5.00, CB2: 2.50"));
        assert!(report.contains("sofa (2)"));
        assert!(report.contains("delivery (2 mentions)"));
    }

    #[test]
    fn test_brand_percentages_sum_to_hundred() {
        let report = Narrator::default().narrate(&snapshot(), "overview", 3);

        let total: f64 = report
            .lines()
            .filter(|l| l.starts_with("- ") && l.contains(" responses ("))
            .map(|l| {
                let start = l.rfind('(').unwrap() + 1;
                let end = l.rfind('%').unwrap();
                l[start..end].parse::<f64>().unwrap()
            })
            .sum();

        assert!((total - 100.0).abs() <= 0.1, "percentages summed to {}", total);
        assert!(report.contains("- Crate: 1 responses (33.3%)"));
        assert!(report.contains("- CB2: 2 responses (66.7%)"));
    }

    #[test]
    fn test_insights_follow_question() {
        let narrator = Narrator::default();

        let plain = narrator.narrate(&snapshot(), "overview please", 3);
        assert!(!plain.contains("The average CSAT score across"));
        assert!(!plain.contains("responses out of"));
        assert!(plain.contains("**Key Insights:**\n\n\n*Note:"));

        let scored = narrator.narrate(&snapshot(), "What is the SCORE?", 3);
        assert!(scored.contains("The average CSAT score across all 3 responses is 3.33 out of 5."));

        let branded = narrator.narrate(&snapshot(), "how is cb2 doing", 3);
        assert!(branded.contains("CB2 has 2 responses out of 3 total (66.7%)."));
        assert!(!branded.contains("Crate has"));
    }

    #[test]
    fn test_brand_insight_needs_whole_word() {
        let records = vec![
            FeedbackRecord::new("2024-01-01", "A", Some("4"), "fine"),
            FeedbackRecord::new("2024-01-02", "B", Some("5"), "great"),
        ];
        let snap = aggregate(&records, &AggregateOptions::default());
        let narrator = Narrator::default();

        let report = narrator.narrate(&snap, "How is brand b doing?", 2);
        assert!(report.contains("B has 1 responses out of 2 total (50.0%)."));
        assert!(!report.contains("A has"));

        assert!(mentions("what about cb2?", "cb2"));
        assert!(mentions("crate & barrel", "crate & barrel"));
        assert!(!mentions("crates of stuff", "crate"));
        assert!(!mentions("anything", ""));
    }

    #[test]
    fn test_narration_is_deterministic() {
        let narrator = Narrator::default();
        let snap = snapshot();
        assert_eq!(
            narrator.narrate(&snap, "csat for crate", 3),
            narrator.narrate(&snap, "csat for crate", 3)
        );
    }
}
