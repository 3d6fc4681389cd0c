//! Analysis digest sent to delegates.
//!
//! The digest is compact on purpose: headline numbers, the top issues and a
//! handful of sample rows, then the question.

use crate::models::{AggregateSnapshot, FeedbackRecord};

/// Sample feedback is cut to this many characters.
const SAMPLE_FEEDBACK_CHARS: usize = 100;

/// Build the prompt context for a question.
pub fn build_context(snapshot: &AggregateSnapshot, question: &str, top_issues: usize) -> String {
    let total = snapshot.record_count;
    let mut context = String::new();

    context.push_str(&format!(
        "DATASET: {} customer feedback entries analyzed\n",
        total
    ));

    let brands: Vec<String> = snapshot
        .brand_counts
        .iter()
        .map(|(brand, count)| format!("{}={}", brand, count))
        .collect();
    context.push_str(&format!("BRANDS: {}\n", brands.join(", ")));

    let brand_csat: Vec<String> = snapshot
        .csat_by_brand
        .iter()
        .map(|(brand, stats)| {
            format!("{}: {} ({} responses)", brand, stats.display_mean(), stats.count)
        })
        .collect();
    context.push_str(&format!(
        "CSAT: Overall={}/5, By Brand: {}\n",
        snapshot.overall_csat.display_mean(),
        brand_csat.join(", ")
    ));

    context.push_str(&format!(
        "DATES: {} to {}\n\n",
        snapshot.date_range.first.as_deref().unwrap_or("unknown"),
        snapshot.date_range.last.as_deref().unwrap_or("unknown")
    ));

    let issues: Vec<String> = snapshot
        .top_issues(top_issues)
        .into_iter()
        .map(|(term, count)| format!("{}: {}", term, count))
        .collect();
    context.push_str(&format!(
        "TOP CUSTOMER ISSUES (from all {} entries):\n{}\n\n",
        total,
        issues.join(", ")
    ));

    context.push_str(&format!(
        "SAMPLE FEEDBACK ({} examples):\n",
        snapshot.samples.len()
    ));
    for record in &snapshot.samples {
        context.push_str(&sample_line(record));
        context.push('\n');
    }

    context.push_str(&format!("\nQUESTION: {}\nANSWER:", question));
    context
}

fn sample_line(record: &FeedbackRecord) -> String {
    let feedback: String = record.feedback.chars().take(SAMPLE_FEEDBACK_CHARS).collect();
    format!(
        "{}|{}|{}",
        record.brand,
        record.csat.as_deref().unwrap_or(""),
        feedback
    )
}
