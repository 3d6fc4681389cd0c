//! Answer rendering for the terminal and for JSON consumers.

use crate::models::{AnswerSource, ChartSpec, QueryAnswer};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Render an answer as plain text, with a textual chart if there is one.
pub fn render_text(answer: &QueryAnswer) -> String {
    let mut output = String::new();

    output.push_str(&answer.text);
    output.push_str("\n\n");

    if let Some(ref chart) = answer.chart {
        output.push_str(&render_chart_text(chart));
        output.push('\n');
    }

    output.push_str(&format!(
        "Answered by {} from {} records.\n",
        answer.source, answer.records_used
    ));

    output
}

/// Render a chart as a table of labelled values.
pub fn render_chart_text(chart: &ChartSpec) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} ({} chart)\n\n", chart.title, chart.kind));

    for series in &chart.series {
        if let Some(ref label) = series.label {
            section.push_str(&format!("{}:\n", label));
        }
        let width = chart.labels.iter().map(|l| l.len()).max().unwrap_or(0);
        for (label, value) in chart.labels.iter().zip(&series.values) {
            section.push_str(&format!("  {:<width$}  {}\n", label, value, width = width));
        }
    }

    section
}

/// JSON answer in the shape chat front ends consume.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerJson<'a> {
    response: &'a str,
    data_used: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart_data: Option<ChartJson<'a>>,
    source: &'a AnswerSource,
    generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ChartJson<'a> {
    #[serde(rename = "type")]
    kind: String,
    title: &'a str,
    data: ChartDataJson<'a>,
}

#[derive(Debug, Serialize)]
struct ChartDataJson<'a> {
    labels: &'a [String],
    datasets: Vec<DatasetJson<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DatasetJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    data: &'a [f64],
    background_color: &'a [String],
    border_color: &'a [String],
    border_width: u32,
}

impl<'a> From<&'a ChartSpec> for ChartJson<'a> {
    fn from(chart: &'a ChartSpec) -> Self {
        Self {
            kind: chart.kind.to_string(),
            title: &chart.title,
            data: ChartDataJson {
                labels: &chart.labels,
                datasets: chart
                    .series
                    .iter()
                    .map(|series| DatasetJson {
                        label: series.label.as_deref(),
                        data: &series.values,
                        background_color: &series.colors.background,
                        border_color: &series.colors.border,
                        border_width: series.colors.border_width,
                    })
                    .collect(),
            },
        }
    }
}

/// Render an answer as pretty-printed JSON.
pub fn render_json(answer: &QueryAnswer) -> Result<String> {
    let json = AnswerJson {
        response: &answer.text,
        data_used: answer.records_used,
        chart_data: answer.chart.as_ref().map(ChartJson::from),
        source: &answer.source,
        generated_at: Utc::now(),
    };

    serde_json::to_string_pretty(&json).map_err(Into::into)
}
