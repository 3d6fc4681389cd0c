//! Per-question pipeline.
//!
//! One snapshot of the store is taken when a question arrives and used for
//! the whole request. The answer comes from the first path that applies:
//! no data, chart, delegate, then the local narrator.

use crate::analysis::{aggregate, AggregateOptions};
use crate::chart::resolve_chart;
use crate::delegate::{DelegateChain, DelegateError};
use crate::models::{AggregateSnapshot, AnswerSource, ChartSpec, QueryAnswer};
use crate::report::{build_context, Narrator};
use crate::store::RecordStore;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Answer given while the store is empty.
pub const NO_DATA_ANSWER: &str = "No data has been uploaded yet. Please upload a CSV file first to start analyzing your customer feedback.";

/// Errors the caller has to handle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("question is missing or blank")]
    MissingQuestion,
}

/// What a question resolves to before any network call.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// The store is empty.
    NoData,
    /// The question asks for a chart.
    Chart {
        spec: ChartSpec,
        records_used: usize,
    },
    /// Ask the delegates, falling back to the narrator.
    Delegate {
        context: String,
        snapshot: AggregateSnapshot,
        records_used: usize,
    },
}

/// Answers questions about the records in a [`RecordStore`].
pub struct QueryEngine {
    store: RecordStore,
    delegates: DelegateChain,
    options: AggregateOptions,
    narrator: Narrator,
}

impl QueryEngine {
    pub fn new(
        store: RecordStore,
        delegates: DelegateChain,
        options: AggregateOptions,
        narrator: Narrator,
    ) -> Self {
        Self {
            store,
            delegates,
            options,
            narrator,
        }
    }

    /// Resolve the question against the current dataset without calling out.
    pub fn plan(&self, question: &str) -> Result<Plan, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::MissingQuestion);
        }

        let records = self.store.snapshot();
        if records.is_empty() {
            debug!("Store is empty, skipping aggregation");
            return Ok(Plan::NoData);
        }

        let snapshot = aggregate(&records, &self.options);

        if let Some(spec) = resolve_chart(question, &snapshot) {
            return Ok(Plan::Chart {
                spec,
                records_used: records.len(),
            });
        }

        let context = build_context(&snapshot, question, self.options.top_issues);
        Ok(Plan::Delegate {
            context,
            snapshot,
            records_used: records.len(),
        })
    }

    /// Answer a question.
    ///
    /// Only a blank question is an error. Delegate failures end in the local
    /// report instead.
    pub async fn answer_question(&self, question: &str) -> Result<QueryAnswer, QueryError> {
        let answer = match self.plan(question)? {
            Plan::NoData => QueryAnswer {
                text: NO_DATA_ANSWER.to_string(),
                chart: None,
                records_used: 0,
                source: AnswerSource::NoData,
            },

            Plan::Chart { spec, records_used } => {
                info!("Answering with chart: {}", spec.title);
                QueryAnswer {
                    text: format!("Here's your {}:", spec.title.to_lowercase()),
                    chart: Some(spec),
                    records_used,
                    source: AnswerSource::Chart,
                }
            }

            Plan::Delegate {
                context,
                snapshot,
                records_used,
            } => match self.delegates.generate(&context).await {
                Ok(reply) => QueryAnswer {
                    text: reply.text,
                    chart: None,
                    records_used,
                    source: AnswerSource::Delegate {
                        endpoint: reply.endpoint,
                    },
                },
                Err(e) => {
                    match e {
                        DelegateError::Exhausted { attempts } => warn!(
                            "No delegate answered ({} tried), using local report",
                            attempts
                        ),
                        other => warn!("Delegates unavailable: {}, using local report", other),
                    }
                    QueryAnswer {
                        text: self.narrator.narrate(&snapshot, question, records_used),
                        chart: None,
                        records_used,
                        source: AnswerSource::Narrator,
                    }
                }
            },
        };

        Ok(answer)
    }
}
