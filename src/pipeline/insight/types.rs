use async_trait::async_trait;
use serde_json::Value;

use super::InsightError;
use crate::pipeline::types::ChartRecord;

/// Narrative generation abstraction (allows mocking for tests).
///
/// The optional `reference` is a caller-supplied dataset forwarded
/// verbatim for context; the pipeline never inspects or validates it.
#[async_trait]
pub trait InsightGenerator {
    /// Ordered insight strings for a single accepted chart. May be empty.
    async fn chart_insights(
        &self,
        chart_type: &str,
        data: &Value,
        reference: Option<&Value>,
    ) -> Result<Vec<String>, InsightError>;

    /// One cross-chart summary over all accepted charts.
    ///
    /// Callers must not invoke this with an empty chart list; the
    /// orchestrator skips summary generation when nothing was accepted.
    async fn summarize(
        &self,
        charts: &[ChartRecord],
        reference: Option<&Value>,
    ) -> Result<String, InsightError>;
}
