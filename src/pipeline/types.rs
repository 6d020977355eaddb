//! Result data model for one pipeline invocation.
//!
//! Serialized field names mirror the JSON shape the original service
//! returned (`"type"`, `"page"`, `"region"`, …) so an enclosing HTTP layer
//! can hand an [`AnalysisResult`] straight to existing clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FailureStage;

/// One accepted chart region.
///
/// Created only when the classification confidence strictly exceeds the
/// acceptance threshold; immutable once built. Records are appended in
/// page-then-region discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRecord {
    /// 1-indexed page the region was found on.
    pub page: usize,
    /// 0-indexed region within the page.
    pub region: usize,
    /// Chart-type label as returned by the classifier (e.g. `bar_chart`).
    #[serde(rename = "type")]
    pub chart_type: String,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f32,
    /// Extracted chart data. Opaque to the pipeline: stored and forwarded,
    /// never inspected. Shape depends on the chart type.
    pub data: Value,
    /// Ordered narrative insights for this chart. May be empty.
    pub insights: Vec<String>,
}

/// A region lost to a collaborator failure.
///
/// Produced only under [`crate::config::FailurePolicy::IsolateRegions`];
/// the abort-all policy fails the whole invocation instead. Coordinates
/// are absent where the failure has none: detection failures carry no
/// region, summary failures neither page nor region. Absent coordinates
/// are omitted from the serialized form rather than encoded as sentinels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<usize>,
    pub stage: FailureStage,
    pub reason: String,
}

/// Terminal artifact of one `analyze` invocation.
///
/// Either a success result (charts + optional summary) or an error result:
/// when `error` is populated the chart fields carry no content. Callers
/// must check `error` before trusting chart data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Always equal to `charts.len()` in a success result.
    pub total_charts: usize,
    /// Accepted charts in strictly increasing (page, region) order.
    pub charts: Vec<ChartRecord>,
    /// Cross-chart summary. Absent when zero charts were accepted or the
    /// summary call failed under the isolation policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Per-region failure markers (isolation policy only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RegionFailure>,
    /// Human-readable description of a fatal failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Build a success result. `total_charts` is derived, never supplied.
    pub fn success(
        charts: Vec<ChartRecord>,
        summary: Option<String>,
        failures: Vec<RegionFailure>,
    ) -> Self {
        Self {
            total_charts: charts.len(),
            charts,
            summary,
            failures,
            error: None,
        }
    }

    /// Build an error-only result carrying no chart content.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            total_charts: 0,
            charts: Vec::new(),
            summary: None,
            failures: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record(page: usize, region: usize) -> ChartRecord {
        ChartRecord {
            page,
            region,
            chart_type: "bar_chart".into(),
            confidence: 0.9,
            data: json!({"series": {"q1": 0.4, "q2": 0.6}}),
            insights: vec!["Q2 exceeds Q1.".into()],
        }
    }

    #[test]
    fn success_derives_total_from_chart_list() {
        let result =
            AnalysisResult::success(vec![sample_record(1, 0), sample_record(2, 1)], None, vec![]);
        assert_eq!(result.total_charts, result.charts.len());
        assert_eq!(result.total_charts, 2);
        assert!(!result.is_error());
    }

    #[test]
    fn failed_result_carries_no_chart_content() {
        let result = AnalysisResult::failed("document decode failed: truncated file");
        assert!(result.is_error());
        assert_eq!(result.total_charts, 0);
        assert!(result.charts.is_empty());
        assert!(result.summary.is_none());
    }

    #[test]
    fn chart_record_serializes_type_field() {
        let json = serde_json::to_value(sample_record(1, 0)).unwrap();
        assert_eq!(json["type"], "bar_chart");
        assert_eq!(json["page"], 1);
        assert_eq!(json["region"], 0);
        assert!(json.get("chart_type").is_none());
    }

    #[test]
    fn empty_summary_and_error_are_omitted() {
        let result = AnalysisResult::success(vec![], None, vec![]);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("summary").is_none());
        assert!(json.get("error").is_none());
        assert!(json.get("failures").is_none());
    }

    #[test]
    fn result_round_trips_through_json() {
        let original = AnalysisResult::success(
            vec![sample_record(1, 0)],
            Some("One bar chart found.".into()),
            vec![RegionFailure {
                page: Some(2),
                region: Some(1),
                stage: FailureStage::Extraction,
                reason: "unreadable axes".into(),
            }],
        );
        let text = serde_json::to_string(&original).unwrap();
        let restored: AnalysisResult = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn uncoordinated_failure_omits_page_and_region() {
        let marker = RegionFailure {
            page: None,
            region: None,
            stage: FailureStage::Summary,
            reason: "service unavailable".into(),
        };
        let json = serde_json::to_value(&marker).unwrap();
        assert!(json.get("page").is_none());
        assert!(json.get("region").is_none());
        assert_eq!(json["stage"], "summary");

        let restored: RegionFailure = serde_json::from_value(json).unwrap();
        assert_eq!(restored, marker);
    }

    #[test]
    fn failure_stage_serializes_snake_case() {
        let json = serde_json::to_value(FailureStage::Classification).unwrap();
        assert_eq!(json, "classification");
    }
}
