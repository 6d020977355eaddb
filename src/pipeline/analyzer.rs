//! Pipeline orchestration: document bytes in, [`AnalysisResult`] out.
//!
//! The analyzer owns one collaborator per stage behind trait objects and
//! sequences them: rasterize the document, detect regions per page,
//! classify each region, gate on confidence, extract data from accepted
//! regions, generate insights, then one cross-chart summary. Errors never
//! escape [`ChartAnalyzer::analyze`]; fatal ones are folded into an
//! error-only result.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{FailurePolicy, PipelineConfig, CONFIDENCE_THRESHOLD};
use crate::pipeline::insight::{GroqConfig, GroqInsightClient, InsightGenerator};
use crate::pipeline::raster::{PdfiumRasterizer, Rasterizer};
use crate::pipeline::types::{AnalysisResult, ChartRecord, RegionFailure};
use crate::pipeline::vision::{
    ChartClassifier, DataExtractor, GeometricChartClassifier, InkBandRegionDetector,
    ProjectionDataExtractor, RegionDetector, RegionImage,
};
use crate::pipeline::{AnalysisError, FailureStage};

/// Document chart-mining orchestrator.
///
/// Holds no per-invocation state; a single instance serves any number of
/// `analyze` calls. Re-analyzing the same bytes with the same
/// collaborators yields a structurally identical result.
pub struct ChartAnalyzer {
    rasterizer: Box<dyn Rasterizer + Send + Sync>,
    detector: Box<dyn RegionDetector + Send + Sync>,
    classifier: Box<dyn ChartClassifier + Send + Sync>,
    extractor: Box<dyn DataExtractor + Send + Sync>,
    insight: Box<dyn InsightGenerator + Send + Sync>,
    config: PipelineConfig,
}

impl ChartAnalyzer {
    pub fn new(
        rasterizer: Box<dyn Rasterizer + Send + Sync>,
        detector: Box<dyn RegionDetector + Send + Sync>,
        classifier: Box<dyn ChartClassifier + Send + Sync>,
        extractor: Box<dyn DataExtractor + Send + Sync>,
        insight: Box<dyn InsightGenerator + Send + Sync>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            rasterizer,
            detector,
            classifier,
            extractor,
            insight,
            config,
        }
    }

    /// Analyze a document and return a result object, never an error.
    ///
    /// `reference` is an optional caller dataset forwarded verbatim to the
    /// insight generator for context.
    pub async fn analyze(&self, document: &[u8], reference: Option<&Value>) -> AnalysisResult {
        match self.run(document, reference).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Document analysis failed");
                AnalysisResult::failed(e.to_string())
            }
        }
    }

    async fn run(
        &self,
        document: &[u8],
        reference: Option<&Value>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let pages = self.rasterizer.rasterize(document, self.config.render_dpi)?;
        info!(pages = pages.len(), "Document rasterized");

        let mut charts: Vec<ChartRecord> = Vec::new();
        let mut failures: Vec<RegionFailure> = Vec::new();

        for page in &pages {
            let regions = match self.detector.detect_regions(page) {
                Ok(regions) => regions,
                Err(e) => {
                    // No region index exists yet.
                    self.handle_failure(
                        FailureStage::Detection,
                        page.number,
                        None,
                        e.to_string(),
                        &mut failures,
                    )?;
                    continue;
                }
            };

            for region in &regions {
                match self.process_region(region, reference).await {
                    Ok(Some(record)) => charts.push(record),
                    Ok(None) => {}
                    Err((stage, reason)) => {
                        self.handle_failure(
                            stage,
                            region.page,
                            Some(region.index),
                            reason,
                            &mut failures,
                        )?;
                    }
                }
            }
        }

        let summary = if charts.is_empty() {
            debug!("No charts accepted, skipping summary");
            None
        } else {
            match self.insight.summarize(&charts, reference).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    if self.config.failure_policy == FailurePolicy::AbortAll {
                        return Err(AnalysisError::Summary(e.to_string()));
                    }
                    warn!(error = %e, "Summary generation failed, continuing without one");
                    // The summary is document-scoped, so the marker has no
                    // coordinates.
                    failures.push(RegionFailure {
                        page: None,
                        region: None,
                        stage: FailureStage::Summary,
                        reason: e.to_string(),
                    });
                    None
                }
            }
        };

        info!(
            charts = charts.len(),
            failures = failures.len(),
            "Document analysis complete"
        );
        Ok(AnalysisResult::success(charts, summary, failures))
    }

    /// Classify, gate, extract and narrate a single region.
    ///
    /// `Ok(None)` means the region was rejected by the confidence gate; the
    /// extractor and insight generator are never invoked for it.
    async fn process_region(
        &self,
        region: &RegionImage,
        reference: Option<&Value>,
    ) -> Result<Option<ChartRecord>, (FailureStage, String)> {
        let verdict = self
            .classifier
            .classify(region)
            .map_err(|e| (FailureStage::Classification, e.to_string()))?;

        if verdict.confidence <= CONFIDENCE_THRESHOLD {
            debug!(
                page = region.page,
                region = region.index,
                label = %verdict.label,
                confidence = verdict.confidence,
                "Region rejected by confidence gate"
            );
            return Ok(None);
        }

        let data = self
            .extractor
            .extract(region, &verdict.label)
            .map_err(|e| (FailureStage::Extraction, e.to_string()))?;

        let insights = self
            .insight
            .chart_insights(&verdict.label, &data, reference)
            .await
            .map_err(|e| (FailureStage::Insight, e.to_string()))?;

        debug!(
            page = region.page,
            region = region.index,
            label = %verdict.label,
            confidence = verdict.confidence,
            "Region accepted"
        );
        Ok(Some(ChartRecord {
            page: region.page,
            region: region.index,
            chart_type: verdict.label,
            confidence: verdict.confidence,
            data,
            insights,
        }))
    }

    /// Apply the failure policy to a page- or region-scoped collaborator
    /// error. `region` is `None` for detection failures, where no region
    /// was produced.
    fn handle_failure(
        &self,
        stage: FailureStage,
        page: usize,
        region: Option<usize>,
        reason: String,
        failures: &mut Vec<RegionFailure>,
    ) -> Result<(), AnalysisError> {
        match self.config.failure_policy {
            FailurePolicy::IsolateRegions => {
                warn!(%stage, page, region, %reason, "Region failed, continuing");
                failures.push(RegionFailure {
                    page: Some(page),
                    region,
                    stage,
                    reason,
                });
                Ok(())
            }
            FailurePolicy::AbortAll => Err(AnalysisError::Collaborator {
                stage,
                page,
                region: region.unwrap_or(0),
                reason,
            }),
        }
    }
}

/// Build an analyzer with the production collaborator set.
///
/// Requires a reachable PDFium library and `GROQ_API_KEY` in the
/// environment; fails fast when either is missing.
pub fn build_analyzer(config: PipelineConfig) -> Result<ChartAnalyzer, AnalysisError> {
    let rasterizer =
        PdfiumRasterizer::new().map_err(|e| AnalysisError::Init(e.to_string()))?;
    let groq = GroqConfig::from_env().map_err(|e| AnalysisError::Init(e.to_string()))?;

    Ok(ChartAnalyzer::new(
        Box::new(rasterizer),
        Box::new(InkBandRegionDetector),
        Box::new(GeometricChartClassifier),
        Box::new(ProjectionDataExtractor),
        Box::new(GroqInsightClient::new(groq)),
        config,
    ))
}
