use crate::assembler::assemble;
use crate::engine::{AnalysisEngine, EngineRequest};
use crate::error::{ErrorReport, Result};
use crate::normalizer::{normalize, NormalizedRequest};
use crate::prompts::{build_instructions, build_prompt, Prompt};
use crate::request::AnalysisRequest;
use crate::schema::{build_schema, AnalysisResult};
use log::{debug, info};

/// Everything computed before the engine is called.
#[derive(Debug, Clone)]
pub struct PreparedAnalysis {
    pub normalized: NormalizedRequest,
    pub prompt: Prompt,
    pub engine_request: EngineRequest,
}

pub struct AdAnalyzer<E> {
    engine: E,
}

impl<E: AnalysisEngine> AdAnalyzer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Validates and normalizes the request and composes the engine call.
    pub fn prepare(&self, request: &AnalysisRequest) -> Result<PreparedAnalysis> {
        let normalized = normalize(request)?;
        let prompt = build_prompt(request, &normalized);
        let engine_request = EngineRequest {
            instructions: build_instructions(request.mode),
            schema: build_schema(request.mode),
            prompt: prompt.render(),
        };

        debug!(
            "Prepared {} analysis: {} prompt section(s), {} prompt bytes",
            request.mode,
            prompt.sections().len(),
            engine_request.prompt.len()
        );

        Ok(PreparedAnalysis {
            normalized,
            prompt,
            engine_request,
        })
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        info!(
            "Starting {} analysis of {} ad request(s)",
            request.mode,
            request.ad_request_inputs.len()
        );

        let prepared = self.prepare(request)?;
        let raw = self.engine.invoke(&prepared.engine_request).await?;
        let result = assemble(&raw, request.mode)?;

        info!(
            "Completed {} analysis: {} finding(s) for analysisA",
            request.mode,
            result.analysis_a.missing_parameters.len()
        );

        Ok(result)
    }

    /// Same as [`analyze`](Self::analyze), with failures flattened into the
    /// caller-facing `{ error, details }` shape.
    pub async fn analyze_report(
        &self,
        request: &AnalysisRequest,
    ) -> std::result::Result<AnalysisResult, ErrorReport> {
        self.analyze(request).await.map_err(ErrorReport::from)
    }
}
