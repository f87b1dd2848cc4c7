//! # Ad Request Auditor
//!
//! Audits OpenRTB ad requests against a master list of monetization parameters
//! with the help of a structured-output language model.
//!
//! ## Core Concepts
//!
//! - **Master Parameter List**: canonical parameter names flattened with `_`
//!   (`device_ifa`, `imp_video_protocols`, ...)
//! - **Relevant Parameter Set**: the master list filtered by the request's media
//!   type (`app`/`site`) and ad type (`banner`/`video`)
//! - **Analysis Mode**: single publisher, top vs low performer, or two publishers
//! - **Analysis Engine**: anything that turns instructions, a JSON schema and a
//!   prompt into JSON text; a Gemini client ships behind the `gemini` feature
//! - **Assembly**: the engine's answer is validated against the same schema and
//!   passed through unchanged
//!
//! ## Example
//!
//! ```rust,ignore
//! use ad_request_auditor::*;
//!
//! let analyzer = AdAnalyzer::new(llm::GeminiClient::from_env()?);
//! let request = AnalysisRequest::new(
//!     AnalysisMode::SinglePublisher,
//!     vec![KpiSet::new("1000000", "42", "1.80")],
//!     vec![std::fs::read_to_string("bid_request.json")?],
//! );
//!
//! let result = analyzer.analyze(&request).await?;
//! for finding in &result.analysis_a.missing_parameters {
//!     println!("{:?} {}", finding.priority, finding.parameter);
//! }
//! ```

pub mod ad_request;
pub mod analyzer;
pub mod assembler;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod parameters;
pub mod prompts;
pub mod request;
pub mod schema;

#[cfg(feature = "gemini")]
pub mod llm;

pub use ad_request::{AdRequestDocument, Classification, SupplyChain};
pub use analyzer::{AdAnalyzer, PreparedAnalysis};
pub use assembler::assemble;
pub use engine::{AnalysisEngine, EngineRequest};
pub use error::{AuditError, ErrorReport, Result};
pub use normalizer::{normalize, NormalizedRequest, RequestContext};
pub use parameters::{relevant_parameters, AdType, MediaType, MASTER_PARAMETER_LIST};
pub use prompts::{build_instructions, build_prompt, Prompt, PromptSection};
pub use request::{AnalysisMode, AnalysisRequest, KpiSet};
pub use schema::*;

/// Classifies a raw ad request and returns its relevant parameter set.
pub fn relevant_parameters_for(label: &str, text: &str) -> Result<Vec<&'static str>> {
    let doc = AdRequestDocument::parse(label, text)?;
    let class = doc.classify()?;
    Ok(relevant_parameters(
        MASTER_PARAMETER_LIST,
        class.media_type,
        class.ad_type,
    ))
}
