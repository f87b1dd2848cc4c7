use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Everything the analysis engine receives for a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    /// System-level audit rules.
    pub instructions: String,
    /// Structured-output contract the answer must satisfy.
    pub schema: serde_json::Value,
    /// Rendered user prompt.
    pub prompt: String,
}

/// A hosted model (or a stand-in) that turns an [`EngineRequest`] into raw JSON text.
///
/// Implementations hold no per-analysis state. Dropping the returned future
/// cancels the call; nothing is retried on the caller's behalf.
pub trait AnalysisEngine {
    fn invoke(&self, request: &EngineRequest) -> impl Future<Output = Result<String>> + Send;
}
