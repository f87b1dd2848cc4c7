use crate::request::AnalysisMode;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Value the engine reports for `tmax` or `schain.complete` when absent.
pub const NOT_FOUND: &str = "Not Found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Priority {
    High,
    Mid,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MissingParameterFinding {
    #[schemars(description = "The name of the missing parameter from the master list (e.g., \"device_ifa\").")]
    pub parameter: String,

    #[schemars(
        description = "A brief explanation of what this parameter is and why it is important for ad revenue."
    )]
    pub description: String,

    #[schemars(
        description = "The priority for implementing this parameter, categorized as \"High\", \"Mid\", or \"Low\"."
    )]
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchainReport {
    #[schemars(
        description = "The value of source.ext.schain.complete (\"1\" or \"0\"), or \"Not Found\" if no schain is present."
    )]
    pub complete: String,

    #[schemars(description = "The number of entries in source.ext.schain.nodes, or 0 if no schain is present.")]
    pub nodes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SingleAnalysisResult {
    #[schemars(
        description = "A brief summary of the analysis, highlighting key findings and potential improvements."
    )]
    pub summary: String,

    #[schemars(
        description = "The estimated potential revenue uplift in USD if the missing parameters are implemented."
    )]
    pub forecasted_revenue: f64,

    #[schemars(
        description = "Parameters from the request's relevant parameter set that are missing from the ad request."
    )]
    pub missing_parameters: Vec<MissingParameterFinding>,

    #[schemars(description = "The tmax (auction timeout in ms) value of the ad request, or \"Not Found\".")]
    pub tmax: String,

    #[schemars(description = "Supply chain (source.ext.schain) details of the ad request.")]
    pub schain: SchainReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    #[schemars(
        description = "A summary comparing the two ad requests, highlighting key differences and their potential impact on performance."
    )]
    pub comparison_summary: String,

    #[schemars(
        description = "Parameters relevant to the target's context that are present in the source request but missing from the target request."
    )]
    pub missing_from_target: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis_a: SingleAnalysisResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_b: Option<SingleAnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResult>,
}

/// Structured-output contract the engine must satisfy for `mode`.
///
/// Sub-schemas are derived from the result types and inlined, so the returned
/// value is self-contained.
pub fn build_schema(mode: AnalysisMode) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    properties.insert("analysisA".to_string(), inline_schema::<SingleAnalysisResult>());
    required.push("analysisA");

    if mode == AnalysisMode::TwoPublishers {
        properties.insert("analysisB".to_string(), inline_schema::<SingleAnalysisResult>());
        required.push("analysisB");
    }

    if mode.has_comparison() {
        properties.insert("comparison".to_string(), inline_schema::<ComparisonResult>());
        required.push("comparison");
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn inline_schema<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let root = settings.into_generator().into_root_schema_for::<T>();
    let mut value = json!(root.schema);
    strip_unsupported_keywords(&mut value);
    value
}

// Structured-output endpoints accept a subset of JSON Schema.
fn strip_unsupported_keywords(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };
    for keyword in ["$schema", "title", "format", "definitions"] {
        map.remove(keyword);
    }
    if let Some(Value::Object(properties)) = map.get_mut("properties") {
        for child in properties.values_mut() {
            strip_unsupported_keywords(child);
        }
    }
    if let Some(items) = map.get_mut("items") {
        strip_unsupported_keywords(items);
    }
}
