use crate::error::{AuditError, Result};
use crate::request::AnalysisMode;
use crate::schema::{build_schema, AnalysisResult};
use log::{debug, warn};
use serde_json::Value;

/// Parses the engine's raw answer and checks it against `build_schema(mode)`.
///
/// Values are passed through untouched; a missing or mistyped field is a hard
/// failure, never filled in.
pub fn assemble(raw: &str, mode: AnalysisMode) -> Result<AnalysisResult> {
    let mut value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| AuditError::InvalidResponseFormat {
            details: e.to_string(),
        })?;

    let schema = build_schema(mode);
    if let Err(err) = validate(&schema, &value, "") {
        warn!("Engine response failed {} schema validation: {}", mode, err);
        return Err(err);
    }

    // Sections the mode does not define are not part of its result shape.
    if let (Value::Object(object), Some(Value::Object(properties))) =
        (&mut value, schema.get("properties"))
    {
        object.retain(|key, _| properties.contains_key(key));
    }

    let result: AnalysisResult =
        serde_json::from_value(value).map_err(|e| AuditError::SchemaMismatch {
            path: "/".to_string(),
            details: e.to_string(),
        })?;

    debug!(
        "Assembled {} result with {} finding(s) for analysisA",
        mode,
        result.analysis_a.missing_parameters.len()
    );

    Ok(result)
}

/// Structural check of `value` against the subset of JSON Schema emitted by
/// `build_schema`: `type`, `properties`, `required`, `items`, `enum` and
/// `minimum`.
pub fn validate(schema: &Value, value: &Value, path: &str) -> Result<()> {
    if let Some(expected) = schema.get("type") {
        let allowed: Vec<&str> = match expected {
            Value::String(s) => vec![s.as_str()],
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if !allowed.is_empty() && !allowed.iter().any(|t| matches_type(t, value)) {
            return Err(mismatch(
                path,
                format!("expected {}, found {}", allowed.join(" or "), type_name(value)),
            ));
        }
    }

    if let Some(Value::Array(options)) = schema.get("enum") {
        if !options.contains(value) {
            return Err(mismatch(
                path,
                format!("{} is not one of {}", value, Value::Array(options.clone())),
            ));
        }
    }

    if let (Some(minimum), Some(number)) = (
        schema.get("minimum").and_then(Value::as_f64),
        value.as_f64(),
    ) {
        if number < minimum {
            return Err(mismatch(
                path,
                format!("{} is below the minimum of {}", value, minimum),
            ));
        }
    }

    if let Value::Object(object) = value {
        if let Some(Value::Array(required)) = schema.get("required") {
            for field in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(field) {
                    return Err(mismatch(
                        path,
                        format!("missing required field '{}'", field),
                    ));
                }
            }
        }

        if let Some(Value::Object(properties)) = schema.get("properties") {
            for (name, child_schema) in properties {
                if let Some(child) = object.get(name) {
                    validate(child_schema, child, &format!("{}/{}", path, name))?;
                }
            }
        }
    }

    if let (Value::Array(items), Some(item_schema)) = (value, schema.get("items")) {
        for (idx, item) in items.iter().enumerate() {
            validate(item_schema, item, &format!("{}/{}", path, idx))?;
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(path: &str, details: String) -> AuditError {
    AuditError::SchemaMismatch {
        path: if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        },
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Priority;
    use serde_json::json;

    fn analysis() -> Value {
        json!({
            "summary": "Missing device identifiers.",
            "forecastedRevenue": 1250.5,
            "missingParameters": [
                { "parameter": "device_ifa", "description": "Advertising ID", "priority": "High" }
            ],
            "tmax": "300",
            "schain": { "complete": "1", "nodes": 2 }
        })
    }

    #[test]
    fn test_single_publisher_passthrough() {
        let raw = json!({ "analysisA": analysis() }).to_string();
        let result = assemble(&raw, AnalysisMode::SinglePublisher).unwrap();

        assert_eq!(result.analysis_a.summary, "Missing device identifiers.");
        assert_eq!(result.analysis_a.forecasted_revenue, 1250.5);
        assert_eq!(result.analysis_a.missing_parameters[0].priority, Priority::High);
        assert_eq!(result.analysis_a.schain.nodes, 2);
        assert!(result.analysis_b.is_none());
        assert!(result.comparison.is_none());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "analysisA": analysis() })
        );
    }

    #[test]
    fn test_non_json_is_invalid_format() {
        assert!(matches!(
            assemble("not json", AnalysisMode::SinglePublisher),
            Err(AuditError::InvalidResponseFormat { .. })
        ));
    }

    #[test]
    fn test_missing_findings_is_schema_mismatch() {
        let mut a = analysis();
        a.as_object_mut().unwrap().remove("missingParameters");

        for (mode, raw) in [
            (AnalysisMode::SinglePublisher, json!({ "analysisA": a })),
            (
                AnalysisMode::TopVsLowPerformer,
                json!({
                    "analysisA": a,
                    "comparison": { "comparisonSummary": "s", "missingFromTarget": [] }
                }),
            ),
            (
                AnalysisMode::TwoPublishers,
                json!({
                    "analysisA": analysis(),
                    "analysisB": a,
                    "comparison": { "comparisonSummary": "s", "missingFromTarget": [] }
                }),
            ),
        ] {
            match assemble(&raw.to_string(), mode) {
                Err(AuditError::SchemaMismatch { details, .. }) => {
                    assert!(details.contains("missingParameters"), "{}", details)
                }
                other => panic!("expected schema mismatch for {}, got {:?}", mode, other),
            }
        }
    }

    #[test]
    fn test_missing_comparison_is_schema_mismatch() {
        let raw = json!({ "analysisA": analysis() }).to_string();
        match assemble(&raw, AnalysisMode::TopVsLowPerformer) {
            Err(AuditError::SchemaMismatch { path, details }) => {
                assert_eq!(path, "/");
                assert!(details.contains("comparison"));
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_priority_outside_enum_is_rejected() {
        let mut a = analysis();
        a["missingParameters"][0]["priority"] = json!("Urgent");
        let raw = json!({ "analysisA": a }).to_string();
        match assemble(&raw, AnalysisMode::SinglePublisher) {
            Err(AuditError::SchemaMismatch { path, .. }) => {
                assert_eq!(path, "/analysisA/missingParameters/0/priority");
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type_is_not_coerced() {
        let mut a = analysis();
        a["forecastedRevenue"] = json!("1250.5");
        let raw = json!({ "analysisA": a }).to_string();
        assert!(matches!(
            assemble(&raw, AnalysisMode::SinglePublisher),
            Err(AuditError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_fenced_json_is_invalid_format() {
        let body = json!({ "analysisA": analysis() });
        for fence in ["```json", "```JSON", "```"] {
            let raw = format!("{}\n{}\n```", fence, body);
            assert!(matches!(
                assemble(&raw, AnalysisMode::SinglePublisher),
                Err(AuditError::InvalidResponseFormat { .. })
            ));
        }
        let padded = format!("\n  {}  \n", body);
        assert!(assemble(&padded, AnalysisMode::SinglePublisher).is_ok());
    }

    #[test]
    fn test_sections_outside_mode_are_dropped() {
        let raw = json!({
            "analysisA": analysis(),
            "analysisB": analysis(),
            "comparison": { "note": 1 }
        })
        .to_string();
        let result = assemble(&raw, AnalysisMode::SinglePublisher).unwrap();
        assert!(result.analysis_b.is_none());
        assert!(result.comparison.is_none());

        let raw = json!({
            "analysisA": analysis(),
            "comparison": { "comparisonSummary": "s", "missingFromTarget": ["tmax"] }
        })
        .to_string();
        let result = assemble(&raw, AnalysisMode::SinglePublisher).unwrap();
        assert!(result.comparison.is_none());
    }

    #[test]
    fn test_negative_node_count_is_rejected_at_its_path() {
        let mut a = analysis();
        a["schain"]["nodes"] = json!(-1);
        let raw = json!({ "analysisA": a }).to_string();
        match assemble(&raw, AnalysisMode::SinglePublisher) {
            Err(AuditError::SchemaMismatch { path, details }) => {
                assert_eq!(path, "/analysisA/schain/nodes");
                assert!(details.contains("minimum"));
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }
}
