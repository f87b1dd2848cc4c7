use crate::error::{AuditError, Result};
use crate::parameters::{AdType, MediaType};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub media_type: MediaType,
    pub ad_type: AdType,
}

/// Supply chain declaration found under `source.ext.schain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyChain {
    /// `None` when the `complete` flag is absent or not 0/1.
    pub complete: Option<bool>,
    /// Number of entries in `nodes`.
    pub nodes: usize,
}

impl fmt::Display for SupplyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let complete = match self.complete {
            Some(true) => "1",
            Some(false) => "0",
            None => "unspecified",
        };
        write!(f, "complete={}, nodes={}", complete, self.nodes)
    }
}

/// A single parsed bid request, kept alongside the text it was parsed from.
#[derive(Debug, Clone)]
pub struct AdRequestDocument {
    label: String,
    raw: String,
    body: Map<String, Value>,
    paths: BTreeSet<String>,
}

impl AdRequestDocument {
    pub fn parse(label: impl Into<String>, text: &str) -> Result<Self> {
        let label = label.into();
        let value: Value =
            serde_json::from_str(text).map_err(|e| AuditError::MalformedInput {
                label: label.clone(),
                details: e.to_string(),
            })?;

        let body = match value {
            Value::Object(map) => map,
            other => {
                return Err(AuditError::MalformedInput {
                    label,
                    details: format!("expected a JSON object, found {}", json_kind(&other)),
                })
            }
        };

        let mut paths = BTreeSet::new();
        for (key, value) in &body {
            collect_paths(key, value, &mut paths);
        }

        debug!(
            "Parsed ad request '{}' with {} distinct key paths",
            label,
            paths.len()
        );

        Ok(Self {
            label,
            raw: text.to_string(),
            body,
            paths,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Determines media type and ad type from the discriminating keys.
    ///
    /// Only discriminating objects count: `"app": null` is treated as absent.
    /// Optional fields never cause a failure.
    pub fn classify(&self) -> Result<Classification> {
        let media_type = match (self.is_object_at("app"), self.is_object_at("site")) {
            (true, false) => MediaType::App,
            (false, true) => MediaType::Site,
            (false, false) => {
                return Err(self.ambiguous("neither 'app' nor 'site' is present"));
            }
            (true, true) => {
                return Err(self.ambiguous("both 'app' and 'site' are present"));
            }
        };

        let mut has_banner = false;
        let mut has_video = false;
        for imp in self.impressions() {
            has_banner |= imp.get("banner").is_some_and(Value::is_object);
            has_video |= imp.get("video").is_some_and(Value::is_object);
        }

        let ad_type = match (has_banner, has_video) {
            (true, false) => AdType::Banner,
            (false, true) => AdType::Video,
            (false, false) => {
                return Err(self.ambiguous("no impression carries a 'banner' or 'video' object"));
            }
            (true, true) => {
                return Err(self.ambiguous("impressions carry both 'banner' and 'video' objects"));
            }
        };

        debug!(
            "Classified ad request '{}' as {}/{}",
            self.label, media_type, ad_type
        );

        Ok(Classification {
            media_type,
            ad_type,
        })
    }

    /// The `tmax` value rendered as text, if present.
    pub fn tmax(&self) -> Option<String> {
        match self.body.get("tmax")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    /// Reads `source.ext.schain`, falling back to the OpenRTB 2.6 `source.schain`.
    pub fn schain(&self) -> Option<SupplyChain> {
        let source = self.body.get("source")?;
        let schain = source
            .get("ext")
            .and_then(|ext| ext.get("schain"))
            .or_else(|| source.get("schain"))?
            .as_object()?;

        let complete = match schain.get("complete") {
            Some(Value::Number(n)) => match n.as_u64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        };
        let nodes = schain
            .get("nodes")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        Some(SupplyChain { complete, nodes })
    }

    /// Whether the canonical parameter name maps onto a non-null path of this
    /// request. Array indices are transparent; a leading `_` is ignored.
    pub fn has_parameter(&self, parameter: &str) -> bool {
        self.paths.contains(parameter) || self.paths.contains(parameter.trim_start_matches('_'))
    }

    fn is_object_at(&self, key: &str) -> bool {
        self.body.get(key).is_some_and(Value::is_object)
    }

    fn impressions(&self) -> Vec<&Map<String, Value>> {
        match self.body.get("imp") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            Some(Value::Object(single)) => vec![single],
            _ => Vec::new(),
        }
    }

    fn ambiguous(&self, details: &str) -> AuditError {
        AuditError::AmbiguousContext {
            label: self.label.clone(),
            details: details.to_string(),
        }
    }
}

fn collect_paths(path: &str, value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            out.insert(path.to_string());
            for (key, child) in map {
                collect_paths(&format!("{}_{}", path, key), child, out);
            }
        }
        Value::Array(items) => {
            out.insert(path.to_string());
            for item in items {
                if item.is_object() || item.is_array() {
                    descend_array_item(path, item, out);
                }
            }
        }
        _ => {
            out.insert(path.to_string());
        }
    }
}

fn descend_array_item(path: &str, item: &Value, out: &mut BTreeSet<String>) {
    match item {
        Value::Object(map) => {
            for (key, child) in map {
                collect_paths(&format!("{}_{}", path, key), child, out);
            }
        }
        Value::Array(items) => {
            for nested in items {
                descend_array_item(path, nested, out);
            }
        }
        _ => {}
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Relevant parameters that `doc` does not carry, in the order given.
pub fn missing_parameters<'a>(doc: &AdRequestDocument, relevant: &[&'a str]) -> Vec<&'a str> {
    relevant
        .iter()
        .copied()
        .filter(|param| !doc.has_parameter(param))
        .collect()
}

/// Parameters the source carries but the target lacks, restricted to the
/// target's relevant set.
pub fn missing_from_target<'a>(
    source: &AdRequestDocument,
    target: &AdRequestDocument,
    target_relevant: &[&'a str],
) -> Vec<&'a str> {
    target_relevant
        .iter()
        .copied()
        .filter(|param| source.has_parameter(param) && !target.has_parameter(param))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_BANNER: &str = r#"{
        "id": "req-1",
        "at": 1,
        "tmax": 300,
        "imp": [{ "id": "1", "banner": { "w": 320, "format": [{ "w": 320, "h": 50 }] } }],
        "app": { "id": "app-9", "publisher": { "id": "pub-1" } },
        "regs": { "ext": { "us_privacy": "1YNN" } },
        "source": { "ext": { "schain": { "complete": 1, "nodes": [{ "asi": "a.com" }, { "asi": "b.com" }] } } }
    }"#;

    #[test]
    fn test_classify_app_banner() {
        let doc = AdRequestDocument::parse("top", APP_BANNER).unwrap();
        let class = doc.classify().unwrap();
        assert_eq!(class.media_type, MediaType::App);
        assert_eq!(class.ad_type, AdType::Banner);
    }

    #[test]
    fn test_classify_site_video() {
        let doc = AdRequestDocument::parse(
            "b",
            r#"{ "site": { "page": "https://x.test" }, "imp": [{ "video": { "w": 640 } }] }"#,
        )
        .unwrap();
        let class = doc.classify().unwrap();
        assert_eq!(class.media_type, MediaType::Site);
        assert_eq!(class.ad_type, AdType::Video);
    }

    #[test]
    fn test_missing_media_discriminator_is_ambiguous() {
        let doc =
            AdRequestDocument::parse("a", r#"{ "imp": [{ "banner": { "w": 300 } }] }"#).unwrap();
        assert!(matches!(
            doc.classify(),
            Err(AuditError::AmbiguousContext { .. })
        ));
    }

    #[test]
    fn test_both_media_keys_are_ambiguous() {
        let doc = AdRequestDocument::parse(
            "a",
            r#"{ "app": {}, "site": {}, "imp": [{ "banner": {} }] }"#,
        )
        .unwrap();
        assert!(matches!(
            doc.classify(),
            Err(AuditError::AmbiguousContext { .. })
        ));
    }

    #[test]
    fn test_banner_and_video_impressions_are_ambiguous() {
        let doc = AdRequestDocument::parse(
            "a",
            r#"{ "app": {}, "imp": [{ "id": "1", "banner": { "w": 320 } }, { "id": "2", "video": { "w": 640 } }] }"#,
        )
        .unwrap();
        let err = doc.classify().unwrap_err();
        assert!(matches!(err, AuditError::AmbiguousContext { .. }));
        assert!(err.to_string().contains("both 'banner' and 'video'"));

        let single = AdRequestDocument::parse(
            "a",
            r#"{ "site": {}, "imp": [{ "banner": {}, "video": {} }] }"#,
        )
        .unwrap();
        assert!(matches!(
            single.classify(),
            Err(AuditError::AmbiguousContext { .. })
        ));
    }

    #[test]
    fn test_null_media_key_is_absent() {
        let doc = AdRequestDocument::parse(
            "a",
            r#"{ "app": null, "site": { "page": "https://x.test" }, "imp": [{ "banner": {} }] }"#,
        )
        .unwrap();
        assert_eq!(doc.classify().unwrap().media_type, MediaType::Site);

        let only_null =
            AdRequestDocument::parse("a", r#"{ "app": null, "imp": [{ "banner": {} }] }"#)
                .unwrap();
        assert!(matches!(
            only_null.classify(),
            Err(AuditError::AmbiguousContext { .. })
        ));
    }

    #[test]
    fn test_missing_ad_discriminator_is_ambiguous() {
        let doc = AdRequestDocument::parse("a", r#"{ "app": {}, "imp": [{ "id": "1" }] }"#).unwrap();
        let err = doc.classify().unwrap_err();
        assert!(err.to_string().contains("banner"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            AdRequestDocument::parse("a", "{ not json"),
            Err(AuditError::MalformedInput { .. })
        ));
        assert!(matches!(
            AdRequestDocument::parse("a", "[1, 2]"),
            Err(AuditError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_tmax_and_schain_extraction() {
        let doc = AdRequestDocument::parse("top", APP_BANNER).unwrap();
        assert_eq!(doc.tmax().as_deref(), Some("300"));
        assert_eq!(
            doc.schain(),
            Some(SupplyChain {
                complete: Some(true),
                nodes: 2
            })
        );

        let bare = AdRequestDocument::parse("low", r#"{ "app": {}, "imp": [{ "banner": {} }] }"#)
            .unwrap();
        assert_eq!(bare.tmax(), None);
        assert_eq!(bare.schain(), None);
    }

    #[test]
    fn test_parameter_presence_by_flattened_path() {
        let doc = AdRequestDocument::parse("top", APP_BANNER).unwrap();
        assert!(doc.has_parameter("_at"));
        assert!(doc.has_parameter("regs_ext_us_privacy"));
        assert!(doc.has_parameter("imp_banner_format_w"));
        assert!(doc.has_parameter("app_publisher_id"));
        assert!(doc.has_parameter("source_ext_schain"));
        assert!(!doc.has_parameter("device_ifa"));
    }

    #[test]
    fn test_presence_reaches_later_array_items() {
        let doc = AdRequestDocument::parse(
            "a",
            r#"{ "app": {}, "imp": [{ "id": "1", "banner": { "format": [{ "h": 50 }, { "w": 300, "h": 250 }] } }] }"#,
        )
        .unwrap();
        assert!(doc.has_parameter("imp_banner_format_w"));
        assert!(doc.has_parameter("imp_banner_format_h"));
        assert!(doc.has_parameter("imp_id"));
    }

    #[test]
    fn test_local_diffs() {
        let top = AdRequestDocument::parse("top", APP_BANNER).unwrap();
        let low = AdRequestDocument::parse(
            "low",
            r#"{ "id": "r", "app": { "id": "x" }, "imp": [{ "banner": { "w": 320 } }] }"#,
        )
        .unwrap();
        let relevant = ["id", "tmax", "app_id", "device_ifa", "source_ext_schain"];

        assert_eq!(
            missing_parameters(&low, &relevant),
            vec!["tmax", "device_ifa", "source_ext_schain"]
        );
        assert_eq!(
            missing_from_target(&top, &low, &relevant),
            vec!["tmax", "source_ext_schain"]
        );
    }
}
