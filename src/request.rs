use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisMode {
    #[serde(rename = "single_publisher")]
    SinglePublisher,
    #[serde(rename = "top_vs_low")]
    TopVsLowPerformer,
    #[serde(rename = "two_publishers")]
    TwoPublishers,
}

/// How a request is referred to in prompts and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRole {
    pub label: &'static str,
    pub role: &'static str,
}

impl AnalysisMode {
    pub fn required_ad_requests(self) -> usize {
        match self {
            AnalysisMode::SinglePublisher => 1,
            AnalysisMode::TopVsLowPerformer | AnalysisMode::TwoPublishers => 2,
        }
    }

    /// The top-vs-low comparison carries a single KPI set, for the low performer.
    pub fn required_kpi_sets(self) -> usize {
        match self {
            AnalysisMode::SinglePublisher | AnalysisMode::TopVsLowPerformer => 1,
            AnalysisMode::TwoPublishers => 2,
        }
    }

    pub fn has_comparison(self) -> bool {
        self != AnalysisMode::SinglePublisher
    }

    pub fn roles(self) -> &'static [RequestRole] {
        match self {
            AnalysisMode::SinglePublisher => &[RequestRole {
                label: "Publisher",
                role: "Subject",
            }],
            AnalysisMode::TopVsLowPerformer => &[
                RequestRole {
                    label: "Top Performer",
                    role: "Source",
                },
                RequestRole {
                    label: "Low Performer",
                    role: "Target",
                },
            ],
            AnalysisMode::TwoPublishers => &[
                RequestRole {
                    label: "Publisher A",
                    role: "Source",
                },
                RequestRole {
                    label: "Publisher B",
                    role: "Target",
                },
            ],
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisMode::SinglePublisher => "single_publisher",
            AnalysisMode::TopVsLowPerformer => "top_vs_low",
            AnalysisMode::TwoPublishers => "two_publishers",
        };
        f.write_str(name)
    }
}

/// Performance figures as entered by the user. Values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSet {
    pub ad_requests: String,
    /// Percentage, without the `%` sign.
    pub fill_rate: String,
    /// USD, without the currency sign.
    pub cpm: String,
}

impl KpiSet {
    pub fn new(
        ad_requests: impl Into<String>,
        fill_rate: impl Into<String>,
        cpm: impl Into<String>,
    ) -> Self {
        Self {
            ad_requests: ad_requests.into(),
            fill_rate: fill_rate.into(),
            cpm: cpm.into(),
        }
    }

    fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("adRequests", &self.ad_requests),
            ("fillRate", &self.fill_rate),
            ("cpm", &self.cpm),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub mode: AnalysisMode,
    pub kpi_sets: Vec<KpiSet>,
    pub ad_request_inputs: Vec<String>,
}

impl AnalysisRequest {
    pub fn new(mode: AnalysisMode, kpi_sets: Vec<KpiSet>, ad_request_inputs: Vec<String>) -> Self {
        Self {
            mode,
            kpi_sets,
            ad_request_inputs,
        }
    }

    /// Checks input counts against the mode and rejects blank fields.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        let kpis_needed = self.mode.required_kpi_sets();
        if self.kpi_sets.len() != kpis_needed {
            problems.push(format!(
                "mode '{}' requires {} KPI set(s), got {}",
                self.mode,
                kpis_needed,
                self.kpi_sets.len()
            ));
        }

        let requests_needed = self.mode.required_ad_requests();
        if self.ad_request_inputs.len() != requests_needed {
            problems.push(format!(
                "mode '{}' requires {} ad request(s), got {}",
                self.mode,
                requests_needed,
                self.ad_request_inputs.len()
            ));
        }

        for (idx, kpi) in self.kpi_sets.iter().enumerate() {
            let blank = kpi.blank_fields();
            if !blank.is_empty() {
                problems.push(format!("kpiSets[{}] has empty {}", idx, blank.join(", ")));
            }
        }

        for (idx, input) in self.ad_request_inputs.iter().enumerate() {
            if input.trim().is_empty() {
                problems.push(format!("adRequestInputs[{}] is empty", idx));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AuditError::MissingFields(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kpi() -> KpiSet {
        KpiSet::new("1000", "40", "1.5")
    }

    #[test]
    fn test_mode_wire_names() {
        let mode: AnalysisMode = serde_json::from_str("\"top_vs_low\"").unwrap();
        assert_eq!(mode, AnalysisMode::TopVsLowPerformer);
        assert_eq!(
            serde_json::to_string(&AnalysisMode::TwoPublishers).unwrap(),
            "\"two_publishers\""
        );
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: AnalysisRequest = serde_json::from_str(
            r#"{
                "mode": "single_publisher",
                "kpiSets": [{ "adRequests": "10", "fillRate": "50", "cpm": "2" }],
                "adRequestInputs": ["{}"]
            }"#,
        )
        .unwrap();
        assert_eq!(request.kpi_sets[0].fill_rate, "50");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_top_vs_low_takes_one_kpi_set() {
        let request = AnalysisRequest::new(
            AnalysisMode::TopVsLowPerformer,
            vec![kpi()],
            vec!["{}".to_string(), "{}".to_string()],
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_count_mismatch_is_missing_fields() {
        let request = AnalysisRequest::new(
            AnalysisMode::TwoPublishers,
            vec![kpi()],
            vec!["{}".to_string(), "{}".to_string()],
        );
        let err = request.validate().unwrap_err();
        assert!(matches!(err, AuditError::MissingFields(_)));
        assert!(err.to_string().contains("2 KPI set(s), got 1"));
    }

    #[test]
    fn test_blank_kpi_field_is_missing_fields() {
        let request = AnalysisRequest::new(
            AnalysisMode::SinglePublisher,
            vec![KpiSet::new("1000", "  ", "")],
            vec!["{}".to_string()],
        );
        let err = request.validate().unwrap_err();
        assert!(err.to_string().contains("kpiSets[0] has empty fillRate, cpm"));
    }

    #[test]
    fn test_blank_ad_request_is_missing_fields() {
        let request = AnalysisRequest::new(
            AnalysisMode::SinglePublisher,
            vec![kpi()],
            vec!["\n".to_string()],
        );
        assert!(matches!(
            request.validate(),
            Err(AuditError::MissingFields(_))
        ));
    }
}
