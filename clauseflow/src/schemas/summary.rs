//! Contract summary record.

use super::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Overall risk rating given by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
}

impl RiskLevel {
    /// Parses a label such as "High" or "medium risk".
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        if lower.starts_with("high") {
            Some(Self::High)
        } else if lower.starts_with("medium") || lower.starts_with("moderate") {
            Some(Self::Medium)
        } else if lower.starts_with("low") {
            Some(Self::Low)
        } else {
            None
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

fn risk_level<'de, D>(deserializer: D) -> Result<Option<RiskLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de::opt_string(deserializer)?.and_then(|s| RiskLevel::from_label(&s)))
}

/// Whole-contract summary produced by the Summarization stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSummary {
    /// The summary text. Never empty in a produced result.
    #[serde(default, deserialize_with = "de::text")]
    pub summary: String,
    /// Overall risk rating, if the model gave one.
    #[serde(default, alias = "risk", alias = "risk_assessment", deserialize_with = "risk_level")]
    pub risk_level: Option<RiskLevel>,
    /// Terms the model flagged for review.
    #[serde(default, alias = "flags", alias = "warnings", deserialize_with = "de::string_list")]
    pub flagged_terms: Vec<String>,
}

impl ContractSummary {
    /// Creates a summary with only the text set.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_labels() {
        assert_eq!(RiskLevel::from_label("High"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_label("moderate risk"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_label("unknown"), None);
    }

    #[test]
    fn test_summary_deserialize() {
        let json = r#"{"summary": " A services agreement. ", "risk": "Medium",
                       "flags": ["Unlimited liability"]}"#;
        let summary: ContractSummary = serde_json::from_str(json).unwrap();

        assert_eq!(summary.summary, "A services agreement.");
        assert_eq!(summary.risk_level, Some(RiskLevel::Medium));
        assert_eq!(summary.flagged_terms, vec!["Unlimited liability"]);
    }

    #[test]
    fn test_unrecognized_risk_is_none() {
        let summary: ContractSummary =
            serde_json::from_str(r#"{"summary": "x", "risk_level": "spicy"}"#).unwrap();
        assert_eq!(summary.risk_level, None);
    }
}
