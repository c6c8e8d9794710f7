//! Core data models for the gateway

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;

pub const DEFAULT_LANGUAGE: &str = "English";

//
// ================= Enums =================
//

/// Investor risk appetite. Parsed case-insensitively; unknown values are rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "conservative" => Ok(RiskLevel::Low),
            "medium" | "moderate" | "balanced" => Ok(RiskLevel::Medium),
            "high" | "aggressive" => Ok(RiskLevel::High),
            other => Err(GatewayError::InvalidRequest(format!(
                "unknown risk level '{}' (expected low, medium or high)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for RiskLevel {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//
// ================= /generate =================
//

/// Body of `POST /generate`. `null` and absent fields behave the same.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub risk: Option<RiskLevel>,
}

impl GenerateRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn risk(&self) -> Option<RiskLevel> {
        self.risk
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

//
// ================= /api/portfolio =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorProfile {
    #[serde(default)]
    pub capital: Option<f64>,
    #[serde(default)]
    pub monthly_investment: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, deserialize_with = "lenient_preferences")]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Anything other than a list (including `null`) means no preferences
fn lenient_preferences<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

impl InvestorProfile {
    /// Profile for a free-text portfolio request coming through `/generate`
    pub fn from_query(query: &str, risk: Option<RiskLevel>, language: &str) -> Self {
        Self {
            risk_level: risk,
            query: Some(query.to_string()),
            language: Some(language.to_string()),
            ..Default::default()
        }
    }

    pub fn risk(&self) -> RiskLevel {
        self.risk_level.unwrap_or(RiskLevel::Medium)
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: GenerateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.query(), "");
        assert_eq!(req.language(), "English");
        assert_eq!(req.risk(), None);

        let req: GenerateRequest =
            serde_json::from_str(r#"{"query": null, "language": null, "risk": null}"#).unwrap();
        assert_eq!(req.query(), "");
        assert_eq!(req.language(), "English");
        assert_eq!(req.risk(), None);
    }

    #[test]
    fn test_risk_parsing() {
        let req: GenerateRequest =
            serde_json::from_str(r#"{"query": "q", "risk": "HIGH"}"#).unwrap();
        assert_eq!(req.risk(), Some(RiskLevel::High));

        assert_eq!("moderate".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
        assert_eq!(" Conservative ".parse::<RiskLevel>().unwrap(), RiskLevel::Low);
        assert!("extreme".parse::<RiskLevel>().is_err());

        let bad = serde_json::from_str::<GenerateRequest>(r#"{"risk": "extreme"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_risk_serializes_lowercase() {
        let json = serde_json::to_string(&RiskLevel::High).unwrap();
        assert_eq!(json, "\"high\"");
        assert_eq!(RiskLevel::Low.to_string(), "low");
    }

    #[test]
    fn test_profile_camel_case() {
        let profile: InvestorProfile = serde_json::from_str(
            r#"{"capital": 100000, "monthlyInvestment": 5000, "riskLevel": "low", "preferences": ["gold"]}"#,
        )
        .unwrap();
        assert_eq!(profile.capital, Some(100000.0));
        assert_eq!(profile.monthly_investment, Some(5000.0));
        assert_eq!(profile.risk(), RiskLevel::Low);
        assert_eq!(profile.preferences, vec!["gold".to_string()]);
        assert_eq!(profile.language(), "English");
    }

    #[test]
    fn test_profile_preferences_null_or_not_a_list() {
        let profile: InvestorProfile =
            serde_json::from_str(r#"{"preferences": null, "riskLevel": "low"}"#).unwrap();
        assert!(profile.preferences.is_empty());
        assert_eq!(profile.risk(), RiskLevel::Low);

        let profile: InvestorProfile =
            serde_json::from_str(r#"{"preferences": "gold"}"#).unwrap();
        assert!(profile.preferences.is_empty());

        let profile: InvestorProfile =
            serde_json::from_str(r#"{"preferences": ["gold", 3, "bonds"]}"#).unwrap();
        assert_eq!(profile.preferences, vec!["gold".to_string(), "bonds".to_string()]);
    }
}
