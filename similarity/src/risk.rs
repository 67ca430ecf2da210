use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use util::execution_config::RiskThresholds;

/// Plagiarism risk tier derived from a student's maximum similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Thresholds are inclusive lower bounds.
    pub fn from_similarity(similarity: f64, thresholds: &RiskThresholds) -> Self {
        if similarity >= thresholds.critical {
            RiskLevel::Critical
        } else if similarity >= thresholds.high {
            RiskLevel::High
        } else if similarity >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tiers() {
        let t = RiskThresholds::default();
        assert_eq!(RiskLevel::from_similarity(85.0, &t), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_similarity(72.0, &t), RiskLevel::High);
        assert_eq!(RiskLevel::from_similarity(65.0, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_similarity(40.0, &t), RiskLevel::Low);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let t = RiskThresholds::default();
        assert_eq!(RiskLevel::from_similarity(80.0, &t), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_similarity(70.0, &t), RiskLevel::High);
        assert_eq!(RiskLevel::from_similarity(60.0, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_similarity(59.99, &t), RiskLevel::Low);
    }

    #[test]
    fn round_trips_through_strings() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical] {
            assert_eq!(level.to_string().parse::<RiskLevel>().unwrap(), level);
        }
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"critical\"");
        assert!("severe".parse::<RiskLevel>().is_err());
    }
}
