//! Image and data quality types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use super::de::{as_bool, as_f64, as_string, as_string_list, clamp_unit};

// ============================================================================
// Quality Tier
// ============================================================================

/// Coarse quality rating, as self-reported by a model or derived from a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Clear and complete.
    Excellent,
    /// Readable with minor issues.
    Good,
    /// Partly readable.
    Fair,
    /// Mostly unreadable.
    Poor,
    /// Not reported.
    #[default]
    Unknown,
}

impl QualityTier {
    /// Parses a free-form tier name. Unrecognized names map to `Unknown`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "excellent" => Self::Excellent,
            "good" => Self::Good,
            "fair" | "average" | "medium" => Self::Fair,
            "poor" | "bad" | "low" => Self::Poor,
            _ => Self::Unknown,
        }
    }

    /// Derives a tier from a confidence score.
    pub fn from_score(score: f64, thresholds: &ConfidenceThresholds) -> Self {
        if score >= thresholds.excellent {
            Self::Excellent
        } else if score >= thresholds.good {
            Self::Good
        } else if score >= thresholds.minimum {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QualityTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.as_deref().map(Self::parse).unwrap_or_default())
    }
}

// ============================================================================
// Confidence Thresholds
// ============================================================================

/// Score boundaries used by the quality gate and tier derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    /// Extractions below this score are rejected.
    pub minimum: f64,
    /// Lower bound of the "good" tier.
    pub good: f64,
    /// Lower bound of the "excellent" tier.
    pub excellent: f64,
    /// Per-item confidence at or above which an item counts as high confidence.
    pub high_item: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            minimum: 0.5,
            good: 0.7,
            excellent: 0.85,
            high_item: 0.7,
        }
    }
}

impl ConfidenceThresholds {
    /// Returns true if `score` clears the quality gate.
    ///
    /// A score exactly at the minimum passes.
    pub fn passes(&self, score: f64) -> bool {
        score >= self.minimum
    }
}

// ============================================================================
// Quality Assessment
// ============================================================================

/// The model's self-assessment of how readable the bill image was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawQualityAssessment")]
pub struct QualityAssessment {
    /// Text is clear and readable.
    pub is_clear: bool,
    /// All required information is present.
    pub is_complete: bool,
    /// Overall tier.
    pub overall_quality: QualityTier,
    /// Confidence in the extraction, in `[0, 1]`.
    pub confidence_score: f64,
    /// Problems the model noticed.
    pub issues: Vec<String>,
}

impl Default for QualityAssessment {
    fn default() -> Self {
        Self {
            is_clear: false,
            is_complete: false,
            overall_quality: QualityTier::Unknown,
            confidence_score: 0.0,
            issues: Vec::new(),
        }
    }
}

/// Loosely-typed assessment as it arrives from a model.
#[derive(Debug, Default, Deserialize)]
struct RawQualityAssessment {
    #[serde(default)]
    is_clear: Option<Value>,
    #[serde(default)]
    is_complete: Option<Value>,
    #[serde(default)]
    overall_quality: Option<Value>,
    #[serde(default, alias = "confidence")]
    confidence_score: Option<Value>,
    #[serde(default)]
    issues: Option<Value>,
}

impl From<RawQualityAssessment> for QualityAssessment {
    fn from(raw: RawQualityAssessment) -> Self {
        Self {
            is_clear: raw.is_clear.as_ref().and_then(as_bool).unwrap_or(false),
            is_complete: raw.is_complete.as_ref().and_then(as_bool).unwrap_or(false),
            overall_quality: raw
                .overall_quality
                .as_ref()
                .and_then(as_string)
                .map(|s| QualityTier::parse(&s))
                .unwrap_or_default(),
            confidence_score: raw
                .confidence_score
                .as_ref()
                .and_then(as_f64)
                .map_or(0.0, clamp_unit),
            issues: raw.issues.as_ref().map(as_string_list).unwrap_or_default(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_from_score() {
        let t = ConfidenceThresholds::default();
        assert_eq!(QualityTier::from_score(0.9, &t), QualityTier::Excellent);
        assert_eq!(QualityTier::from_score(0.85, &t), QualityTier::Excellent);
        assert_eq!(QualityTier::from_score(0.7, &t), QualityTier::Good);
        assert_eq!(QualityTier::from_score(0.5, &t), QualityTier::Fair);
        assert_eq!(QualityTier::from_score(0.49, &t), QualityTier::Poor);
    }

    #[test]
    fn test_gate_boundary() {
        let t = ConfidenceThresholds::default();
        assert!(t.passes(0.5));
        assert!(!t.passes(0.499_999));
    }

    #[test]
    fn test_assessment_full() {
        let json = r#"{
            "is_clear": true,
            "is_complete": "yes",
            "overall_quality": "Excellent",
            "confidence_score": 0.95,
            "issues": ["slight blur"]
        }"#;
        let qa: QualityAssessment = serde_json::from_str(json).unwrap();
        assert!(qa.is_clear);
        assert!(qa.is_complete);
        assert_eq!(qa.overall_quality, QualityTier::Excellent);
        assert_eq!(qa.confidence_score, 0.95);
        assert_eq!(qa.issues, vec!["slight blur"]);
    }

    #[test]
    fn test_assessment_defaults_and_clamping() {
        let qa: QualityAssessment = serde_json::from_str("{}").unwrap();
        assert_eq!(qa, QualityAssessment::default());

        let qa: QualityAssessment =
            serde_json::from_str(r#"{"confidence_score": 1.4, "overall_quality": null}"#).unwrap();
        assert_eq!(qa.confidence_score, 1.0);
        assert_eq!(qa.overall_quality, QualityTier::Unknown);

        let qa: QualityAssessment = serde_json::from_str(r#"{"confidence": "0.8"}"#).unwrap();
        assert_eq!(qa.confidence_score, 0.8);
    }
}
