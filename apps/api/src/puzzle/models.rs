//! Snapshots exchanged between puzzle stages. Each attempt produces a fresh set.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub puzzle_type: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    #[serde(rename = "strategy")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub answer: String,
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// The stage a verifier blames for a failed solution.
///
/// Deserialization is total: `null`, `""` and `"none"` map to `None`, the three
/// known stage names map to their variant, and anything else maps to `Solver`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IssueSource {
    Classifier,
    Strategy,
    Solver,
    #[default]
    None,
}

impl IssueSource {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "" | "none" | "null" => IssueSource::None,
            "classifier" => IssueSource::Classifier,
            "strategy" => IssueSource::Strategy,
            _ => IssueSource::Solver,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSource::Classifier => "classifier",
            IssueSource::Strategy => "strategy",
            IssueSource::Solver => "solver",
            IssueSource::None => "none",
        }
    }
}

impl fmt::Display for IssueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IssueSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IssueSource::None => serializer.serialize_none(),
            other => serializer.serialize_str(other.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for IssueSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .map(IssueSource::from_label)
            .unwrap_or(IssueSource::None))
    }
}

/// A pipeline stage that can receive routed feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classifier,
    Strategy,
    Solver,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Classifier => "classifier",
            Stage::Strategy => "strategy",
            Stage::Solver => "solver",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// A reply without the flag counts as a failed verification.
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub issue_source: IssueSource,
    #[serde(default)]
    pub issue_details: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub verification_summary: Option<String>,
}

impl Verification {
    /// The stage that must receive feedback on the next attempt.
    /// A failed verification without a usable source is blamed on the solver.
    pub fn blamed_stage(&self) -> Option<Stage> {
        if self.is_valid {
            return None;
        }
        Some(match self.issue_source {
            IssueSource::Classifier => Stage::Classifier,
            IssueSource::Strategy => Stage::Strategy,
            IssueSource::Solver | IssueSource::None => Stage::Solver,
        })
    }
}

/// Feedback derived from the most recent failed verification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feedback {
    pub text: String,
    pub target: Option<Stage>,
}

impl Feedback {
    pub fn from_verification(verification: &Verification) -> Self {
        let Some(target) = verification.blamed_stage() else {
            return Feedback::default();
        };
        Feedback {
            text: format!(
                "Issue in {}: {}. Suggestion: {}",
                target.as_str(),
                verification.issue_details,
                verification.suggestion
            ),
            target: Some(target),
        }
    }

    /// Feedback as seen by `stage`: the full text if it is the blamed stage, otherwise empty.
    pub fn routed_to(&self, stage: Stage) -> &str {
        if self.target == Some(stage) {
            &self.text
        } else {
            ""
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    #[serde(default)]
    pub final_answer: String,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub deductions: Vec<String>,
    #[serde(default)]
    pub verification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationSummary {
    pub assumptions: Vec<String>,
    pub deductions: Vec<String>,
    pub verification: String,
}

/// Returned by every `solve` run, verified or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub puzzle_type: String,
    pub difficulty: String,
    pub strategy: String,
    pub answer: String,
    pub explanation: ExplanationSummary,
    /// Whether the last verification passed.
    pub verified: bool,
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(source: IssueSource) -> Verification {
        Verification {
            is_valid: false,
            issue_source: source,
            issue_details: "clue 4 violated".to_string(),
            suggestion: "re-check adjacency".to_string(),
            verification_summary: None,
        }
    }

    #[test]
    fn test_issue_source_known_labels() {
        assert_eq!(IssueSource::from_label("classifier"), IssueSource::Classifier);
        assert_eq!(IssueSource::from_label(" Strategy "), IssueSource::Strategy);
        assert_eq!(IssueSource::from_label("solver"), IssueSource::Solver);
        assert_eq!(IssueSource::from_label("none"), IssueSource::None);
    }

    #[test]
    fn test_issue_source_unknown_label_defaults_to_solver() {
        assert_eq!(IssueSource::from_label("explainer"), IssueSource::Solver);
    }

    #[test]
    fn test_verification_missing_issue_source_deserializes_to_none() {
        let v: Verification = serde_json::from_str(r#"{"is_valid": false}"#).unwrap();
        assert_eq!(v.issue_source, IssueSource::None);
        assert_eq!(v.blamed_stage(), Some(Stage::Solver));
    }

    #[test]
    fn test_verification_missing_is_valid_counts_as_failed() {
        let v: Verification = serde_json::from_str(
            r#"{"issue_source":"solver","issue_details":"clue 4","suggestion":"recheck"}"#,
        )
        .unwrap();
        assert!(!v.is_valid);
        assert_eq!(v.blamed_stage(), Some(Stage::Solver));
        assert_eq!(
            Feedback::from_verification(&v).text,
            "Issue in solver: clue 4. Suggestion: recheck"
        );
    }

    #[test]
    fn test_verification_null_issue_source() {
        let v: Verification =
            serde_json::from_str(r#"{"is_valid": true, "issue_source": null}"#).unwrap();
        assert_eq!(v.issue_source, IssueSource::None);
        assert_eq!(v.blamed_stage(), None);
    }

    #[test]
    fn test_feedback_text_format() {
        let fb = Feedback::from_verification(&failed(IssueSource::Strategy));
        assert_eq!(
            fb.text,
            "Issue in strategy: clue 4 violated. Suggestion: re-check adjacency"
        );
        assert_eq!(fb.target, Some(Stage::Strategy));
    }

    #[test]
    fn test_feedback_routes_to_exactly_one_stage() {
        let fb = Feedback::from_verification(&failed(IssueSource::Classifier));
        assert!(!fb.routed_to(Stage::Classifier).is_empty());
        assert!(fb.routed_to(Stage::Strategy).is_empty());
        assert!(fb.routed_to(Stage::Solver).is_empty());
    }

    #[test]
    fn test_feedback_unknown_source_names_solver() {
        let fb = Feedback::from_verification(&failed(IssueSource::None));
        assert!(fb.text.starts_with("Issue in solver:"));
        assert!(!fb.routed_to(Stage::Solver).is_empty());
    }

    #[test]
    fn test_feedback_cleared_on_valid_verification() {
        let mut v = failed(IssueSource::Solver);
        v.is_valid = true;
        assert_eq!(Feedback::from_verification(&v), Feedback::default());
    }

    #[test]
    fn test_strategy_deserializes_from_strategy_key() {
        let s: Strategy = serde_json::from_str(r#"{"strategy": "grid elimination"}"#).unwrap();
        assert_eq!(s.description, "grid elimination");
    }

    #[test]
    fn test_issue_source_serializes_none_as_null() {
        let json = serde_json::to_value(IssueSource::None).unwrap();
        assert!(json.is_null());
        let json = serde_json::to_value(IssueSource::Strategy).unwrap();
        assert_eq!(json, "strategy");
    }
}
