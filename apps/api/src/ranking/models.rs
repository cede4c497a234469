use serde::{Deserialize, Serialize};

/// Structured requirements extracted from a job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedJD {
    pub role: String,
    #[serde(default)]
    pub must_have_skills: Vec<String>,
    #[serde(default)]
    pub nice_to_have_skills: Vec<String>,
    #[serde(default)]
    pub min_experience_years: f64,
    /// Upper bound when the JD states one; scoring assumes `min + 5` otherwise.
    #[serde(default)]
    pub max_experience_years: Option<f64>,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Short summary used for semantic matching.
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
}

/// Structured candidate profile. `candidate_id` and `raw_text` are filled in
/// by the parser chain, not by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default)]
    pub candidate_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: f64,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub companies: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub raw_text: String,
}

impl ParsedResume {
    /// Project names and descriptions as one text for embedding.
    pub fn project_text(&self) -> String {
        self.projects
            .iter()
            .map(|p| format!("{} {}", p.name, p.description))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The four per-candidate signals, each in [0, 1] (semantic may dip below 0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringSignals {
    #[serde(rename = "semantic_score")]
    pub semantic: f64,
    #[serde(rename = "skill_match_score")]
    pub skill_match: f64,
    #[serde(rename = "experience_score")]
    pub experience: f64,
    #[serde(rename = "project_relevance_score")]
    pub project_relevance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    /// Missing but learnable skills.
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub fit_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub candidate_id: String,
    pub name: String,
    pub filename: String,
    pub rank: u32,
    /// Weighted aggregate, 0–100, two decimals.
    pub final_score: f64,
    pub signals: ScoringSignals,
    pub evaluation: Option<CandidateEvaluation>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResponse {
    pub jd_summary: String,
    pub total_candidates: usize,
    pub rankings: Vec<RankedCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankedResult {
    pub candidate_id: String,
    pub rank: u32,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RerankerOutput {
    #[serde(default)]
    pub rankings: Vec<RerankedResult>,
}
