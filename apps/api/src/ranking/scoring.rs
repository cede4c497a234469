//! Scoring Engine: four deterministic signals and their weighted aggregate.
//!
//! Signals:
//! - semantic: cosine(JD summary, candidate summary)
//! - skill match: alias-aware coverage of must-have (0.7) and nice-to-have (0.3) skills
//! - experience: 1.0 inside [min, max], Gaussian fall-off outside
//! - project relevance: cosine(JD summary, project text), 0.5 with no projects
//!
//! Only `ScoringEngine::score_all` touches the network (one embedding batch);
//! everything else is a pure function of its inputs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embeddings::{Embedder, EmbeddingError};
use crate::ranking::models::{ParsedJD, ParsedResume, ScoringSignals};
use crate::retrieval::similarity::cosine_similarity;

const MUST_HAVE_WEIGHT: f64 = 0.7;
const NICE_TO_HAVE_WEIGHT: f64 = 0.3;
/// Years assumed for the range when the JD gives only a minimum.
const DEFAULT_EXPERIENCE_SPAN: f64 = 5.0;
pub const DEFAULT_EXPERIENCE_TOLERANCE: f64 = 2.0;
const OVERQUALIFIED_FLOOR: f64 = 0.3;
const NO_PROJECTS_SCORE: f64 = 0.5;
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Canonical skill name → accepted aliases.
const SKILL_ALIASES: &[(&str, &[&str])] = &[
    ("javascript", &["js", "ecmascript"]),
    ("typescript", &["ts"]),
    ("python", &["py"]),
    ("postgresql", &["postgres", "psql"]),
    ("mongodb", &["mongo"]),
    ("kubernetes", &["k8s"]),
    ("react", &["reactjs", "react.js"]),
    ("node", &["nodejs", "node.js"]),
    ("fastapi", &["fast api"]),
    ("machine learning", &["ml"]),
    ("artificial intelligence", &["ai"]),
    ("amazon web services", &["aws"]),
    ("google cloud platform", &["gcp"]),
    ("microsoft azure", &["azure"]),
];

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum WeightsError {
    #[error("Scoring weight '{0}' must be a finite, non-negative number")]
    Invalid(&'static str),

    #[error("Scoring weights must sum to 1.0, got {0}")]
    BadSum(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub semantic: f64,
    pub skill: f64,
    pub experience: f64,
    pub project: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            semantic: 0.40,
            skill: 0.30,
            experience: 0.20,
            project: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), WeightsError> {
        for (name, w) in [
            ("semantic", self.semantic),
            ("skill", self.skill),
            ("experience", self.experience),
            ("project", self.project),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(WeightsError::Invalid(name));
            }
        }

        let sum = self.semantic + self.skill + self.experience + self.project;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(WeightsError::BadSum(sum));
        }
        Ok(())
    }
}

/// `round(100 * Σ wᵢ·sᵢ, 2)`.
pub fn compute_aggregate_score(weights: &ScoringWeights, signals: &ScoringSignals) -> f64 {
    let weighted = weights.semantic * signals.semantic
        + weights.skill * signals.skill_match
        + weights.experience * signals.experience
        + weights.project * signals.project_relevance;
    round_to_cents(weighted * 100.0)
}

/// Rounds the exact decimal value of `value` to 2 places. The double nearest
/// 0.015 is 0.01499…, so it rounds to 0.01; scaling by 100 first would land
/// on 1.5 and round up to 0.02.
fn round_to_cents(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

// ────────────────────────────────────────────────────────────────────────────
// Skill match
// ────────────────────────────────────────────────────────────────────────────

/// Lowercases, trims and maps `-` / `_` to spaces.
pub fn normalize_skill(skill: &str) -> String {
    skill.trim().to_lowercase().replace(['-', '_'], " ")
}

/// The normalized skill plus every alias group it belongs to.
pub fn skill_variants(skill: &str) -> HashSet<String> {
    let base = normalize_skill(skill);
    let mut variants = HashSet::from([base.clone()]);

    for (canonical, aliases) in SKILL_ALIASES {
        if base == *canonical || aliases.contains(&base.as_str()) {
            variants.insert((*canonical).to_string());
            variants.extend(aliases.iter().map(|a| (*a).to_string()));
        }
    }
    variants
}

pub fn compute_skill_match_score(
    must_have: &[String],
    nice_to_have: &[String],
    candidate_skills: &[String],
) -> f64 {
    if must_have.is_empty() && nice_to_have.is_empty() {
        return 1.0;
    }

    let candidate: HashSet<String> = candidate_skills
        .iter()
        .flat_map(|s| skill_variants(s))
        .collect();

    let coverage = |required: &[String]| -> f64 {
        if required.is_empty() {
            return 1.0;
        }
        let matched = required
            .iter()
            .filter(|skill| !skill_variants(skill).is_disjoint(&candidate))
            .count();
        matched as f64 / required.len() as f64
    };

    match (must_have.is_empty(), nice_to_have.is_empty()) {
        (false, false) => {
            MUST_HAVE_WEIGHT * coverage(must_have) + NICE_TO_HAVE_WEIGHT * coverage(nice_to_have)
        }
        (false, true) => coverage(must_have),
        _ => coverage(nice_to_have),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

/// Under-qualification decays as `exp(-0.5·(gap/tol)²)` toward 0; over-qualification
/// as `exp(-0.3·(gap/tol)²)`, floored at 0.3.
pub fn compute_experience_score(
    candidate_years: f64,
    min_required: f64,
    max_required: Option<f64>,
    tolerance: f64,
) -> f64 {
    let max_required = max_required.unwrap_or(min_required + DEFAULT_EXPERIENCE_SPAN);

    if candidate_years < min_required {
        let gap = (min_required - candidate_years) / tolerance;
        (-0.5 * gap * gap).exp().max(0.0)
    } else if candidate_years > max_required {
        let gap = (candidate_years - max_required) / tolerance;
        (-0.3 * gap * gap).exp().max(OVERQUALIFIED_FLOOR)
    } else {
        1.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Semantic signals
// ────────────────────────────────────────────────────────────────────────────

/// Raw cosine between two embeddings; a missing (blank-text) side scores 0.
pub fn semantic_score(jd: Option<&[f32]>, candidate: Option<&[f32]>) -> f64 {
    match (jd, candidate) {
        (Some(a), Some(b)) => cosine_similarity(a, b),
        _ => 0.0,
    }
}

/// Like `semantic_score`, but a candidate without project text gets 0.5.
pub fn project_relevance(jd: Option<&[f32]>, projects: Option<&[f32]>) -> f64 {
    match projects {
        Some(p) => semantic_score(jd, Some(p)),
        None => NO_PROJECTS_SCORE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub signals: ScoringSignals,
    pub aggregate: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    experience_tolerance: f64,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            weights,
            experience_tolerance: DEFAULT_EXPERIENCE_TOLERANCE,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Scores one candidate given pre-computed embeddings.
    pub fn score(
        &self,
        jd: &ParsedJD,
        resume: &ParsedResume,
        jd_vector: Option<&[f32]>,
        summary_vector: Option<&[f32]>,
        project_vector: Option<&[f32]>,
    ) -> CandidateScore {
        let signals = ScoringSignals {
            semantic: semantic_score(jd_vector, summary_vector),
            skill_match: compute_skill_match_score(
                &jd.must_have_skills,
                &jd.nice_to_have_skills,
                &resume.skills,
            ),
            experience: compute_experience_score(
                resume.experience_years,
                jd.min_experience_years,
                jd.max_experience_years,
                self.experience_tolerance,
            ),
            project_relevance: project_relevance(jd_vector, project_vector),
        };

        CandidateScore {
            signals,
            aggregate: compute_aggregate_score(&self.weights, &signals),
        }
    }

    /// Scores every candidate, embedding the JD summary, candidate summaries and
    /// project texts in a single batch. Blank texts are never sent to the embedder.
    pub async fn score_all(
        &self,
        embedder: &dyn Embedder,
        jd: &ParsedJD,
        resumes: &[ParsedResume],
    ) -> Result<Vec<CandidateScore>, EmbeddingError> {
        let mut batch = TextBatch::default();
        let jd_slot = batch.push(&jd.summary);
        let slots: Vec<(Option<usize>, Option<usize>)> = resumes
            .iter()
            .map(|r| (batch.push(&r.summary), batch.push(&r.project_text())))
            .collect();

        let vectors = if batch.texts.is_empty() {
            Vec::new()
        } else {
            embedder.embed(&batch.texts).await?
        };
        if vectors.len() != batch.texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.texts.len(),
                returned: vectors.len(),
            });
        }

        let lookup = |slot: Option<usize>| slot.map(|i| vectors[i].as_slice());
        Ok(resumes
            .iter()
            .zip(slots)
            .map(|(resume, (summary, projects))| {
                self.score(jd, resume, lookup(jd_slot), lookup(summary), lookup(projects))
            })
            .collect())
    }
}

#[derive(Default)]
struct TextBatch {
    texts: Vec<String>,
}

impl TextBatch {
    fn push(&mut self, text: &str) -> Option<usize> {
        if text.trim().is_empty() {
            return None;
        }
        self.texts.push(text.to_string());
        Some(self.texts.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::models::Project;
    use crate::retrieval::resume_index::test_support::KeywordEmbedder;
    use proptest::prelude::*;

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_skill() {
        assert_eq!(normalize_skill("  Machine-Learning "), "machine learning");
        assert_eq!(normalize_skill("Fast_API"), "fast api");
    }

    #[test]
    fn test_alias_js_matches_javascript() {
        let score = compute_skill_match_score(&skills(&["javascript"]), &[], &skills(&["JS"]));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_alias_works_from_both_sides() {
        assert!(skill_variants("k8s").contains("kubernetes"));
        assert!(skill_variants("Kubernetes").contains("k8s"));
        assert!(skill_variants("FastAPI").contains("fast api"));
    }

    #[test]
    fn test_skill_match_both_lists_empty_is_perfect() {
        assert_eq!(compute_skill_match_score(&[], &[], &skills(&["rust"])), 1.0);
        assert_eq!(compute_skill_match_score(&[], &[], &[]), 1.0);
    }

    #[test]
    fn test_skill_match_weighted_combination() {
        let must = skills(&["Rust", "PostgreSQL"]);
        let nice = skills(&["Kubernetes", "Kafka"]);
        let candidate = skills(&["rust", "postgres", "k8s"]);
        // must: 2/2, nice: 1/2
        let score = compute_skill_match_score(&must, &nice, &candidate);
        assert!((score - (0.7 + 0.15)).abs() < 1e-12);
    }

    #[test]
    fn test_skill_match_single_list_fallback() {
        let nice = skills(&["go", "rust"]);
        assert_eq!(compute_skill_match_score(&[], &nice, &skills(&["Rust"])), 0.5);
        let must = skills(&["go", "rust", "c"]);
        let score = compute_skill_match_score(&must, &[], &skills(&["Go"]));
        assert!((score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_experience_inside_range_is_one() {
        assert_eq!(compute_experience_score(3.0, 2.0, Some(6.0), 2.0), 1.0);
        assert_eq!(compute_experience_score(2.0, 2.0, Some(6.0), 2.0), 1.0);
        assert_eq!(compute_experience_score(6.0, 2.0, Some(6.0), 2.0), 1.0);
        // max defaults to min + 5
        assert_eq!(compute_experience_score(8.0, 3.0, None, 2.0), 1.0);
    }

    #[test]
    fn test_experience_penalties() {
        // two years short with tolerance 2 → exp(-0.5)
        let under = compute_experience_score(0.0, 2.0, Some(6.0), 2.0);
        assert!((under - (-0.5_f64).exp()).abs() < 1e-12);

        // two years over → exp(-0.3)
        let over = compute_experience_score(8.0, 2.0, Some(6.0), 2.0);
        assert!((over - (-0.3_f64).exp()).abs() < 1e-12);

        // far over hits the floor
        assert_eq!(compute_experience_score(40.0, 2.0, Some(6.0), 2.0), 0.3);
    }

    #[test]
    fn test_aggregate_all_ones_is_hundred() {
        let signals = ScoringSignals {
            semantic: 1.0,
            skill_match: 1.0,
            experience: 1.0,
            project_relevance: 1.0,
        };
        assert_eq!(
            compute_aggregate_score(&ScoringWeights::default(), &signals),
            100.0
        );
    }

    #[test]
    fn test_aggregate_rounds_to_two_decimals() {
        let signals = ScoringSignals {
            semantic: 0.123456,
            skill_match: 0.5,
            experience: 1.0,
            project_relevance: 0.5,
        };
        // 0.4·0.123456 + 0.15 + 0.2 + 0.05 = 0.4493824
        assert_eq!(
            compute_aggregate_score(&ScoringWeights::default(), &signals),
            44.94
        );
    }

    #[test]
    fn test_round_to_cents_uses_exact_decimal_value() {
        assert_eq!(round_to_cents(0.015), 0.01);
        assert_eq!(round_to_cents(0.075), 0.07);
        assert_eq!(round_to_cents(12.345), 12.35);
        assert_eq!(round_to_cents(2.675), 2.67);
        assert_eq!(round_to_cents(44.93824), 44.94);
        assert_eq!(round_to_cents(99.999), 100.0);
    }

    #[test]
    fn test_weights_validation() {
        assert!(ScoringWeights::default().validate().is_ok());

        let bad_sum = ScoringWeights {
            semantic: 0.5,
            ..Default::default()
        };
        assert!(matches!(bad_sum.validate(), Err(WeightsError::BadSum(_))));

        let negative = ScoringWeights {
            semantic: 0.6,
            project: -0.1,
            ..Default::default()
        };
        assert_eq!(negative.validate(), Err(WeightsError::Invalid("project")));
    }

    #[test]
    fn test_semantic_missing_side_is_zero() {
        let v = [1.0_f32, 0.0];
        assert_eq!(semantic_score(None, Some(&v)), 0.0);
        assert_eq!(semantic_score(Some(&v), None), 0.0);
        assert_eq!(project_relevance(Some(&v), None), 0.5);
        assert_eq!(project_relevance(Some(&v), Some(&v)), 1.0);
    }

    #[tokio::test]
    async fn test_score_all_batches_and_scores() {
        let embedder = KeywordEmbedder::new(&["rust", "python", "data"]);
        let engine = ScoringEngine::default();
        let jd = ParsedJD {
            role: "Rust Engineer".into(),
            must_have_skills: skills(&["rust"]),
            min_experience_years: 3.0,
            summary: "rust services".into(),
            ..Default::default()
        };
        let rustacean = ParsedResume {
            name: "A".into(),
            skills: skills(&["Rust"]),
            experience_years: 4.0,
            summary: "rust engineer".into(),
            projects: vec![Project {
                name: "crawler".into(),
                description: "rust crawler".into(),
                technologies: vec![],
            }],
            ..Default::default()
        };
        let blank = ParsedResume {
            name: "B".into(),
            experience_years: 4.0,
            ..Default::default()
        };

        let scores = engine
            .score_all(&embedder, &jd, &[rustacean, blank])
            .await
            .unwrap();

        assert_eq!(scores[0].signals.semantic, 1.0);
        assert_eq!(scores[0].signals.project_relevance, 1.0);
        assert_eq!(scores[0].aggregate, 100.0);

        assert_eq!(scores[1].signals.semantic, 0.0);
        assert_eq!(scores[1].signals.skill_match, 0.0);
        assert_eq!(scores[1].signals.project_relevance, 0.5);
        // 0.2·1.0 + 0.1·0.5
        assert_eq!(scores[1].aggregate, 25.0);
    }

    proptest! {
        #[test]
        fn prop_experience_in_range_is_exactly_one(
            min in 0.0f64..20.0,
            span in 0.0f64..10.0,
            t in 0.0f64..=1.0,
        ) {
            let max = min + span;
            let years = min + t * span;
            prop_assert_eq!(compute_experience_score(years, min, Some(max), 2.0), 1.0);
        }

        #[test]
        fn prop_experience_monotone_below_range(
            min in 1.0f64..20.0,
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let (near, far) = if a < b { (a, b) } else { (b, a) };
            let near_score = compute_experience_score(min - near * min, min, None, 2.0);
            let far_score = compute_experience_score(min - far * min, min, None, 2.0);
            prop_assert!(far_score <= near_score);
            prop_assert!((0.0..=1.0).contains(&far_score));
        }

        #[test]
        fn prop_experience_monotone_above_range(
            min in 0.0f64..10.0,
            a in 0.0f64..30.0,
            b in 0.0f64..30.0,
        ) {
            let max = min + 5.0;
            let (near, far) = if a < b { (a, b) } else { (b, a) };
            let near_score = compute_experience_score(max + near, min, Some(max), 2.0);
            let far_score = compute_experience_score(max + far, min, Some(max), 2.0);
            prop_assert!(far_score <= near_score);
            prop_assert!((0.3..=1.0).contains(&far_score));
        }

        #[test]
        fn prop_aggregate_bounded(
            s in 0.0f64..=1.0,
            k in 0.0f64..=1.0,
            e in 0.0f64..=1.0,
            p in 0.0f64..=1.0,
        ) {
            let signals = ScoringSignals {
                semantic: s,
                skill_match: k,
                experience: e,
                project_relevance: p,
            };
            let score = compute_aggregate_score(&ScoringWeights::default(), &signals);
            prop_assert!((0.0..=100.0).contains(&score));
        }

        #[test]
        fn prop_skill_match_bounded(
            must in proptest::collection::vec("[a-z]{1,6}", 0..5),
            nice in proptest::collection::vec("[a-z]{1,6}", 0..5),
            candidate in proptest::collection::vec("[a-z]{1,6}", 0..8),
        ) {
            let score = compute_skill_match_score(&must, &nice, &candidate);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
