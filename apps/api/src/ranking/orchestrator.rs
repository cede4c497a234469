//! Ranking Orchestrator: JD in, ranked shortlist out.
//!
//! Steps:
//! 1. Parse the JD
//! 2. Two-stage search of the stored resumes with the raw JD text
//! 3. Parse each hit into a candidate profile
//! 4. Score all candidates (one embedding batch)
//! 5. Evaluate each candidate
//! 6. Sort by aggregate, then apply the reranker's order

use tracing::{info, warn};
use uuid::Uuid;

use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::ranking::chains::ResumeChains;
use crate::ranking::models::{RankedCandidate, RankingResponse, RerankedResult};
use crate::ranking::scoring::ScoringEngine;
use crate::retrieval::ResumeIndex;

pub struct RankingOrchestrator<'a> {
    chains: &'a dyn ResumeChains,
    embedder: &'a dyn Embedder,
    index: &'a ResumeIndex,
    scoring: &'a ScoringEngine,
}

impl<'a> RankingOrchestrator<'a> {
    pub fn new(
        chains: &'a dyn ResumeChains,
        embedder: &'a dyn Embedder,
        index: &'a ResumeIndex,
        scoring: &'a ScoringEngine,
    ) -> Self {
        Self {
            chains,
            embedder,
            index,
            scoring,
        }
    }

    pub async fn rank(
        &self,
        jd_text: &str,
        top_k_stage1: usize,
        top_k_final: usize,
    ) -> Result<RankingResponse, AppError> {
        if jd_text.trim().is_empty() {
            return Err(AppError::Validation(
                "job description cannot be empty".to_string(),
            ));
        }

        let jd = self.chains.parse_jd(jd_text).await?;
        info!(
            "Parsed JD: role='{}', {} must-have skills",
            jd.role,
            jd.must_have_skills.len()
        );

        let hits = self
            .index
            .search_resumes(jd_text, top_k_stage1, top_k_final)
            .await?;
        if hits.is_empty() {
            info!("No resumes matched; returning empty ranking");
            return Ok(RankingResponse {
                jd_summary: jd.summary,
                total_candidates: 0,
                rankings: Vec::new(),
            });
        }

        let mut parsed = Vec::with_capacity(hits.len());
        for (idx, hit) in hits.iter().enumerate() {
            let candidate_id = new_candidate_id(idx + 1);
            let resume = self.chains.parse_resume(&hit.text, &candidate_id).await?;
            info!("Parsed {} ({})", resume.name, hit.filename);
            parsed.push(resume);
        }

        let scores = self.scoring.score_all(self.embedder, &jd, &parsed).await?;

        let mut candidates = Vec::with_capacity(parsed.len());
        for ((resume, score), hit) in parsed.iter().zip(&scores).zip(&hits) {
            let evaluation = self.chains.evaluate(&jd, resume, score).await?;
            info!(
                "{}: semantic={:.2}, skill={:.2}, exp={:.2}, project={:.2} -> aggregate={:.2}",
                resume.name,
                score.signals.semantic,
                score.signals.skill_match,
                score.signals.experience,
                score.signals.project_relevance,
                score.aggregate
            );
            candidates.push(RankedCandidate {
                candidate_id: resume.candidate_id.clone(),
                name: resume.name.clone(),
                filename: hit.filename.clone(),
                rank: 0,
                final_score: score.aggregate,
                signals: score.signals,
                evaluation: Some(evaluation),
                reason: String::new(),
            });
        }

        candidates.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

        let reranked = self.chains.rerank(&jd, &candidates).await?;
        let rankings = apply_reranking(candidates, reranked);

        Ok(RankingResponse {
            jd_summary: jd.summary,
            total_candidates: rankings.len(),
            rankings,
        })
    }
}

/// `c{n}_` followed by six hex characters.
pub fn new_candidate_id(n: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("c{n}_{}", &hex[..6])
}

/// Orders `candidates` (already sorted by aggregate) by the reranker's ranks.
///
/// Unknown or repeated ids are ignored; candidates the reranker left out keep
/// their aggregate order after the reranked ones. Ranks are renumbered 1..=N.
pub fn apply_reranking(
    candidates: Vec<RankedCandidate>,
    mut reranked: Vec<RerankedResult>,
) -> Vec<RankedCandidate> {
    reranked.sort_by_key(|r| r.rank);

    let mut remaining: Vec<Option<RankedCandidate>> = candidates.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    for result in reranked {
        let slot = remaining
            .iter_mut()
            .find(|c| matches!(c, Some(c) if c.candidate_id == result.candidate_id));
        match slot.and_then(Option::take) {
            Some(mut candidate) => {
                candidate.reason = result.reason;
                ordered.push(candidate);
            }
            None => warn!(
                "Reranker returned unknown or duplicate candidate id '{}'; ignoring",
                result.candidate_id
            ),
        }
    }

    let omitted: Vec<RankedCandidate> = remaining.into_iter().flatten().collect();
    if !omitted.is_empty() {
        warn!(
            "Reranker omitted {} candidates; appending in score order",
            omitted.len()
        );
    }
    ordered.extend(omitted);

    for (i, candidate) in ordered.iter_mut().enumerate() {
        candidate.rank = i as u32 + 1;
    }
    ordered
}
