//! LLM chains used by the ranking pipeline: JD parser, resume parser,
//! per-candidate evaluator and final reranker.
//!
//! `AppState` holds an `Arc<dyn ResumeChains>` so the orchestrator can be
//! exercised against a scripted implementation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::errors::AppError;
use crate::llm_client::prompts::{json_system, render};
use crate::llm_client::LlmClient;
use crate::loaders::truncate_text;
use crate::ranking::models::{
    CandidateEvaluation, ParsedJD, ParsedResume, RankedCandidate, RerankedResult, RerankerOutput,
};
use crate::ranking::prompts::*;
use crate::ranking::scoring::CandidateScore;

const PARSER_TEMPERATURE: f32 = 0.0;
const EVALUATOR_TEMPERATURE: f32 = 0.3;
const RERANKER_TEMPERATURE: f32 = 0.2;
/// Longest document text placed in a parser prompt.
const MAX_PROMPT_TEXT_CHARS: usize = 8000;

#[async_trait]
pub trait ResumeChains: Send + Sync {
    async fn parse_jd(&self, jd_text: &str) -> Result<ParsedJD, AppError>;

    /// Parses resume text; the result carries `candidate_id` and the input as `raw_text`.
    async fn parse_resume(
        &self,
        resume_text: &str,
        candidate_id: &str,
    ) -> Result<ParsedResume, AppError>;

    async fn evaluate(
        &self,
        jd: &ParsedJD,
        candidate: &ParsedResume,
        score: &CandidateScore,
    ) -> Result<CandidateEvaluation, AppError>;

    async fn rerank(
        &self,
        jd: &ParsedJD,
        candidates: &[RankedCandidate],
    ) -> Result<Vec<RerankedResult>, AppError>;
}

#[derive(Clone)]
pub struct LlmResumeChains {
    llm: LlmClient,
}

impl LlmResumeChains {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        chain: &str,
        role: &str,
        prompt: String,
        temperature: f32,
    ) -> Result<T, AppError> {
        self.llm
            .call_json::<T>(&prompt, &json_system(role), temperature)
            .await
            .map_err(|e| AppError::llm(&format!("{chain} failed"), e))
    }
}

#[async_trait]
impl ResumeChains for LlmResumeChains {
    async fn parse_jd(&self, jd_text: &str) -> Result<ParsedJD, AppError> {
        let jd_text = truncate_text(jd_text, MAX_PROMPT_TEXT_CHARS);
        let prompt = render(JD_PARSER_PROMPT_TEMPLATE, &[("jd_text", jd_text.as_str())]);
        self.invoke("JD parsing", JD_PARSER_ROLE, prompt, PARSER_TEMPERATURE)
            .await
    }

    async fn parse_resume(
        &self,
        resume_text: &str,
        candidate_id: &str,
    ) -> Result<ParsedResume, AppError> {
        let prompt_text = truncate_text(resume_text, MAX_PROMPT_TEXT_CHARS);
        let prompt = render(
            RESUME_PARSER_PROMPT_TEMPLATE,
            &[("resume_text", prompt_text.as_str())],
        );
        let mut parsed: ParsedResume = self
            .invoke(
                "Resume parsing",
                RESUME_PARSER_ROLE,
                prompt,
                PARSER_TEMPERATURE,
            )
            .await?;
        parsed.candidate_id = candidate_id.to_string();
        parsed.raw_text = resume_text.to_string();
        Ok(parsed)
    }

    async fn evaluate(
        &self,
        jd: &ParsedJD,
        candidate: &ParsedResume,
        score: &CandidateScore,
    ) -> Result<CandidateEvaluation, AppError> {
        let prompt = evaluator_prompt(jd, candidate, score);
        self.invoke(
            "Candidate evaluation",
            EVALUATOR_ROLE,
            prompt,
            EVALUATOR_TEMPERATURE,
        )
        .await
    }

    async fn rerank(
        &self,
        jd: &ParsedJD,
        candidates: &[RankedCandidate],
    ) -> Result<Vec<RerankedResult>, AppError> {
        let prompt = render(
            RERANKER_PROMPT_TEMPLATE,
            &[
                ("role", &jd.role),
                ("must_have_skills", &jd.must_have_skills.join(", ")),
                ("domain", &jd.domain),
                ("min_experience", &jd.min_experience_years.to_string()),
                ("candidates_summary", &candidates_summary(candidates)),
            ],
        );
        let output: RerankerOutput = self
            .invoke("Reranking", RERANKER_ROLE, prompt, RERANKER_TEMPERATURE)
            .await?;
        Ok(output.rankings)
    }
}

fn evaluator_prompt(jd: &ParsedJD, candidate: &ParsedResume, score: &CandidateScore) -> String {
    let project_names = candidate
        .projects
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let s = &score.signals;

    render(
        EVALUATOR_PROMPT_TEMPLATE,
        &[
            ("role", &jd.role),
            ("must_have_skills", &jd.must_have_skills.join(", ")),
            ("nice_to_have_skills", &jd.nice_to_have_skills.join(", ")),
            ("min_experience", &jd.min_experience_years.to_string()),
            ("domain", &jd.domain),
            ("candidate_name", &candidate.name),
            ("candidate_skills", &candidate.skills.join(", ")),
            ("candidate_experience", &candidate.experience_years.to_string()),
            ("candidate_projects", &project_names),
            ("candidate_education", &candidate.education.join(", ")),
            ("semantic_score", &format!("{:.2}", s.semantic)),
            ("skill_score", &format!("{:.2}", s.skill_match)),
            ("experience_score", &format!("{:.2}", s.experience)),
            ("project_score", &format!("{:.2}", s.project_relevance)),
            ("aggregate_score", &format!("{:.2}", score.aggregate)),
        ],
    )
}

/// One block per candidate: name and id, aggregate, signals, evaluation summary.
fn candidates_summary(candidates: &[RankedCandidate]) -> String {
    candidates
        .iter()
        .map(|c| {
            let fit = c
                .evaluation
                .as_ref()
                .map(|e| e.fit_summary.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("N/A");
            format!(
                "- {} (ID: {})\n  Score: {:.1}/100\n  Signals: Semantic={:.2}, Skill={:.2}, Exp={:.2}, Project={:.2}\n  Evaluation: {}",
                c.name,
                c.candidate_id,
                c.final_score,
                c.signals.semantic,
                c.signals.skill_match,
                c.signals.experience,
                c.signals.project_relevance,
                fit
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
