//! Puzzle stages: the five LLM calls the orchestrator chains together.
//!
//! `PuzzleOrchestrator` only sees the `PuzzleStages` trait, so tests can swap in
//! a scripted implementation without any network access.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::llm_client::prompts::{bullet_list, json_system, render, NO_FEEDBACK};
use crate::llm_client::LlmClient;
use crate::puzzle::models::{Classification, Explanation, Solution, Strategy, Verification};
use crate::puzzle::prompts::*;

#[async_trait]
pub trait PuzzleStages: Send + Sync {
    async fn classify(&self, puzzle: &str, feedback: &str) -> Result<Classification, AppError>;

    async fn select_strategy(
        &self,
        puzzle: &str,
        classification: &Classification,
        feedback: &str,
    ) -> Result<Strategy, AppError>;

    async fn solve(
        &self,
        puzzle: &str,
        strategy: &Strategy,
        feedback: &str,
    ) -> Result<Solution, AppError>;

    async fn verify(
        &self,
        puzzle: &str,
        classification: &Classification,
        strategy: &Strategy,
        solution: &Solution,
        previous_feedback: &str,
    ) -> Result<Verification, AppError>;

    async fn explain(
        &self,
        puzzle: &str,
        solution: &Solution,
        verification: &Verification,
    ) -> Result<Explanation, AppError>;
}

/// Stages backed by the shared `LlmClient`, all at one configured temperature.
#[derive(Clone)]
pub struct LlmPuzzleStages {
    llm: LlmClient,
    temperature: f32,
}

impl LlmPuzzleStages {
    pub fn new(llm: LlmClient, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    async fn invoke<T: serde::de::DeserializeOwned>(
        &self,
        stage: &str,
        role: &str,
        prompt: String,
    ) -> Result<T, AppError> {
        self.llm
            .call_json::<T>(&prompt, &json_system(role), self.temperature)
            .await
            .map_err(|e| AppError::llm(&format!("{stage} stage failed"), e))
    }
}

fn or_none(feedback: &str) -> &str {
    if feedback.trim().is_empty() {
        NO_FEEDBACK
    } else {
        feedback
    }
}

#[async_trait]
impl PuzzleStages for LlmPuzzleStages {
    async fn classify(&self, puzzle: &str, feedback: &str) -> Result<Classification, AppError> {
        let prompt = render(
            CLASSIFIER_PROMPT_TEMPLATE,
            &[("puzzle", puzzle), ("feedback", or_none(feedback))],
        );
        self.invoke("classifier", CLASSIFIER_ROLE, prompt).await
    }

    async fn select_strategy(
        &self,
        puzzle: &str,
        classification: &Classification,
        feedback: &str,
    ) -> Result<Strategy, AppError> {
        let prompt = render(
            STRATEGY_PROMPT_TEMPLATE,
            &[
                ("puzzle", puzzle),
                ("puzzle_type", &classification.puzzle_type),
                ("difficulty", &classification.difficulty),
                ("feedback", or_none(feedback)),
            ],
        );
        self.invoke("strategy", STRATEGY_ROLE, prompt).await
    }

    async fn solve(
        &self,
        puzzle: &str,
        strategy: &Strategy,
        feedback: &str,
    ) -> Result<Solution, AppError> {
        let prompt = render(
            SOLVER_PROMPT_TEMPLATE,
            &[
                ("puzzle", puzzle),
                ("strategy", &strategy.description),
                ("feedback", or_none(feedback)),
            ],
        );
        self.invoke("solver", SOLVER_ROLE, prompt).await
    }

    async fn verify(
        &self,
        puzzle: &str,
        classification: &Classification,
        strategy: &Strategy,
        solution: &Solution,
        previous_feedback: &str,
    ) -> Result<Verification, AppError> {
        let constraints = bullet_list(&solution.constraints);
        let prompt = render(
            VERIFIER_PROMPT_TEMPLATE,
            &[
                ("puzzle", puzzle),
                ("puzzle_type", &classification.puzzle_type),
                ("difficulty", &classification.difficulty),
                ("strategy", &strategy.description),
                ("answer", &solution.answer),
                ("constraints", &constraints),
                ("previous_feedback", or_none(previous_feedback)),
            ],
        );
        self.invoke("verifier", VERIFIER_ROLE, prompt).await
    }

    async fn explain(
        &self,
        puzzle: &str,
        solution: &Solution,
        verification: &Verification,
    ) -> Result<Explanation, AppError> {
        let constraints = bullet_list(&solution.constraints);
        let summary = verification
            .verification_summary
            .as_deref()
            .unwrap_or("Verified");
        let prompt = render(
            EXPLAINER_PROMPT_TEMPLATE,
            &[
                ("puzzle", puzzle),
                ("answer", &solution.answer),
                ("constraints", &constraints),
                ("verification_summary", summary),
            ],
        );
        self.invoke("explainer", EXPLAINER_ROLE, prompt).await
    }
}
