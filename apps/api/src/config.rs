use std::str::FromStr;

use anyhow::{Context, Result};

use crate::puzzle::orchestrator::StageFailurePolicy;
use crate::ranking::scoring::ScoringWeights;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or weights are invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm_model: String,
    /// Only required by commands that touch the resume vector store.
    pub database_url: Option<String>,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub max_retries: u32,
    pub temperature: f32,
    pub stage_failure_policy: StageFailurePolicy,
    pub scoring_weights: ScoringWeights,
    pub resume_folder: String,
    pub top_k_stage1: usize,
    pub top_k_final: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let scoring_weights = ScoringWeights {
            semantic: parse_env("SCORE_SEMANTIC_WEIGHT", 0.40)?,
            skill: parse_env("SCORE_SKILL_WEIGHT", 0.30)?,
            experience: parse_env("SCORE_EXPERIENCE_WEIGHT", 0.20)?,
            project: parse_env("SCORE_PROJECT_WEIGHT", 0.10)?,
        };
        scoring_weights.validate()?;

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: std::env::var("LLM_MODEL")
                .unwrap_or_else(|_| crate::llm_client::DEFAULT_MODEL.to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            embedding_url: std::env::var("EMBEDDING_URL")
                .unwrap_or_else(|_| "http://localhost:8081/v1".to_string()),
            embedding_api_key: std::env::var("EMBEDDING_API_KEY").ok(),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| crate::embeddings::DEFAULT_MODEL.to_string()),
            max_retries: parse_env("MAX_RETRIES", 3)?,
            temperature: parse_env("TEMPERATURE", 0.3)?,
            stage_failure_policy: parse_env(
                "PUZZLE_STAGE_FAILURE_POLICY",
                StageFailurePolicy::Abort,
            )?,
            scoring_weights,
            resume_folder: std::env::var("RESUME_FOLDER")
                .unwrap_or_else(|_| "./resumes".to_string()),
            top_k_stage1: parse_env("TOP_K_STAGE1", crate::retrieval::DEFAULT_TOP_K_STAGE1)?,
            top_k_final: parse_env("TOP_K_FINAL", crate::retrieval::DEFAULT_TOP_K_FINAL)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Returns the database URL, failing for commands that need the vector store.
    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("Required environment variable 'DATABASE_URL' is not set")
    }

    /// Defaults with no database and an unreachable embedder.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Config {
            anthropic_api_key: "test".into(),
            llm_model: "test-model".into(),
            database_url: None,
            embedding_url: "http://localhost:0/v1".into(),
            embedding_api_key: None,
            embedding_model: "test-embedder".into(),
            max_retries: 3,
            temperature: 0.3,
            stage_failure_policy: StageFailurePolicy::Abort,
            scoring_weights: ScoringWeights::default(),
            resume_folder: "./does-not-exist".into(),
            top_k_stage1: 7,
            top_k_final: 4,
            port: 0,
            rust_log: "info".into(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
