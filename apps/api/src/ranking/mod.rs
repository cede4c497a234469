// Resume ranking pipeline: JD parse → two-stage retrieval → resume parse →
// multi-signal scoring → LLM evaluation → LLM rerank.

pub mod chains;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod scoring;

pub use chains::{LlmResumeChains, ResumeChains};
pub use orchestrator::RankingOrchestrator;
pub use scoring::ScoringEngine;
