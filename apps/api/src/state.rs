use std::sync::Arc;

use crate::config::Config;
use crate::embeddings::Embedder;
use crate::puzzle::PuzzleStages;
use crate::ranking::{ResumeChains, ScoringEngine};
use crate::retrieval::ResumeIndex;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Puzzle pipeline stages. Default: `LlmPuzzleStages`.
    pub puzzle_stages: Arc<dyn PuzzleStages>,
    /// Ranking chains. Default: `LlmResumeChains`.
    pub resume_chains: Arc<dyn ResumeChains>,
    pub embedder: Arc<dyn Embedder>,
    /// Ingest/search over the resume vector store, guarded by its own RwLock.
    pub resume_index: Arc<ResumeIndex>,
    pub scoring: ScoringEngine,
}
