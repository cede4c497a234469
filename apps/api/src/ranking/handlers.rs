//! Axum route handlers for the Ranking API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::loaders::load_jd_from_text;
use crate::ranking::models::RankingResponse;
use crate::ranking::orchestrator::RankingOrchestrator;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub jd_text: String,
    pub top_k_stage1: Option<usize>,
    pub top_k_final: Option<usize>,
}

/// POST /api/v1/rankings
///
/// Searches the ingested resumes for the JD and returns the reranked shortlist.
/// An empty store yields an empty `rankings` list, not an error.
pub async fn handle_rank(
    State(state): State<AppState>,
    Json(request): Json<RankRequest>,
) -> Result<Json<RankingResponse>, AppError> {
    let jd_text = load_jd_from_text(&request.jd_text);
    let top_k_stage1 = request.top_k_stage1.unwrap_or(state.config.top_k_stage1);
    let top_k_final = request.top_k_final.unwrap_or(state.config.top_k_final);

    let orchestrator = RankingOrchestrator::new(
        state.resume_chains.as_ref(),
        state.embedder.as_ref(),
        state.resume_index.as_ref(),
        &state.scoring,
    );

    let response = orchestrator
        .rank(&jd_text, top_k_stage1, top_k_final)
        .await?;
    Ok(Json(response))
}
