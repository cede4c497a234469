//! Axum route handlers for the Puzzle API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::puzzle::models::FinalResult;
use crate::puzzle::orchestrator::PuzzleOrchestrator;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SolveRequest {
    pub puzzle: String,
    /// Overrides `MAX_RETRIES` for this run.
    pub max_retries: Option<u32>,
}

/// POST /api/v1/puzzles/solve
///
/// Runs the full retry-with-feedback pipeline. Always returns the last attempt's
/// explained answer; `verified` reports whether the final verification passed.
pub async fn handle_solve(
    State(state): State<AppState>,
    Json(request): Json<SolveRequest>,
) -> Result<Json<FinalResult>, AppError> {
    if request.puzzle.trim().is_empty() {
        return Err(AppError::Validation("puzzle cannot be empty".to_string()));
    }

    let max_retries = request.max_retries.unwrap_or(state.config.max_retries);
    let orchestrator = PuzzleOrchestrator::new(
        state.puzzle_stages.as_ref(),
        max_retries,
        state.config.stage_failure_policy,
    );

    let result = orchestrator.solve(&request.puzzle).await?;
    Ok(Json(result))
}
