pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::puzzle::handlers as puzzle;
use crate::ranking::handlers as ranking;
use crate::retrieval::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Puzzle API
        .route("/api/v1/puzzles/solve", post(puzzle::handle_solve))
        // Resume store API
        .route("/api/v1/resumes", delete(resumes::handle_clear))
        .route("/api/v1/resumes/ingest", post(resumes::handle_ingest))
        .route("/api/v1/resumes/upload", post(resumes::handle_upload))
        .route("/api/v1/resumes/count", get(resumes::handle_count))
        .route("/api/v1/resumes/:filename", get(resumes::handle_get_text))
        // Ranking API
        .route("/api/v1/rankings", post(ranking::handle_rank))
        .with_state(state)
}
