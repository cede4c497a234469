// Puzzle pipeline: classify → strategy → solve → verify, with verifier-routed feedback,
// then explain. All LLM calls go through llm_client.

pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod stages;

pub use orchestrator::PuzzleOrchestrator;
pub use stages::{LlmPuzzleStages, PuzzleStages};
