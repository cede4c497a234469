// Resume retrieval: Matryoshka similarity math, the two-stage retriever, the
// vector store and the ingest/search index that ties them to the embedder.

pub mod handlers;
pub mod resume_index;
pub mod similarity;
pub mod two_stage;
pub mod vector_store;

/// Full embedding width stored per resume.
pub const FULL_DIMS: usize = 768;
/// Prefix width scored in stage 1.
pub const PREFILTER_DIMS: usize = 256;
pub const DEFAULT_TOP_K_STAGE1: usize = 7;
pub const DEFAULT_TOP_K_FINAL: usize = 4;
pub const COLLECTION_NAME: &str = "resumes";

pub use resume_index::ResumeIndex;
#[cfg(test)]
pub use vector_store::InMemoryResumeStore;
pub use vector_store::{PgResumeStore, ResumeStore};
