//! Resume index: ingestion and two-stage search over the vector store.
//!
//! Writers (ingest, clear) take the index-wide write lock; searches and counts
//! share the read lock, so a search never observes a half-ingested folder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::loaders::{clean_text, load_document, truncate_chars};
use crate::retrieval::two_stage::TwoStageRetriever;
use crate::retrieval::vector_store::{ResumePayload, ResumeStore};

/// Characters of cleaned resume text kept in the stored payload.
pub const PAYLOAD_TEXT_CHARS: usize = 5000;
const RESUME_EXTENSIONS: [&str; 2] = ["pdf", "docx"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeHit {
    pub filename: String,
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    pub ingested: usize,
    /// Files that could not be read or yielded no text.
    pub skipped: Vec<String>,
}

struct LoadedResume {
    filename: String,
    filepath: String,
    text: String,
}

pub struct ResumeIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ResumeStore>,
    retriever: TwoStageRetriever,
    lock: RwLock<()>,
}

impl ResumeIndex {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn ResumeStore>) -> Self {
        Self {
            embedder,
            store,
            retriever: TwoStageRetriever::default(),
            lock: RwLock::new(()),
        }
    }

    #[cfg(test)]
    pub fn with_retriever(mut self, retriever: TwoStageRetriever) -> Self {
        self.retriever = retriever;
        self
    }

    /// Loads every `*.pdf` / `*.docx` in `folder`, embeds them in one batch and upserts.
    /// Unreadable files are logged and skipped; a missing folder is an error.
    pub async fn ingest_folder(&self, folder: &Path) -> Result<IngestSummary, AppError> {
        if !folder.is_dir() {
            return Err(AppError::NotFound(format!(
                "Resume folder not found: {}",
                folder.display()
            )));
        }

        let files = resume_files(folder).await?;
        if files.is_empty() {
            info!("No resume files found in {}", folder.display());
            return Ok(IngestSummary::default());
        }

        let mut summary = IngestSummary::default();
        let mut loaded = Vec::with_capacity(files.len());

        for path in files {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match load_resume(&path, &filename).await {
                Ok(text) if !text.is_empty() => loaded.push(LoadedResume {
                    filename,
                    filepath: path.display().to_string(),
                    text,
                }),
                Ok(_) => {
                    warn!("Skipping {filename}: no extractable text");
                    summary.skipped.push(filename);
                }
                Err(e) => {
                    warn!("Error loading {filename}: {e}");
                    summary.skipped.push(filename);
                }
            }
        }

        if loaded.is_empty() {
            return Ok(summary);
        }

        let texts: Vec<String> = loaded.iter().map(|r| r.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        let _guard = self.lock.write().await;
        self.store.ensure_collection().await?;
        for (resume, vector) in loaded.into_iter().zip(vectors) {
            self.upsert(resume, vector).await?;
            summary.ingested += 1;
        }

        info!(
            "Ingested {} resumes from {} ({} skipped)",
            summary.ingested,
            folder.display(),
            summary.skipped.len()
        );
        Ok(summary)
    }

    /// Ingests a single uploaded file. Load failures are returned, not skipped.
    pub async fn ingest_document(&self, filename: &str, bytes: &[u8]) -> Result<(), AppError> {
        let text = clean_text(&load_document(bytes, filename)?);
        if text.is_empty() {
            return Err(AppError::Validation(format!(
                "{filename} contains no extractable text"
            )));
        }

        let vector = self.embedder.embed_one(&text).await?;

        let _guard = self.lock.write().await;
        self.store.ensure_collection().await?;
        self.upsert(
            LoadedResume {
                filename: filename.to_string(),
                filepath: filename.to_string(),
                text,
            },
            vector,
        )
        .await?;

        info!("Ingested uploaded resume {filename}");
        Ok(())
    }

    /// Two-stage search of the stored resumes against the job description text.
    pub async fn search_resumes(
        &self,
        jd_text: &str,
        top_k_stage1: usize,
        top_k_final: usize,
    ) -> Result<Vec<ResumeHit>, AppError> {
        let _guard = self.lock.read().await;

        if self.store.count().await? == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_one(jd_text).await?;
        let records = self.store.scroll(None).await?;
        let corpus: Vec<(String, &[f32])> = records
            .iter()
            .map(|r| (r.filename.clone(), r.vector.as_slice()))
            .collect();
        let texts: HashMap<&str, &str> = records
            .iter()
            .map(|r| (r.filename.as_str(), r.text.as_str()))
            .collect();

        let hits = self
            .retriever
            .search(&query, &corpus, top_k_stage1, top_k_final)
            .into_iter()
            .map(|(filename, score)| ResumeHit {
                filename: filename.to_string(),
                text: texts.get(filename).copied().unwrap_or_default().to_string(),
                score,
            })
            .collect::<Vec<_>>();

        info!(
            "Resume search: {} stored, stage 1 k={top_k_stage1}, returned {}",
            records.len(),
            hits.len()
        );
        Ok(hits)
    }

    pub async fn count(&self) -> Result<u64, AppError> {
        let _guard = self.lock.read().await;
        Ok(self.store.count().await?)
    }

    pub async fn get_resume_text(&self, filename: &str) -> Result<Option<String>, AppError> {
        let _guard = self.lock.read().await;
        Ok(self.store.get_resume_text(filename).await?)
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        let _guard = self.lock.write().await;
        self.store.clear().await?;
        Ok(())
    }

    async fn upsert(&self, resume: LoadedResume, vector: Vec<f32>) -> Result<(), AppError> {
        let payload = ResumePayload {
            text: truncate_chars(&resume.text, PAYLOAD_TEXT_CHARS).to_string(),
            filename: resume.filename.clone(),
            filepath: resume.filepath,
        };
        self.store.upsert(&resume.filename, vector, payload).await?;
        Ok(())
    }
}

/// Resume files in `folder`, sorted by name.
async fn resume_files(folder: &Path) -> Result<Vec<PathBuf>, AppError> {
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let mut files = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::Internal(e.into()))?
    {
        let path = entry.path();
        let is_resume = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| RESUME_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_resume && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

async fn load_resume(path: &Path, filename: &str) -> Result<String, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(crate::loaders::LoaderError::from)?;
    let filename = filename.to_string();
    let raw = tokio::task::spawn_blocking(move || load_document(&bytes, &filename))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(clean_text(&raw))
}
