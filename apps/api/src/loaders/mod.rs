// Document loaders: resume files (PDF / DOCX) and job descriptions to plain text.

pub mod document;
pub mod text;

use thiserror::Error;

pub use document::load_document;
pub use text::{clean_text, load_jd_from_file, load_jd_from_text, truncate_chars, truncate_text};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Unsupported document format: {0}")]
    Unsupported(String),

    #[error("Failed to extract PDF text: {0}")]
    Pdf(String),

    #[error("Failed to extract DOCX text: {0}")]
    Docx(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
