//! Text processing for TTS: markup extraction, line cleaning, and chunking.

pub mod chunker;
mod cleaner;
pub mod markdown;

pub use chunker::{Chunk, DEFAULT_CHUNK_BOUND, Line, chunk};
pub use markdown::{DEFAULT_TAB_WIDTH, extract_document};

use thiserror::Error;

/// Errors produced while turning a document into chunks.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Document is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("Chunk size must be a positive integer, got {0}")]
    InvalidBound(usize),

    #[error("Tab width must be a positive integer")]
    InvalidTabWidth,
}
