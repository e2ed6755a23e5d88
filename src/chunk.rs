//! Overlapping word-window chunker.
//!
//! Splits document text on whitespace and emits windows of up to
//! `chunk_size` words. Consecutive windows start `chunk_size - overlap`
//! words apart, so each window repeats the last `overlap` words of the
//! previous one. The final window may be shorter.
//!
//! Chunks are transient: they exist only while one prompt is being built.

use crate::error::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_OVERLAP: usize = 50;

/// Split `text` into overlapping windows of whitespace-separated words.
///
/// Fails with [`Error::Validation`] when `chunk_size` is zero or `overlap`
/// is not smaller than `chunk_size` (the stride would not advance).
pub fn split_words(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(Error::Validation("chunk_size must be > 0".to_string()));
    }
    if overlap >= chunk_size {
        return Err(Error::Validation(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let stride = chunk_size - overlap;

    let chunks = (0..words.len())
        .step_by(stride)
        .map(|start| {
            let end = (start + chunk_size).min(words.len());
            words[start..end].join(" ")
        })
        .collect();

    Ok(chunks)
}
