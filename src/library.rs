//! Folder of uploaded legal PDFs.
//!
//! Uploads are written into the configured directory and every `*.pdf` in
//! it becomes part of the question-answering context, so documents persist
//! across sessions. Files that cannot be read or parsed are skipped with a
//! warning rather than failing the whole request.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::extract::{extract_pdf, looks_like_pdf};

/// Extracted text of one PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct DocumentLibrary {
    dir: PathBuf,
}

impl DocumentLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store an uploaded file under its base name, replacing any file of the
    /// same name.
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = validate_upload(file_name, bytes)?;
        self.write(&name, bytes)
    }

    /// Store a batch of uploads. Every upload is checked before any is
    /// written, so a rejected batch leaves the library untouched.
    pub fn save_all(&self, uploads: &[(String, Vec<u8>)]) -> Result<Vec<PathBuf>> {
        let names = uploads
            .iter()
            .map(|(name, bytes)| validate_upload(name, bytes))
            .collect::<Result<Vec<String>>>()?;

        names
            .iter()
            .zip(uploads)
            .map(|(name, (_, bytes))| self.write(name, bytes))
            .collect()
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, bytes)?;
        tracing::info!(file = %path.display(), bytes = bytes.len(), "saved uploaded document");
        Ok(path)
    }

    /// Every PDF in the library, ordered by file name. A missing directory
    /// is an empty library.
    pub fn load_all(&self) -> Result<Vec<LoadedDocument>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_pdf_extension(p))
            .collect();
        paths.sort();

        Ok(load_paths(&paths))
    }
}

/// Load specific PDF files, skipping unreadable ones.
pub fn load_paths(paths: &[PathBuf]) -> Vec<LoadedDocument> {
    paths.iter().filter_map(|p| load_one(p)).collect()
}

fn load_one(path: &Path) -> Option<LoadedDocument> {
    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "could not read document");
            return None;
        }
    };

    match extract_pdf(&bytes) {
        Ok(content) => Some(LoadedDocument { title, content }),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "skipping document");
            None
        }
    }
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Sanitized file name of an acceptable upload.
fn validate_upload(file_name: &str, bytes: &[u8]) -> Result<String> {
    let name = sanitize_file_name(file_name)?;
    if !looks_like_pdf(bytes) {
        return Err(Error::Validation(format!("{} is not a PDF", name)));
    }
    Ok(name)
}

/// Keep only the final path component and require a `.pdf` extension.
fn sanitize_file_name(file_name: &str) -> Result<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(Error::Validation("upload has no file name".to_string()));
    }
    if !has_pdf_extension(Path::new(base)) {
        return Err(Error::Validation(format!("{} is not a .pdf file", base)));
    }
    Ok(base.to_string())
}
