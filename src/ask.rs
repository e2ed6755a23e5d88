//! Question answering over the document library.
//!
//! The context window is deliberately naive: every document is split into
//! word windows, the first `context_chunks` windows (in library order) are
//! joined with a space, and the result is placed ahead of the question.

use std::path::PathBuf;

use crate::chunk::split_words;
use crate::config::{ChunkingConfig, Config};
use crate::error::{Error, Result};
use crate::library::{self, DocumentLibrary, LoadedDocument};
use crate::llm::{GenerateClient, LanguageModel, ModelReply};

/// Assemble the model prompt.
pub fn build_prompt(context: &str, query: &str) -> String {
    format!("Context: {}\n\nQuery: {}\n\nResponse:", context, query)
}

/// Split every document and join the first `top_n` chunks.
pub fn build_context(
    documents: &[LoadedDocument],
    chunking: &ChunkingConfig,
    top_n: usize,
) -> Result<String> {
    let mut chunks: Vec<String> = Vec::new();
    for doc in documents {
        if chunks.len() >= top_n {
            break;
        }
        chunks.extend(split_words(&doc.content, chunking.chunk_size, chunking.overlap)?);
    }
    chunks.truncate(top_n);
    Ok(chunks.join(" "))
}

pub struct DocumentQa<'a> {
    model: &'a dyn LanguageModel,
    chunking: &'a ChunkingConfig,
}

impl<'a> DocumentQa<'a> {
    pub fn new(model: &'a dyn LanguageModel, chunking: &'a ChunkingConfig) -> Self {
        Self { model, chunking }
    }

    pub async fn answer(&self, documents: &[LoadedDocument], query: &str) -> Result<ModelReply> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("query must not be empty".to_string()));
        }

        let context = build_context(documents, self.chunking, self.chunking.context_chunks)?;
        tracing::debug!(
            documents = documents.len(),
            context_words = context.split_whitespace().count(),
            "built document context"
        );
        Ok(self.model.generate(&build_prompt(&context, query)).await)
    }
}

/// CLI entry point for `justifi ask`.
///
/// With `pdfs` the given files form the context; otherwise the configured
/// document library does.
pub async fn run_ask(config: &Config, query: &str, pdfs: Vec<PathBuf>) -> anyhow::Result<()> {
    let documents = if pdfs.is_empty() {
        let library = DocumentLibrary::new(&config.documents.dir);
        tokio::task::spawn_blocking(move || library.load_all()).await??
    } else {
        tokio::task::spawn_blocking(move || library::load_paths(&pdfs)).await?
    };

    let model = GenerateClient::new(&config.model)?;
    let reply = DocumentQa::new(&model, &config.chunking)
        .answer(&documents, query)
        .await?;

    println!("Chatbot Response:");
    println!("{}", reply.display_text());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn doc(title: &str, content: &str) -> LoadedDocument {
        LoadedDocument {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn chunking(size: usize, overlap: usize, n: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: size,
            overlap,
            context_chunks: n,
        }
    }

    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn generate(&self, prompt: &str) -> ModelReply {
            self.prompts.lock().unwrap().push(prompt.to_string());
            ModelReply::ok("The statute applies.")
        }
    }

    #[test]
    fn test_prompt_format() {
        assert_eq!(
            build_prompt("ctx", "What is bail?"),
            "Context: ctx\n\nQuery: What is bail?\n\nResponse:"
        );
    }

    #[test]
    fn test_context_takes_first_chunks_across_documents() {
        let docs = vec![doc("a.pdf", "a1 a2 a3 a4"), doc("b.pdf", "b1 b2 b3")];
        let context = build_context(&docs, &chunking(2, 0, 3), 3).unwrap();
        assert_eq!(context, "a1 a2 a3 a4 b1 b2");
    }

    #[test]
    fn test_context_empty_library() {
        assert_eq!(build_context(&[], &chunking(512, 50, 5), 5).unwrap(), "");
    }

    #[tokio::test]
    async fn test_answer_sends_prompt_to_model() {
        let model = RecordingModel {
            prompts: Mutex::new(Vec::new()),
        };
        let cfg = chunking(3, 1, 2);
        let qa = DocumentQa::new(&model, &cfg);
        let docs = vec![doc("lease.pdf", "a b c d e")];

        let reply = qa.answer(&docs, "  Is this valid?  ").await.unwrap();
        assert_eq!(reply.response.as_deref(), Some("The statute applies."));

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(
            *prompts,
            vec!["Context: a b c c d e\n\nQuery: Is this valid?\n\nResponse:".to_string()]
        );
    }

    #[tokio::test]
    async fn test_answer_rejects_empty_query() {
        let model = RecordingModel {
            prompts: Mutex::new(Vec::new()),
        };
        let cfg = chunking(512, 50, 5);
        let qa = DocumentQa::new(&model, &cfg);
        assert!(matches!(
            qa.answer(&[], "   ").await,
            Err(Error::Validation(_))
        ));
        assert!(model.prompts.lock().unwrap().is_empty());
    }
}
