//! Prompt assembly and citation formatting.
//!
//! Retrieved chunks become numbered context blocks, each tagged with a
//! `[Source: filename, Page: N]` marker the model is asked to reuse in its
//! answer. The same chunks become the [`Citation`]s attached to the answer.

use crate::models::{Citation, ScoredChunk, Turn};

/// Characters of chunk text kept in a citation preview.
pub const PREVIEW_CHARS: usize = 200;

const INSTRUCTIONS: &str = "You are an AI assistant helping users understand their documents.
Use the following pieces of context to answer the question at the end.
If you don't know the answer based on the context, just say that you don't know, don't try to make up an answer.
Always cite the source document and page number when providing information.";

/// Builds the grounded answer prompt.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render retrieved chunks as numbered, source-tagged context blocks.
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "[{}] [Source: {}, Page: {}]\n{}",
                    i + 1,
                    c.filename,
                    c.page,
                    c.text.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    /// Render prior turns, oldest first. Empty history renders as nothing.
    pub fn build_history(history: &[Turn]) -> String {
        if history.is_empty() {
            return String::new();
        }
        let turns = history
            .iter()
            .map(|t| format!("User: {}\nAssistant: {}", t.question.trim(), t.answer.trim()))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("Conversation so far:\n{}\n\n", turns)
    }

    /// Full prompt: instructions, context, optional history, question.
    pub fn build(question: &str, chunks: &[ScoredChunk], history: &[Turn]) -> String {
        format!(
            "{instructions}\n\nContext:\n{context}\n\n{history}Question: {question}\n\nProvide a detailed answer with citations in the format [Source: filename, Page: X]:",
            instructions = INSTRUCTIONS,
            context = Self::build_context(chunks),
            history = Self::build_history(history),
            question = question.trim(),
        )
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, with `...` appended when cut.
pub fn content_preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut preview: String = trimmed.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Citations for the retrieved chunks, one per distinct (source, page).
///
/// Retrieval order is preserved; the first (highest scoring) chunk of each
/// page supplies the preview.
pub fn format_sources(chunks: &[ScoredChunk]) -> Vec<Citation> {
    let mut seen: Vec<(&str, i64)> = Vec::new();
    let mut citations = Vec::new();
    for c in chunks {
        let key = (c.filename.as_str(), c.page);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        citations.push(Citation {
            document_id: c.document_id.clone(),
            source: c.filename.clone(),
            page: c.page,
            chunk_id: c.chunk_id.clone(),
            score: c.score,
            content_preview: content_preview(&c.text),
        });
    }
    citations
}
