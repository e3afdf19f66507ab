//! Deterministic stand-ins for the capability traits, used by unit tests.

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::Embedder;
use crate::error::RagError;
use crate::generation::Generator;

pub const KEYWORD_DIMS: usize = 64;

/// Bag-of-words embedder: each lowercase alphanumeric word bumps one
/// FNV-1a bucket.
pub struct KeywordEmbedder;

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; KEYWORD_DIMS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hash: u32 = 0x811c9dc5;
        for b in word.to_lowercase().bytes() {
            hash ^= b as u32;
            hash = hash.wrapping_mul(0x01000193);
        }
        v[hash as usize % KEYWORD_DIMS] += 1.0;
    }
    v
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keyword-test"
    }

    fn dims(&self) -> usize {
        KEYWORD_DIMS
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }
}

/// Returns the prompt it was given.
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    fn model_name(&self) -> &str {
        "echo-test"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn model_name(&self) -> &str {
        "failing-test"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(RagError::provider("503 Service Unavailable").into())
    }
}
