//! Text generation capability trait.
//!
//! The answer chain only needs `prompt -> text`; concrete chat/completion
//! backends live in the `docintel` app crate.

use anyhow::Result;
use async_trait::async_trait;

/// Produces an answer from a fully assembled prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4"`).
    fn model_name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}
