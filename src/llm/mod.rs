//! Text-generation capability.
//!
//! The rest of the crate only sees [`TextGenerator`]: a prompt and a sampling
//! temperature in, generated text out.

mod openai;
#[cfg(test)]
pub(crate) mod testing;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text-generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a single user prompt.
    ///
    /// Provider failures surface as errors whose string form carries the
    /// provider's message, so callers can classify them.
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Name of the model in use.
    fn model_name(&self) -> &str;
}
