//! Generative text service boundary.
//!
//! The authoring pipeline treats the generative service as an untrusted text
//! source. [`TextGenerator`] is the call contract the pipeline depends on;
//! [`GeminiClient`] implements it over the Gemini `generateContent` API.

mod gemini;

use std::future::Future;

use lessonforge_shared::{GenerationConfig, Result};
use serde::{Deserialize, Serialize};

pub use gemini::{GeminiClient, GeminiOptions};

// ---------------------------------------------------------------------------
// Call contract
// ---------------------------------------------------------------------------

/// Sampling parameters sent with a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    /// Upper bound on output length, in tokens.
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: Some(config.top_p),
            top_k: Some(config.top_k),
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// A prompt plus its sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub params: GenerationParams,
}

/// Raw text returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Untrusted text; may wrap the payload in prose or code fences.
    pub text: String,
    /// Model identifier reported for the call.
    pub model: String,
    pub tokens_in: u64,
    pub tokens_out: u64,
}

/// Sends prompts to a text-generation service.
pub trait TextGenerator: Send + Sync {
    /// Model identifier used for requests.
    fn model(&self) -> &str;

    /// Generate text for the given request.
    ///
    /// Transport and HTTP-level failures are reported as
    /// [`LessonForgeError::Transport`](lessonforge_shared::LessonForgeError::Transport)
    /// or [`LessonForgeError::Timeout`](lessonforge_shared::LessonForgeError::Timeout).
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<GenerationResponse>> + Send;
}
