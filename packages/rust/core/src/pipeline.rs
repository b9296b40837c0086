//! End-to-end generation pipeline: topic → prompt → model → extract → parse → validate.

use std::time::{Duration, Instant};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use lessonforge_provider::{GenerationParams, GenerationRequest, TextGenerator};
use lessonforge_shared::{
    AppConfig, AssignmentId, GeneratedAssignment, GenerationMeta, LessonForgeError, Result,
};

use crate::extract::{extract_json_span, parse_payload};
use crate::prompt::{PromptOptions, compose_prompt_with};
use crate::validate::{ValidateOptions, validate_assignment};

/// Configuration for [`AssignmentGenerator`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sampling parameters sent with every request.
    pub params: GenerationParams,
    /// Authoring constraints embedded in the prompt.
    pub prompt: PromptOptions,
    /// Upper bound on the external call.
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            params: GenerationParams::from(&config.generation),
            prompt: PromptOptions::from(&config.authoring),
            timeout: config.provider.timeout(),
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait GenerationProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the assignment has been validated.
    fn done(&self, _result: &GeneratedAssignment) {}
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl GenerationProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
}

/// Turns topic descriptions into validated assignments.
///
/// Holds no mutable state: one generator can serve any number of concurrent
/// requests. Dropping a returned future cancels only its in-flight call.
pub struct AssignmentGenerator<G> {
    generator: G,
    config: PipelineConfig,
}

impl<G: TextGenerator> AssignmentGenerator<G> {
    pub fn new(generator: G, config: PipelineConfig) -> Self {
        Self { generator, config }
    }

    /// Model identifier of the underlying generator.
    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Generate an assignment for `topic` without classroom context.
    pub async fn generate(&self, topic: &str) -> Result<GeneratedAssignment> {
        self.generate_with(topic, None, &SilentProgress).await
    }

    /// Run the full pipeline.
    ///
    /// Each stage short-circuits on failure; the error names the stage and
    /// carries the best raw diagnostic text available. There are no retries.
    #[instrument(skip_all, fields(topic = %topic.trim(), model = %self.generator.model()))]
    pub async fn generate_with(
        &self,
        topic: &str,
        classroom_context: Option<&str>,
        progress: &dyn GenerationProgress,
    ) -> Result<GeneratedAssignment> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(LessonForgeError::input("topic description is empty"));
        }

        // --- Phase 1: Prompt ---
        progress.phase("Composing prompt");
        let prompt = compose_prompt_with(topic, classroom_context, &self.config.prompt);
        let prompt_hash = prompt_hash(&prompt);
        debug!(prompt_len = prompt.len(), %prompt_hash, "prompt composed");

        // --- Phase 2: External call ---
        progress.phase("Requesting generation");
        let request = GenerationRequest {
            prompt,
            params: self.config.params.clone(),
        };
        let start = Instant::now();
        let response = tokio::time::timeout(self.config.timeout, self.generator.generate(&request))
            .await
            .map_err(|_| LessonForgeError::Timeout(self.config.timeout))??;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            latency_ms,
            tokens_in = response.tokens_in,
            tokens_out = response.tokens_out,
            "response received"
        );

        // --- Phase 3: Extract + parse ---
        progress.phase("Extracting payload");
        let span = extract_json_span(&response.text)?;
        debug!(span_len = span.len(), text_len = response.text.len(), "json span located");
        let payload = parse_payload(span)?;

        // --- Phase 4: Validate ---
        progress.phase("Validating assignment");
        let opts = ValidateOptions {
            fallback_title: Some(topic.to_string()),
        };
        let content = validate_assignment(&payload, &opts)?;

        let meta = GenerationMeta {
            id: AssignmentId::new(),
            model: response.model,
            prompt_hash,
            generated_at: Utc::now(),
            tokens_in: response.tokens_in,
            tokens_out: response.tokens_out,
            latency_ms,
        };

        info!(
            id = %meta.id,
            modules = content.assignment.modules.len(),
            title = %content.assignment.title,
            "assignment generated"
        );

        let result = GeneratedAssignment { content, meta };
        progress.done(&result);
        Ok(result)
    }
}

/// SHA-256 of the prompt text, hex encoded.
fn prompt_hash(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    format!("{:x}", hasher.finalize())
}
