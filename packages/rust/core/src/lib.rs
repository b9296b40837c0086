//! Assignment authoring pipeline for LessonForge.
//!
//! This crate ties prompt composition, the generative service call, payload
//! extraction, and schema validation into one entry point,
//! [`AssignmentGenerator`].

pub mod extract;
pub mod pipeline;
pub mod prompt;
pub mod validate;

pub use extract::{extract_json_span, parse_payload};
pub use pipeline::{AssignmentGenerator, GenerationProgress, PipelineConfig, SilentProgress};
pub use prompt::{PromptOptions, compose_prompt, compose_prompt_with};
pub use validate::{DEFAULT_TARGET_LANGUAGE, ValidateOptions, validate_assignment};
