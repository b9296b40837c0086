//! Shared types, error model, and configuration for LessonForge.
//!
//! This crate is the foundation depended on by all other LessonForge crates.
//! It provides:
//! - [`LessonForgeError`] is the unified error type, tagged by [`PipelineStage`]
//! - Domain types ([`AssignmentSpec`], [`Module`], [`CodeSegment`])
//! - Configuration ([`AppConfig`], config loading, API key resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuthoringConfig, GenerationConfig, ProviderConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{LessonForgeError, PipelineStage, Result};
pub use types::{
    AssignmentId, AssignmentSpec, CodeSegment, GeneratedAssignment, GenerationMeta,
    MaterializedModule, Module, ValidatedAssignment,
};
