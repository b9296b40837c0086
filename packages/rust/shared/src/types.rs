//! Core domain types for generated assignments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AssignmentId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for generation identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(pub Uuid);

impl AssignmentId {
    /// Generate a new time-sortable identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AssignmentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// CodeSegment
// ---------------------------------------------------------------------------

/// One contiguous slice of a code template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSegment {
    pub text: String,
    /// Whether students may change this slice.
    pub editable: bool,
}

impl CodeSegment {
    pub fn editable(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            editable: true,
        }
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            editable: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Module / AssignmentSpec
// ---------------------------------------------------------------------------

/// One instructional step of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// 1-based position within the assignment.
    pub id: u32,
    pub title: String,
    pub learning_text: String,
    /// Raw template with canonical `<editable>` markers.
    pub code_template: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub expected_output: String,
}

impl Module {
    /// Title as shown in the authoring sidebar: `Module N: <title>`.
    ///
    /// A `Module K:` prefix already present in the title is replaced rather
    /// than repeated.
    pub fn display_title(&self) -> String {
        let bare = strip_module_prefix(&self.title);
        if bare.is_empty() {
            format!("Module {}", self.id)
        } else {
            format!("Module {}: {bare}", self.id)
        }
    }
}

/// Strip a leading `Module <digits>:` from a title.
fn strip_module_prefix(title: &str) -> &str {
    let trimmed = title.trim();
    let Some(rest) = trimmed.strip_prefix("Module ") else {
        return trimmed;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return trimmed;
    }
    match rest[digits..].strip_prefix(':') {
        Some(tail) => tail.trim(),
        None if rest[digits..].trim().is_empty() => "",
        None => trimmed,
    }
}

/// The validated output unit of the authoring pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSpec {
    pub title: String,
    pub description: String,
    /// Programming language the lesson teaches.
    pub target_language: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Ordered; modules are meant to be completed in sequence.
    pub modules: Vec<Module>,
}

// ---------------------------------------------------------------------------
// Validated / generated assignments
// ---------------------------------------------------------------------------

/// A Module enriched with its derived segment list.
#[derive(Debug, Clone, Serialize)]
pub struct MaterializedModule<'a> {
    #[serde(flatten)]
    pub module: &'a Module,
    pub segments: &'a [CodeSegment],
}

/// An assignment that passed normalization, with one segment list per module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedAssignment {
    pub assignment: AssignmentSpec,
    /// `segments[i]` belongs to `assignment.modules[i]`.
    pub segments: Vec<Vec<CodeSegment>>,
}

impl ValidatedAssignment {
    /// Pair every module with its segments.
    pub fn materialized_modules(&self) -> Vec<MaterializedModule<'_>> {
        self.assignment
            .modules
            .iter()
            .zip(&self.segments)
            .map(|(module, segments)| MaterializedModule {
                module,
                segments: segments.as_slice(),
            })
            .collect()
    }
}

/// Provenance recorded for each generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMeta {
    pub id: AssignmentId,
    /// Model that produced the response.
    pub model: String,
    /// SHA-256 of the prompt text, hex encoded.
    pub prompt_hash: String,
    pub generated_at: DateTime<Utc>,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub latency_ms: u64,
}

/// Result of a successful generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAssignment {
    #[serde(flatten)]
    pub content: ValidatedAssignment,
    pub meta: GenerationMeta,
}

impl GeneratedAssignment {
    pub fn assignment(&self) -> &AssignmentSpec {
        &self.content.assignment
    }

    pub fn materialized_modules(&self) -> Vec<MaterializedModule<'_>> {
        self.content.materialized_modules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: u32, title: &str) -> Module {
        Module {
            id,
            title: title.into(),
            learning_text: "text".into(),
            code_template: "<editable></editable>".into(),
            hints: vec![],
            expected_output: String::new(),
        }
    }

    #[test]
    fn assignment_id_roundtrip() {
        let id = AssignmentId::new();
        let s = id.to_string();
        let parsed: AssignmentId = s.parse().expect("parse AssignmentId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn display_title_prefixes_module_number() {
        assert_eq!(module(2, "Loops").display_title(), "Module 2: Loops");
    }

    #[test]
    fn display_title_replaces_existing_prefix() {
        assert_eq!(
            module(3, "Module 1: Pushing items").display_title(),
            "Module 3: Pushing items"
        );
        assert_eq!(module(4, "Module 4").display_title(), "Module 4");
    }

    #[test]
    fn display_title_keeps_unrelated_colons() {
        assert_eq!(
            module(1, "Stacks: push and pop").display_title(),
            "Module 1: Stacks: push and pop"
        );
    }

    #[test]
    fn module_serializes_camel_case() {
        let json = serde_json::to_value(module(1, "Intro")).expect("serialize");
        assert!(json.get("learningText").is_some());
        assert!(json.get("codeTemplate").is_some());
        assert!(json.get("expectedOutput").is_some());
    }

    #[test]
    fn materialized_module_flattens_segments() {
        let validated = ValidatedAssignment {
            assignment: AssignmentSpec {
                title: "Stacks".into(),
                description: String::new(),
                target_language: "Python".into(),
                dependencies: vec![],
                modules: vec![module(1, "Intro")],
            },
            segments: vec![vec![CodeSegment::editable("")]],
        };

        let materialized = validated.materialized_modules();
        assert_eq!(materialized.len(), 1);

        let json = serde_json::to_value(&materialized[0]).expect("serialize");
        assert_eq!(json["id"], 1);
        assert_eq!(json["segments"][0]["editable"], true);
        assert_eq!(json["segments"][0]["text"], "");
    }
}
