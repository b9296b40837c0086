//! Normalization and validation of generated assignment payloads.
//!
//! Model output is loosely shaped. Gaps that have a sensible default are
//! repaired (and logged); only a missing or malformed module list is fatal.
//! Every returned assignment satisfies:
//! - at least one module;
//! - module ids equal their 1-based position;
//! - non-empty titles and learning text;
//! - canonical markers in every template, with at least one editable region.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use lessonforge_shared::{
    AssignmentSpec, CodeSegment, LessonForgeError, Module, Result, ValidatedAssignment,
};
use lessonforge_template::{compose_template, has_open_marker, normalize_tags, segment, wrap_editable};

/// Top-level key the payload is expected to be wrapped in.
pub const WRAPPER_KEY: &str = "assignment";

/// Language assumed when the payload names none.
pub const DEFAULT_TARGET_LANGUAGE: &str = "Python";

const UNTITLED_ASSIGNMENT: &str = "Untitled assignment";
const MISSING_LEARNING_TEXT: &str = "No learning text was provided for this module.";

/// Knobs for [`validate_assignment`].
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Title used when the payload has none, typically the topic.
    pub fallback_title: Option<String>,
}

/// Repair and validate a parsed payload.
///
/// Validation failures carry the serialized payload as raw diagnostic text.
pub fn validate_assignment(payload: &Value, opts: &ValidateOptions) -> Result<ValidatedAssignment> {
    validate_inner(payload, opts).map_err(|e| e.with_raw(payload.to_string()))
}

fn validate_inner(payload: &Value, opts: &ValidateOptions) -> Result<ValidatedAssignment> {
    let root = payload
        .as_object()
        .ok_or_else(|| LessonForgeError::validation("payload is not a JSON object"))?;

    let body = match root.get(WRAPPER_KEY) {
        Some(Value::Object(inner)) => inner,
        Some(_) => {
            return Err(LessonForgeError::validation(format!(
                "`{WRAPPER_KEY}` is not an object"
            )));
        }
        None => {
            warn!("`{WRAPPER_KEY}` key missing, treating payload as the assignment body");
            root
        }
    };

    let raw_modules = match body.get("modules") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(LessonForgeError::validation("`modules` is not a list")),
        None => return Err(LessonForgeError::validation("`modules` is missing")),
    };
    if raw_modules.is_empty() {
        return Err(LessonForgeError::validation("`modules` is empty"));
    }

    let title = non_empty_text(body, &["title"])
        .map(str::to_string)
        .or_else(|| {
            opts.fallback_title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNTITLED_ASSIGNMENT.to_string());

    let description = text_value(body.get("description")).unwrap_or_default();

    let target_language = match non_empty_text(body, &["targetLanguage", "language"]) {
        Some(lang) => lang.to_string(),
        None => {
            warn!(fallback = DEFAULT_TARGET_LANGUAGE, "target language missing");
            DEFAULT_TARGET_LANGUAGE.to_string()
        }
    };

    let dependencies = dependencies(body);

    let mut modules = Vec::with_capacity(raw_modules.len());
    let mut segments = Vec::with_capacity(raw_modules.len());

    for (index, raw) in raw_modules.iter().enumerate() {
        let position = index + 1;
        let obj = raw.as_object().ok_or_else(|| {
            LessonForgeError::validation(format!("module {position} is not an object"))
        })?;

        let (module, module_segments) = normalize_module(obj, position)?;
        modules.push(module);
        segments.push(module_segments);
    }

    debug!(
        modules = modules.len(),
        dependencies = dependencies.len(),
        language = %target_language,
        "assignment validated"
    );

    Ok(ValidatedAssignment {
        assignment: AssignmentSpec {
            title,
            description,
            target_language,
            dependencies,
            modules,
        },
        segments,
    })
}

/// Normalize one module and segment its template.
fn normalize_module(obj: &Map<String, Value>, position: usize) -> Result<(Module, Vec<CodeSegment>)> {
    let id = u32::try_from(position)
        .map_err(|_| LessonForgeError::validation(format!("too many modules ({position})")))?;

    match obj.get("id").and_then(Value::as_u64) {
        Some(source_id) if source_id != u64::from(id) => {
            debug!(source_id, id, "renumbering module");
        }
        None => debug!(id, "module id missing, using position"),
        _ => {}
    }

    let title = non_empty_text(obj, &["title"])
        .map(str::to_string)
        .unwrap_or_else(|| format!("Module {id}"));

    let learning_text = non_empty_text(obj, &["learningText"])
        .map(str::to_string)
        .unwrap_or_else(|| {
            warn!(id, "module has no learning text");
            MISSING_LEARNING_TEXT.to_string()
        });

    let mut code_template = normalize_tags(&raw_template(obj));
    if !has_open_marker(&code_template) {
        warn!(id, "template has no editable region, wrapping the whole template");
        code_template = wrap_editable(&code_template);
    }

    let hints = match obj.get("hints") {
        Some(Value::Array(items)) => string_list(items),
        _ => Vec::new(),
    };

    let expected_output = text_value(obj.get("expectedOutput")).unwrap_or_default();

    let module_segments = segment(&code_template);

    Ok((
        Module {
            id,
            title,
            learning_text,
            code_template,
            hints,
            expected_output,
        },
        module_segments,
    ))
}

/// The module's template, composing it from `codeParts` when no
/// `codeTemplate` string is present.
fn raw_template(obj: &Map<String, Value>) -> String {
    if let Some(template) = obj.get("codeTemplate").and_then(Value::as_str) {
        return template.to_string();
    }

    let Some(Value::Array(parts)) = obj.get("codeParts") else {
        return String::new();
    };

    let segments: Vec<CodeSegment> = parts
        .iter()
        .filter_map(Value::as_object)
        .map(|part| CodeSegment {
            text: part
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            editable: part
                .get("editable")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
        .collect();

    debug!(parts = segments.len(), "composing template from code parts");
    compose_template(&segments)
}

/// Dependencies from `dependencies`, or `requirements` when the former is
/// absent, trimmed and de-duplicated in first-seen order.
fn dependencies(body: &Map<String, Value>) -> Vec<String> {
    let value = ["dependencies", "requirements"]
        .iter()
        .find_map(|key| body.get(*key));

    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    string_list(items)
        .into_iter()
        .filter(|dep| seen.insert(dep.clone()))
        .collect()
}

/// First key whose value is a non-blank string, trimmed.
fn non_empty_text<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Strings are taken as-is; numbers and booleans are rendered.
fn text_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Non-blank scalar items of a list, trimmed.
fn string_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| text_value(Some(item)))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
