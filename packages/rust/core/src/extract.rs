//! Pulls the JSON payload out of free-form model output.
//!
//! The span runs from the first `{` to the last `}`. This is a bracket
//! heuristic, not a tokenizer: braces inside string values after the real
//! closing brace, or several JSON blobs in one response, produce a wrong
//! span. Validation downstream catches what this lets through.

use lessonforge_shared::{LessonForgeError, Result};
use serde_json::Value;

/// Locate the candidate JSON span in `text`.
pub fn extract_json_span(text: &str) -> Result<&str> {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        (None, _) | (_, None) => Err(LessonForgeError::Extraction {
            message: "no JSON object found in response".into(),
            raw: text.to_string(),
        }),
        _ => Err(LessonForgeError::Extraction {
            message: "last '}' precedes first '{' in response".into(),
            raw: text.to_string(),
        }),
    }
}

/// Parse an extracted span into a JSON tree.
pub fn parse_payload(span: &str) -> Result<Value> {
    serde_json::from_str(span).map_err(|e| LessonForgeError::Parse {
        message: format!("extracted span is not valid JSON: {e}"),
        raw: span.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonforge_shared::PipelineStage;

    #[test]
    fn extracts_span_between_noise() {
        assert_eq!(
            extract_json_span("noise {\"a\":1} trailing").unwrap(),
            "{\"a\":1}"
        );
    }

    #[test]
    fn no_braces_is_extraction_failure() {
        let err = extract_json_span("no braces here").unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Extraction));
        assert_eq!(err.raw_response(), Some("no braces here"));
    }

    #[test]
    fn open_brace_only_is_extraction_failure() {
        assert!(matches!(
            extract_json_span("{ unterminated"),
            Err(LessonForgeError::Extraction { .. })
        ));
    }

    #[test]
    fn reversed_braces_are_extraction_failure() {
        let err = extract_json_span("} then {").unwrap_err();
        assert!(err.to_string().contains("precedes"));
    }

    #[test]
    fn empty_object_is_a_valid_span() {
        assert_eq!(extract_json_span("{}").unwrap(), "{}");
    }

    #[test]
    fn strips_markdown_fences() {
        let text = std::fs::read_to_string("../../../fixtures/responses/model-output-fenced.txt")
            .expect("read fenced fixture");
        let span = extract_json_span(&text).unwrap();
        assert!(span.starts_with('{'));
        assert!(span.ends_with('}'));
        let value = parse_payload(span).unwrap();
        assert!(value.get("assignment").is_some());
    }

    #[test]
    fn trailing_brace_in_prose_widens_the_span() {
        // Known heuristic weakness: the span reaches the last '}' anywhere.
        let text = "{\"a\":1} and also {b}";
        let span = extract_json_span(text).unwrap();
        assert_eq!(span, "{\"a\":1} and also {b}");
        let err = parse_payload(span).unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Parse));
    }

    #[test]
    fn parse_failure_carries_span() {
        let err = parse_payload("{not json}").unwrap_err();
        assert_eq!(err.raw_response(), Some("{not json}"));
    }
}
