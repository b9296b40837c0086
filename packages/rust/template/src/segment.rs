//! Splits a tag-normalized template into editable and fixed segments.
//!
//! The scan never fails. Malformed input degrades instead:
//! an open marker without a close marker makes the rest of the template
//! editable. Empty editable regions are kept because they mark an
//! "insert code here" position; empty fixed text is never emitted.

use lessonforge_shared::CodeSegment;

use crate::tags::{CLOSE_MARKER, OPEN_MARKER};

/// Segment a template that has already been through
/// [`normalize_tags`](crate::normalize_tags).
pub fn segment(template: &str) -> Vec<CodeSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while cursor < template.len() {
        let rest = &template[cursor..];

        let Some(open) = rest.find(OPEN_MARKER) else {
            segments.push(CodeSegment::fixed(rest));
            break;
        };

        if open > 0 {
            segments.push(CodeSegment::fixed(&rest[..open]));
        }

        let body_start = open + OPEN_MARKER.len();
        let body = &rest[body_start..];

        match body.find(CLOSE_MARKER) {
            Some(close) => {
                segments.push(CodeSegment::editable(&body[..close]));
                cursor += body_start + close + CLOSE_MARKER.len();
            }
            None => {
                segments.push(CodeSegment::editable(body));
                break;
            }
        }
    }

    segments
}

/// Rebuild a tagged template from segments.
///
/// Inverse of [`segment`] for templates whose markers are balanced.
pub fn compose_template(segments: &[CodeSegment]) -> String {
    segments.iter().fold(String::new(), |mut acc, seg| {
        if seg.editable {
            acc.push_str(OPEN_MARKER);
            acc.push_str(&seg.text);
            acc.push_str(CLOSE_MARKER);
        } else {
            acc.push_str(&seg.text);
        }
        acc
    })
}

/// Concatenate segment texts into literal starter code.
pub fn starter_code(segments: &[CodeSegment]) -> String {
    segments.iter().map(|seg| seg.text.as_str()).collect()
}
