//! Code template handling: marker canonicalization and segmentation.
//!
//! Instructors mark student-editable ranges of a code template with
//! `<editable>...</editable>`. This crate canonicalizes marker spelling,
//! splits a template into ordered [`CodeSegment`]s, and converts between
//! segments, tagged templates, and literal starter code.
//!
//! Nothing here fails: malformed markers degrade to best-effort segments
//! because an instructor reviews the result before publishing.

mod segment;
mod tags;

use lessonforge_shared::CodeSegment;
use tracing::trace;

pub use segment::{compose_template, segment, starter_code};
pub use tags::{CLOSE_MARKER, OPEN_MARKER, has_open_marker, normalize_tags, strip_markers, wrap_editable};

/// Normalize marker spelling and segment in one step.
///
/// Consumers re-rendering a stored raw template should call this rather
/// than caching segments.
pub fn segment_template(raw: &str) -> Vec<CodeSegment> {
    let normalized = normalize_tags(raw);
    let segments = segment(&normalized);
    trace!(
        len = raw.len(),
        segments = segments.len(),
        editable = segments.iter().filter(|s| s.editable).count(),
        "segmented template"
    );
    segments
}

/// Literal starter code for a raw template, markers removed.
pub fn template_starter_code(raw: &str) -> String {
    strip_markers(&normalize_tags(raw))
}
