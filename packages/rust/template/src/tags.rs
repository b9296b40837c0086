//! Editable-region markers and their canonical spelling.

use std::sync::LazyLock;

use regex::Regex;

/// Canonical open marker.
pub const OPEN_MARKER: &str = "<editable>";

/// Canonical close marker.
pub const CLOSE_MARKER: &str = "</editable>";

/// Rewrite every case variant of the markers (`<EDITABLE>`, `</Editable>`, ...)
/// to the canonical lower-case pair. Text around and between markers is left
/// untouched, so the function is idempotent.
pub fn normalize_tags(template: &str) -> String {
    static MARKER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)<(/?)editable>").expect("valid regex"));

    MARKER_RE
        .replace_all(template, |caps: &regex::Captures| {
            if caps[1].is_empty() {
                OPEN_MARKER
            } else {
                CLOSE_MARKER
            }
        })
        .into_owned()
}

/// Whether a normalized template contains at least one open marker.
pub fn has_open_marker(template: &str) -> bool {
    template.contains(OPEN_MARKER)
}

/// Wrap the whole template in a single editable region.
pub fn wrap_editable(template: &str) -> String {
    format!("{OPEN_MARKER}{template}{CLOSE_MARKER}")
}

/// Remove all canonical markers, leaving literal code.
pub fn strip_markers(template: &str) -> String {
    template.replace(OPEN_MARKER, "").replace(CLOSE_MARKER, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_upper_markers() {
        let input = "a<EDITABLE>b</EDITABLE>c";
        assert_eq!(normalize_tags(input), "a<editable>b</editable>c");
    }

    #[test]
    fn normalize_handles_mixed_case() {
        let input = "<Editable>x</eDiTaBlE>";
        assert_eq!(normalize_tags(input), "<editable>x</editable>");
    }

    #[test]
    fn normalize_leaves_content_case_alone() {
        let input = "PRINT(X)<EDITABLE>RETURN EDITABLE</EDITABLE>";
        assert_eq!(
            normalize_tags(input),
            "PRINT(X)<editable>RETURN EDITABLE</editable>"
        );
    }

    #[test]
    fn normalize_ignores_near_misses() {
        let input = "<editable >x< /editable><editables>";
        assert_eq!(normalize_tags(input), input);
    }

    #[test]
    fn normalize_is_idempotent_on_canonical_input() {
        let input = "x = []\n<editable>\n# push here\n</editable>\nprint(x)";
        assert_eq!(normalize_tags(input), input);
        assert_eq!(normalize_tags(&normalize_tags(input)), normalize_tags(input));
    }

    #[test]
    fn has_open_marker_requires_canonical_spelling() {
        assert!(has_open_marker("a<editable>b"));
        assert!(!has_open_marker("a<EDITABLE>b"));
        assert!(!has_open_marker("a</editable>b"));
    }

    #[test]
    fn wrap_and_strip() {
        let wrapped = wrap_editable("pass");
        assert_eq!(wrapped, "<editable>pass</editable>");
        assert_eq!(strip_markers(&wrapped), "pass");
    }

    #[test]
    fn strip_removes_unbalanced_markers_too() {
        assert_eq!(strip_markers("a</editable>b<editable>c"), "abc");
    }
}
