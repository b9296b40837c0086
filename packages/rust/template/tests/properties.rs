use lessonforge_template::{
    CLOSE_MARKER, OPEN_MARKER, compose_template, normalize_tags, segment, starter_code,
    strip_markers,
};
use proptest::prelude::*;

/// Template text that cannot contain a marker.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-z0-9 =()#:\n]{0,12}"
}

fn arb_open() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("<editable>".to_string()),
        Just("<EDITABLE>".to_string()),
        Just("<Editable>".to_string()),
    ]
}

fn arb_close() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("</editable>".to_string()),
        Just("</EDITABLE>".to_string()),
        Just("</Editable>".to_string()),
    ]
}

#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Region(String, String, String),
}

fn arb_piece() -> impl Strategy<Value = Piece> {
    prop_oneof![
        arb_text().prop_map(Piece::Text),
        (arb_open(), arb_text(), arb_close()).prop_map(|(o, t, c)| Piece::Region(o, t, c)),
    ]
}

/// Balanced template, optionally ending in an unterminated region.
fn arb_template() -> impl Strategy<Value = (String, usize)> {
    (
        prop::collection::vec(arb_piece(), 0..8),
        prop::option::of((arb_open(), arb_text())),
    )
        .prop_map(|(pieces, tail)| {
            let mut template = String::new();
            let mut regions = 0;
            for piece in pieces {
                match piece {
                    Piece::Text(t) => template.push_str(&t),
                    Piece::Region(o, t, c) => {
                        regions += 1;
                        template.push_str(&o);
                        template.push_str(&t);
                        template.push_str(&c);
                    }
                }
            }
            if let Some((open, text)) = tail {
                regions += 1;
                template.push_str(&open);
                template.push_str(&text);
            }
            (template, regions)
        })
}

proptest! {
    /// Holds for balanced templates, optionally ending in an unterminated
    /// region. A stray close marker is kept as literal fixed text, so
    /// `"a</editable>b"` segments to itself while stripping yields `"ab"`;
    /// `stray_close_marker_stays_literal` in `segment.rs` pins that case.
    #[test]
    fn segments_concatenate_to_stripped_template((template, _) in arb_template()) {
        let normalized = normalize_tags(&template);
        let segments = segment(&normalized);
        prop_assert_eq!(starter_code(&segments), strip_markers(&normalized));
    }

    #[test]
    fn one_editable_segment_per_region((template, regions) in arb_template()) {
        let segments = segment(&normalize_tags(&template));
        let editable = segments.iter().filter(|s| s.editable).count();
        prop_assert_eq!(editable, regions);
    }

    #[test]
    fn fixed_segments_are_never_empty_or_adjacent((template, _) in arb_template()) {
        let segments = segment(&normalize_tags(&template));
        prop_assert!(segments.iter().all(|s| s.editable || !s.text.is_empty()));
        for pair in segments.windows(2) {
            prop_assert!(pair[0].editable || pair[1].editable);
        }
    }

    #[test]
    fn normalize_is_idempotent(s in ".{0,64}") {
        let once = normalize_tags(&s);
        prop_assert_eq!(normalize_tags(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_on_marker_soup(
        s in "(<EDITABLE>|</Editable>|<editable>|</EDITABLE>|<|>|/|[a-zA-Z ]){0,24}"
    ) {
        let once = normalize_tags(&s);
        prop_assert_eq!(normalize_tags(&once), once);
    }

    #[test]
    fn compose_inverts_segment_for_balanced_templates(
        pieces in prop::collection::vec(arb_piece(), 0..8)
    ) {
        let mut template = String::new();
        for piece in pieces {
            match piece {
                Piece::Text(t) => template.push_str(&t),
                Piece::Region(_, t, _) => {
                    template.push_str(OPEN_MARKER);
                    template.push_str(&t);
                    template.push_str(CLOSE_MARKER);
                }
            }
        }
        prop_assert_eq!(compose_template(&segment(&template)), template);
    }
}
