// Property-based checks for classification and mention detection.
// Raise the case count with PROPTEST_CASES=10000 for a longer run.

use proptest::prelude::*;
use richinput_core::SpanKind;
use richinput_core::classify;
use richinput_core::mention::delete_mention_backward;
use richinput_core::mention::detect_mention;
use richinput_core::util::clamp_to_char_boundary;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

/// Text dense in `@`, `#`, dots and slashes so tokens actually form.
fn token_heavy_text() -> impl Strategy<Value = String> {
    "[a-z0-9_@#./: \n]{0,48}"
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn partition_is_lossless_for_any_string(input in any::<String>()) {
        let joined: String = classify(&input).into_iter().map(|s| s.text).collect();
        prop_assert_eq!(joined, input);
    }

    #[test]
    fn partition_is_lossless_for_token_heavy_text(input in token_heavy_text()) {
        let spans = classify(&input);
        let joined: String = spans.iter().map(|s| s.text.as_str()).collect();
        prop_assert_eq!(&joined, &input);
        prop_assert!(spans.iter().all(|s| !s.text.is_empty()));
        // Gaps between tokens come out as a single normal span.
        prop_assert!(
            spans
                .windows(2)
                .all(|w| !(w[0].kind == SpanKind::Normal && w[1].kind == SpanKind::Normal))
        );
    }

    #[test]
    fn mention_detection_is_idempotent(input in token_heavy_text(), cursor in 0usize..64) {
        let first = detect_mention(&input, cursor);
        prop_assert_eq!(&first, &detect_mention(&input, cursor));
        if let Some(token) = first {
            let cursor = clamp_to_char_boundary(&input, cursor);
            prop_assert!(input[token.start_offset..].starts_with('@'));
            prop_assert!(token.start_offset < cursor);
        }
    }

    #[test]
    fn mention_backspace_removes_one_contiguous_range(
        input in token_heavy_text(),
        cursor in 0usize..64,
    ) {
        let cursor = clamp_to_char_boundary(&input, cursor);
        if let Some(edit) = delete_mention_backward(&input, cursor) {
            prop_assert!(edit.cursor < cursor);
            prop_assert!(input[edit.cursor..].starts_with('@'));
            let expected = format!("{}{}", &input[..edit.cursor], &input[cursor..]);
            prop_assert_eq!(edit.text, expected);
        }
    }
}
