use core_markup::{ColorSpec, visible_width};
use core_render::wrap::{wrap, wrap_marked};
use proptest::prelude::*;

fn words() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,12}", 1..30).prop_map(|w| w.join(" "))
}

#[test]
fn hundred_char_body_fits_forty_columns() {
    let body = "Lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor incididunt ut labore et";
    assert_eq!(body.chars().count(), 100);
    let lines = wrap(body, 40);
    assert!(lines.len() >= 3);
    for line in &lines {
        assert!(line.chars().count() <= 40, "line too long: {line:?}");
    }
    assert_eq!(lines.join(" "), body);
}

proptest! {
    #[test]
    fn no_line_exceeds_width(text in words(), width in 1usize..50) {
        for line in wrap(&text, width) {
            prop_assert!(line.chars().count() <= width);
        }
    }

    #[test]
    fn splits_only_at_whitespace_unless_word_too_long(text in words(), width in 12usize..50) {
        // Every word is at most 12 chars, so no word may be split.
        let lines = wrap(&text, width);
        prop_assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn marked_wrap_respects_width(text in words(), width in 1usize..50) {
        let marked = format!("\x03B\x03{text}");
        for line in wrap_marked(&marked, width, ColorSpec::PLAIN) {
            prop_assert!(visible_width(&line) <= width);
        }
    }
}
