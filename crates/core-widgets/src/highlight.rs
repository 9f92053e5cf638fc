//! Keyword highlighting.
//!
//! Pure transform from a note body to marked-up text. Each case-insensitive
//! occurrence of a keyword becomes an accent-colored run that keeps the base
//! background; everything else, including the character right after a match,
//! stays in the base color. Overlapping or adjacent matches merge into one run.
//! The body's own casing is preserved.

use core_markup::{Color, ColorSpec, MarkupSpan, encode, strip_control, tagged};
use core_model::KeywordSet;

/// Single-char lowercase mapping; characters whose lowercase form expands to
/// several chars compare as themselves so match offsets stay aligned.
fn fold(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Annotate `body` with highlight runs for every keyword.
pub fn highlight(body: &str, keywords: &KeywordSet, base: ColorSpec, accent: Color) -> String {
    let body = strip_control(body);
    let chars: Vec<char> = body.chars().collect();
    let folded: Vec<char> = chars.iter().copied().map(fold).collect();
    let mut mask = vec![false; chars.len()];

    for keyword in keywords.iter() {
        let needle: Vec<char> = keyword.chars().map(fold).collect();
        let n = needle.len();
        if n == 0 || n > folded.len() {
            continue;
        }
        for start in 0..=folded.len() - n {
            if folded[start..start + n] == needle[..] {
                mask[start..start + n].fill(true);
            }
        }
    }

    if !mask.contains(&true) {
        return tagged(base, &body);
    }

    let accent_spec = ColorSpec::fg(accent).inherit_bg(base);
    let mut spans: Vec<MarkupSpan> = Vec::new();
    for (ch, hit) in chars.into_iter().zip(mask) {
        let spec = if hit { accent_spec } else { base };
        match spans.last_mut() {
            Some(last) if last.spec == spec => last.text.push(ch),
            _ => spans.push(MarkupSpan::new(spec, ch.to_string())),
        }
    }
    encode(&spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_markup::decode;
    use pretty_assertions::assert_eq;

    const BASE: ColorSpec = ColorSpec::fg(Color::Blue);
    const HOT: ColorSpec = ColorSpec::fg(Color::Red);

    fn keywords(words: &[&str]) -> KeywordSet {
        words.iter().collect()
    }

    #[test]
    fn highlight_is_scoped_to_match() {
        let out = highlight("a cat sat", &keywords(&["cat"]), BASE, Color::Red);
        assert_eq!(
            decode(&out, ColorSpec::PLAIN),
            vec![
                MarkupSpan::new(BASE, "a "),
                MarkupSpan::new(HOT, "cat"),
                MarkupSpan::new(BASE, " sat"),
            ]
        );
    }

    #[test]
    fn case_insensitive_preserves_source_case() {
        let out = highlight("%%Python%% note", &keywords(&["python"]), BASE, Color::Red);
        let spans = decode(&out, ColorSpec::PLAIN);
        assert_eq!(spans[1], MarkupSpan::new(HOT, "Python"));
        assert_eq!(spans[2], MarkupSpan::new(BASE, "%% note"));
    }

    #[test]
    fn every_occurrence_and_overlaps_merge() {
        let out = highlight("abab ab", &keywords(&["ab", "ba"]), BASE, Color::Red);
        assert_eq!(
            decode(&out, ColorSpec::PLAIN),
            vec![
                MarkupSpan::new(HOT, "abab"),
                MarkupSpan::new(BASE, " "),
                MarkupSpan::new(HOT, "ab"),
            ]
        );
    }

    #[test]
    fn accent_inherits_background() {
        let base = ColorSpec::on(Color::White, Color::Blue);
        let out = highlight("x key", &keywords(&["key"]), base, Color::Yellow);
        let spans = decode(&out, ColorSpec::PLAIN);
        assert_eq!(spans[1].spec, ColorSpec::on(Color::Yellow, Color::Blue));
    }

    #[test]
    fn no_keywords_yields_single_base_run() {
        let out = highlight("nothing here", &KeywordSet::new(), BASE, Color::Red);
        assert_eq!(decode(&out, ColorSpec::PLAIN), vec![MarkupSpan::new(BASE, "nothing here")]);
    }

    #[test]
    fn control_chars_in_body_cannot_inject_markup() {
        let out = highlight("a\x03R\x03b", &KeywordSet::new(), BASE, Color::Red);
        assert_eq!(decode(&out, ColorSpec::PLAIN), vec![MarkupSpan::new(BASE, "aRb")]);
    }
}
