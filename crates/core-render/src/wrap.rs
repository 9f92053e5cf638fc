//! Word wrapping for plain and marked-up text, on top of `textwrap`.
//!
//! Rules:
//! * Input newlines are paragraph breaks and are preserved; blank paragraphs
//!   produce empty lines.
//! * Lines break greedily at spaces; whitespace at a line end is dropped.
//! * No output line is wider than `width` display columns. A word is split
//!   only when it alone is wider than `width`.
//! * Marked-up input is wrapped on its visible text. Every output line starts
//!   with an explicit tag, so a line never depends on the attribute left by
//!   the previous one.
//!
//! A `width` of zero disables wrapping (paragraphs are returned unchanged).

use core_markup::{ColorSpec, MarkupSpan, decode, encode};
use textwrap::{Options, WordSeparator, WrapAlgorithm};

fn options(width: usize) -> Options<'static> {
    Options::new(width)
        .word_separator(WordSeparator::AsciiSpace)
        .wrap_algorithm(WrapAlgorithm::FirstFit)
        .break_words(true)
}

/// Wrap plain text.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.split('\n').map(str::to_string).collect();
    }
    textwrap::wrap(text, options(width))
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

/// Wrap marked-up text starting from attribute `current`.
pub fn wrap_marked(text: &str, width: usize, current: ColorSpec) -> Vec<String> {
    let mut out = Vec::new();
    let mut attr = current;
    for paragraph in text.split('\n') {
        let spans = decode(paragraph, attr);
        let mut plain = String::new();
        // Attribute of every byte of `plain`.
        let mut styles: Vec<ColorSpec> = Vec::new();
        for span in &spans {
            plain.push_str(&span.text);
            styles.resize(plain.len(), span.spec);
        }

        // Lines come back in order and only whitespace is dropped between
        // them, so each one is found at or after the end of the previous.
        let mut cursor = 0;
        for line in wrap(&plain, width) {
            let start = plain[cursor..].find(&line).map_or(cursor, |i| cursor + i);
            out.push(encode_line(&line, &styles[start..], attr));
            cursor = start + line.len();
        }
        attr = spans.last().map_or(attr, |s| s.spec);
    }
    out
}

/// Re-tag `line` using the per-byte attributes that start at its first byte.
fn encode_line(line: &str, styles: &[ColorSpec], fallback: ColorSpec) -> String {
    let mut spans: Vec<MarkupSpan> = Vec::new();
    for (i, ch) in line.char_indices() {
        let spec = styles.get(i).copied().unwrap_or(fallback);
        match spans.last_mut() {
            Some(last) if last.spec == spec => last.text.push(ch),
            _ => spans.push(MarkupSpan::new(spec, ch.to_string())),
        }
    }
    if spans.is_empty() {
        spans.push(MarkupSpan::new(fallback, ""));
    }
    encode(&spans)
}
