//! Inline color markup codec.
//!
//! Renderable strings carry their colors inline: a run starts with the
//! out-of-band control character `\x03`, one or two palette letters and a
//! second `\x03`, followed by the text of the run:
//!
//! ```text
//! \x03YR\x03warning\x03D\x03 plain
//! ```
//!
//! The first letter is the foreground, the optional second letter the
//! background. Letters are matched case-insensitively.
//!
//! Decoding invariants:
//! * `decode` never fails. A malformed tag drops its control character and the
//!   remaining characters render as literal text in the active attribute.
//! * Control characters never appear in decoded span text.
//! * A line that does not start with a tag inherits the attribute passed in by
//!   the caller (word-wrapped continuation lines lose their prefix).
//! * `decode(encode(spans), _) == spans` whenever no span text contains the
//!   control character.

use std::borrow::Cow;
use unicode_width::UnicodeWidthStr;

/// Out-of-band marker opening and closing a color tag.
pub const CONTROL: char = '\x03';

/// The fixed palette: eight named colors plus the terminal default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Default,
}

impl Color {
    pub const ALL: [Color; 9] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
        Color::Default,
    ];

    /// Markup letter (`K` for black, first letter otherwise).
    pub const fn letter(self) -> char {
        match self {
            Color::Black => 'K',
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Yellow => 'Y',
            Color::Blue => 'B',
            Color::Magenta => 'M',
            Color::Cyan => 'C',
            Color::White => 'W',
            Color::Default => 'D',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        let color = match c.to_ascii_uppercase() {
            'K' => Color::Black,
            'R' => Color::Red,
            'G' => Color::Green,
            'Y' => Color::Yellow,
            'B' => Color::Blue,
            'M' => Color::Magenta,
            'C' => Color::Cyan,
            'W' => Color::White,
            'D' => Color::Default,
            _ => return None,
        };
        Some(color)
    }

    /// Position in [`Color::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Foreground plus optional background. `bg == None` inherits the terminal
/// background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorSpec {
    pub fg: Color,
    pub bg: Option<Color>,
}

impl ColorSpec {
    /// Attribute used before anything else was written.
    pub const PLAIN: ColorSpec = ColorSpec::fg(Color::Default);

    pub const fn fg(fg: Color) -> Self {
        Self { fg, bg: None }
    }

    pub const fn on(fg: Color, bg: Color) -> Self {
        Self { fg, bg: Some(bg) }
    }

    /// Same foreground, background taken from `other`.
    pub const fn inherit_bg(self, other: ColorSpec) -> Self {
        Self {
            fg: self.fg,
            bg: other.bg,
        }
    }

    /// Letter code (`"Y"`, `"KG"`).
    pub fn code(self) -> String {
        let mut out = String::with_capacity(2);
        out.push(self.fg.letter());
        if let Some(bg) = self.bg {
            out.push(bg.letter());
        }
        out
    }

    /// Full tag including both control characters.
    pub fn tag(self) -> String {
        format!("{CONTROL}{}{CONTROL}", self.code())
    }

    /// Parse a 1–2 letter code. Returns `None` for anything else.
    pub fn parse_code(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let fg = Color::from_letter(chars.next()?)?;
        let bg = match chars.next() {
            Some(c) => Some(Color::from_letter(c)?),
            None => None,
        };
        if chars.next().is_some() {
            return None;
        }
        Some(Self { fg, bg })
    }
}

impl Default for ColorSpec {
    fn default() -> Self {
        Self::PLAIN
    }
}

/// A contiguous run of text in one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSpan {
    pub spec: ColorSpec,
    pub text: String,
}

impl MarkupSpan {
    pub fn new(spec: ColorSpec, text: impl Into<String>) -> Self {
        Self {
            spec,
            text: text.into(),
        }
    }
}

/// Encode spans into a single marked-up string.
pub fn encode(spans: &[MarkupSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        out.push_str(&span.spec.tag());
        out.push_str(&span.text);
    }
    out
}

/// Prefix `text` with the tag for `spec`.
pub fn tagged(spec: ColorSpec, text: &str) -> String {
    let mut out = spec.tag();
    out.push_str(text);
    out
}

/// Decode one line. `current` is the attribute active before the line; it
/// colors any leading untagged text and any literal text left behind by a
/// malformed tag.
pub fn decode(line: &str, current: ColorSpec) -> Vec<MarkupSpan> {
    let mut spans = Vec::new();
    let mut active = current;
    let mut text = String::new();
    // A span is open once a tag was accepted or untagged text was seen.
    let mut open = false;
    let mut rest = line;

    while let Some(pos) = rest.find(CONTROL) {
        if pos > 0 {
            text.push_str(&rest[..pos]);
            open = true;
        }
        let after = &rest[pos + CONTROL.len_utf8()..];
        match parse_tag(after) {
            Some((spec, consumed)) => {
                if open {
                    spans.push(MarkupSpan::new(active, std::mem::take(&mut text)));
                }
                active = spec;
                open = true;
                rest = &after[consumed..];
            }
            None => {
                rest = after;
            }
        }
    }
    if !rest.is_empty() {
        text.push_str(rest);
        open = true;
    }
    if open {
        spans.push(MarkupSpan::new(active, text));
    }
    spans
}

fn parse_tag(s: &str) -> Option<(ColorSpec, usize)> {
    let end = s
        .char_indices()
        .take(3)
        .find(|(_, c)| *c == CONTROL)
        .map(|(i, _)| i)?;
    let spec = ColorSpec::parse_code(&s[..end])?;
    Some((spec, end + CONTROL.len_utf8()))
}

/// Visible text of a marked-up line.
pub fn plain_text(line: &str) -> String {
    decode(line, ColorSpec::PLAIN)
        .into_iter()
        .map(|span| span.text)
        .collect()
}

/// Terminal column width of the visible text.
pub fn visible_width(line: &str) -> usize {
    UnicodeWidthStr::width(plain_text(line).as_str())
}

/// Clean untrusted text before it is embedded in markup: the markup control
/// character is removed and every other control character except `\n`
/// becomes a space.
pub fn strip_control(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| c.is_control() && c != '\n') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .filter(|c| *c != CONTROL)
            .map(|c| if c.is_control() && c != '\n' { ' ' } else { c })
            .collect(),
    )
}
