//! Input event types and the event source seam.
//!
//! The controller loop is synchronous: it asks an [`EventSource`] for at most
//! one event per cycle, blocking up to a timeout. `Ok(None)` means the timeout
//! elapsed with nothing to report (a tick). Terminal-backed sources live in
//! `core-input`; [`ScriptedSource`] replays a fixed sequence for tests and
//! headless runs.
//!
//! Invariants:
//! * A `KeyToken` never carries modifier-only or release events; sources filter
//!   those out before emitting.
//! * `KeyToken::Chord` always wraps a non-chord base with a non-empty mask.
//! * Events carry no note content, so logging them is always safe.

use anyhow::{Result, anyhow};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModMask: u8 {
        const CTRL = 0b0000_0001;
        const ALT = 0b0000_0010;
        const SHIFT = 0b0000_0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Esc,
    Backspace,
    Tab,
    F(u8),
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
}

impl NamedKey {
    /// Canonical name used in config files and logs.
    pub fn name(self) -> String {
        match self {
            NamedKey::Enter => "Enter".into(),
            NamedKey::Esc => "Esc".into(),
            NamedKey::Backspace => "Backspace".into(),
            NamedKey::Tab => "Tab".into(),
            NamedKey::F(n) => format!("F{n}"),
            NamedKey::Up => "Up".into(),
            NamedKey::Down => "Down".into(),
            NamedKey::Left => "Left".into(),
            NamedKey::Right => "Right".into(),
            NamedKey::Home => "Home".into(),
            NamedKey::End => "End".into(),
            NamedKey::PageUp => "PageUp".into(),
            NamedKey::PageDown => "PageDown".into(),
            NamedKey::Insert => "Insert".into(),
            NamedKey::Delete => "Delete".into(),
        }
    }

    /// Case-insensitive lookup of a canonical name or common alias.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let key = match lower.as_str() {
            "enter" | "return" | "cr" => NamedKey::Enter,
            "esc" | "escape" => NamedKey::Esc,
            "backspace" | "bs" => NamedKey::Backspace,
            "tab" => NamedKey::Tab,
            "up" => NamedKey::Up,
            "down" => NamedKey::Down,
            "left" => NamedKey::Left,
            "right" => NamedKey::Right,
            "home" => NamedKey::Home,
            "end" => NamedKey::End,
            "pageup" | "pgup" => NamedKey::PageUp,
            "pagedown" | "pgdn" => NamedKey::PageDown,
            "insert" | "ins" => NamedKey::Insert,
            "delete" | "del" => NamedKey::Delete,
            other => {
                let n = other.strip_prefix('f')?.parse::<u8>().ok()?;
                if n == 0 {
                    return None;
                }
                NamedKey::F(n)
            }
        };
        Some(key)
    }
}

/// A single key press.
///
/// Plain characters and named keys are matched directly; anything pressed with
/// Ctrl or Alt is wrapped in a `Chord`. Shift on a character is already
/// reflected in the character itself and is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Char(char),
    Named(NamedKey),
    Chord { base: Box<KeyToken>, mods: ModMask },
}

impl KeyToken {
    /// Build a token from a base key and modifiers, normalizing as documented
    /// on the type.
    pub fn with_mods(base: KeyToken, mods: ModMask) -> KeyToken {
        let base = match base {
            KeyToken::Chord { base, .. } => *base,
            other => other,
        };
        let mods = match base {
            KeyToken::Char(_) => mods - ModMask::SHIFT,
            _ => mods,
        };
        if mods.is_empty() {
            base
        } else {
            KeyToken::Chord {
                base: Box::new(base),
                mods,
            }
        }
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Char(c) => write!(f, "{c}"),
            KeyToken::Named(n) => write!(f, "<{}>", n.name()),
            KeyToken::Chord { base, mods } => {
                f.write_str("<")?;
                if mods.contains(ModMask::CTRL) {
                    f.write_str("C-")?;
                }
                if mods.contains(ModMask::ALT) {
                    f.write_str("A-")?;
                }
                if mods.contains(ModMask::SHIFT) {
                    f.write_str("S-")?;
                }
                match base.as_ref() {
                    KeyToken::Named(n) => f.write_str(&n.name())?,
                    other => write!(f, "{other}")?,
                }
                f.write_str(">")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyToken),
    /// New terminal size in columns and rows.
    Resize(u16, u16),
    /// The source has no more input (end of a script, closed terminal).
    Closed,
}

/// Blocking input provider polled once per controller cycle.
pub trait EventSource {
    /// Wait up to `timeout` for the next event. `Ok(None)` means the timeout
    /// elapsed. Errors are transient read failures; callers may keep polling.
    fn poll(&mut self, timeout: Duration) -> Result<Option<InputEvent>>;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn poll(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        (**self).poll(timeout)
    }
}

/// One step of a [`ScriptedSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Event(InputEvent),
    Timeout,
    Fail(String),
}

/// Replays a fixed list of steps, then reports [`InputEvent::Closed`].
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
    polls: usize,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            polls: 0,
        }
    }

    /// Script of plain key presses.
    pub fn keys(keys: impl IntoIterator<Item = KeyToken>) -> Self {
        Self::new(keys.into_iter().map(|k| ScriptStep::Event(InputEvent::Key(k))))
    }

    /// Number of times `poll` has been called.
    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl EventSource for ScriptedSource {
    fn poll(&mut self, _timeout: Duration) -> Result<Option<InputEvent>> {
        self.polls += 1;
        match self.steps.pop_front() {
            Some(ScriptStep::Event(ev)) => Ok(Some(ev)),
            Some(ScriptStep::Timeout) => Ok(None),
            Some(ScriptStep::Fail(msg)) => Err(anyhow!(msg)),
            None => {
                tracing::trace!(target: "input", polls = self.polls, "script_exhausted");
                Ok(Some(InputEvent::Closed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shift_is_folded_into_chars() {
        let t = KeyToken::with_mods(KeyToken::Char('K'), ModMask::SHIFT);
        assert_eq!(t, KeyToken::Char('K'));
    }

    #[test]
    fn ctrl_builds_chord() {
        let t = KeyToken::with_mods(KeyToken::Char('c'), ModMask::CTRL);
        assert_eq!(
            t,
            KeyToken::Chord {
                base: Box::new(KeyToken::Char('c')),
                mods: ModMask::CTRL
            }
        );
        assert_eq!(t.to_string(), "<C-c>");
    }

    #[test]
    fn shift_kept_on_named_keys() {
        let t = KeyToken::with_mods(KeyToken::Named(NamedKey::Down), ModMask::SHIFT);
        assert_eq!(t.to_string(), "<S-Down>");
    }

    #[test]
    fn named_key_lookup() {
        assert_eq!(NamedKey::from_name("ESCAPE"), Some(NamedKey::Esc));
        assert_eq!(NamedKey::from_name("f12"), Some(NamedKey::F(12)));
        assert_eq!(NamedKey::from_name("F0"), None);
        assert_eq!(NamedKey::from_name("bogus"), None);
        assert_eq!(NamedKey::from_name(&NamedKey::PageDown.name()), Some(NamedKey::PageDown));
    }

    #[test]
    fn script_replays_then_closes() {
        let mut src = ScriptedSource::new([
            ScriptStep::Event(InputEvent::Key(KeyToken::Char('j'))),
            ScriptStep::Timeout,
            ScriptStep::Fail("boom".into()),
        ]);
        let t = Duration::from_millis(1);
        assert_eq!(src.poll(t).unwrap(), Some(InputEvent::Key(KeyToken::Char('j'))));
        assert_eq!(src.poll(t).unwrap(), None);
        assert!(src.poll(t).is_err());
        assert_eq!(src.poll(t).unwrap(), Some(InputEvent::Closed));
        assert_eq!(src.polls(), 4);
    }
}
