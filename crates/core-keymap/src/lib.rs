//! core-keymap: key token to controller action table.
//!
//! Design principles:
//! - Pure and deterministic: resolution depends only on the token.
//! - Bindings are single keys; the browser has no multi-key sequences.
//! - A key bound twice resolves to the later binding (logged at TRACE).
//! - Key names are parsed once, when the keymap is built from config.
//!
//! Key name syntax: a single character (`"k"`), a named key with or without
//! angle brackets (`"Up"`, `"<Down>"`, `"Esc"`), or a chord in angle brackets
//! with `C-`, `A-`, `S-` prefixes (`"<C-c>"`, `"<A-Up>"`).

use core_events::{KeyToken, ModMask, NamedKey};
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    Delete,
    Exit,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::MoveUp, Action::MoveDown, Action::Delete, Action::Exit];

    /// Name of the action's `[keys]` entry in the config file.
    pub fn config_name(self) -> &'static str {
        match self {
            Action::MoveUp => "up",
            Action::MoveDown => "down",
            Action::Delete => "delete",
            Action::Exit => "exit",
        }
    }

    pub fn default_keys(self) -> &'static [&'static str] {
        match self {
            Action::MoveUp => &["k", "Up"],
            Action::MoveDown => &["j", "Down"],
            Action::Delete => &["d", "Delete"],
            Action::Exit => &["q", "Esc", "<C-c>"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("empty key name")]
    Empty,
    #[error("unknown key name `{0}`")]
    Unknown(String),
    #[error("unknown modifier in `{0}`")]
    Modifier(String),
}

/// Parse one key name into a token.
pub fn parse_key(name: &str) -> Result<KeyToken, KeyParseError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        // A literal space is a valid single-character binding.
        return if name.is_empty() {
            Err(KeyParseError::Empty)
        } else {
            Ok(KeyToken::Char(' '))
        };
    }
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyToken::Char(c));
    }
    let inner = trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(trimmed);
    if inner.is_empty() {
        return Err(KeyParseError::Unknown(name.to_string()));
    }

    let mut mods = ModMask::empty();
    let mut rest = inner;
    while let Some((prefix, tail)) = split_modifier(rest) {
        let bit = match prefix.to_ascii_uppercase() {
            'C' => ModMask::CTRL,
            'A' | 'M' => ModMask::ALT,
            'S' => ModMask::SHIFT,
            _ => return Err(KeyParseError::Modifier(name.to_string())),
        };
        mods |= bit;
        rest = tail;
    }

    let mut rest_chars = rest.chars();
    let base = match (rest_chars.next(), rest_chars.next()) {
        (Some(c), None) => KeyToken::Char(c),
        _ => NamedKey::from_name(rest)
            .map(KeyToken::Named)
            .ok_or_else(|| KeyParseError::Unknown(name.to_string()))?,
    };
    Ok(KeyToken::with_mods(base, mods))
}

/// Split `X-rest` into its modifier letter and remainder. A trailing `-` is a
/// key, not a separator.
fn split_modifier(s: &str) -> Option<(char, &str)> {
    let mut chars = s.chars();
    let prefix = chars.next()?;
    let tail = chars.as_str().strip_prefix('-')?;
    if tail.is_empty() || !prefix.is_ascii_alphabetic() {
        return None;
    }
    Some((prefix, tail))
}

#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeyToken, Action>,
}

impl Keymap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in bindings.
    pub fn with_defaults() -> Self {
        let mut map = Self::empty();
        for action in Action::ALL {
            for key in action.default_keys() {
                if let Ok(token) = parse_key(key) {
                    map.bind(token, action);
                }
            }
        }
        map
    }

    pub fn bind(&mut self, token: KeyToken, action: Action) {
        if let Some(prev) = self.bindings.insert(token.clone(), action)
            && prev != action
        {
            trace!(target: "input.map", key = %token, ?prev, ?action, "binding_override");
        }
    }

    /// Replace every binding of `action` with `keys`. Unparseable names are
    /// returned and skipped.
    pub fn rebind<S: AsRef<str>>(&mut self, action: Action, keys: &[S]) -> Vec<KeyParseError> {
        self.bindings.retain(|_, a| *a != action);
        let mut errors = Vec::new();
        for key in keys {
            match parse_key(key.as_ref()) {
                Ok(token) => self.bind(token, action),
                Err(e) => errors.push(e),
            }
        }
        debug!(target: "input.map", action = action.config_name(), keys = keys.len(), errors = errors.len(), "rebind");
        errors
    }

    pub fn resolve(&self, token: &KeyToken) -> Option<Action> {
        let action = self.bindings.get(token).copied();
        trace!(target: "input.map", key = %token, ?action, "resolve");
        action
    }

    /// Keys bound to `action`, sorted by display form.
    pub fn keys_for(&self, action: Action) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| k.to_string())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn named(n: NamedKey) -> KeyToken {
        KeyToken::Named(n)
    }

    #[test]
    fn parse_single_chars() {
        assert_eq!(parse_key("k"), Ok(KeyToken::Char('k')));
        assert_eq!(parse_key("<"), Ok(KeyToken::Char('<')));
        assert_eq!(parse_key(" "), Ok(KeyToken::Char(' ')));
    }

    #[test]
    fn parse_named_with_and_without_brackets() {
        assert_eq!(parse_key("Up"), Ok(named(NamedKey::Up)));
        assert_eq!(parse_key("<Down>"), Ok(named(NamedKey::Down)));
        assert_eq!(parse_key("esc"), Ok(named(NamedKey::Esc)));
        assert_eq!(parse_key("Delete"), Ok(named(NamedKey::Delete)));
    }

    #[test]
    fn parse_chords() {
        assert_eq!(parse_key("<C-c>").unwrap().to_string(), "<C-c>");
        assert_eq!(parse_key("<a-up>").unwrap().to_string(), "<A-Up>");
        assert_eq!(parse_key("<S-x>"), Ok(KeyToken::Char('x')));
        assert_eq!(parse_key("<C-->").unwrap().to_string(), "<C-->");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_key(""), Err(KeyParseError::Empty));
        assert_eq!(parse_key("<>"), Err(KeyParseError::Unknown("<>".into())));
        assert_eq!(parse_key("nope"), Err(KeyParseError::Unknown("nope".into())));
        assert_eq!(parse_key("<X-a>"), Err(KeyParseError::Modifier("<X-a>".into())));
    }

    #[test]
    fn defaults_resolve() {
        let map = Keymap::with_defaults();
        assert_eq!(map.resolve(&KeyToken::Char('k')), Some(Action::MoveUp));
        assert_eq!(map.resolve(&named(NamedKey::Down)), Some(Action::MoveDown));
        assert_eq!(map.resolve(&KeyToken::Char('d')), Some(Action::Delete));
        assert_eq!(map.resolve(&named(NamedKey::Esc)), Some(Action::Exit));
        assert_eq!(map.resolve(&KeyToken::Char('x')), None);
        assert_eq!(map.keys_for(Action::Exit), vec!["<C-c>", "<Esc>", "q"]);
    }

    #[test]
    fn rebind_replaces_action_keys() {
        let mut map = Keymap::with_defaults();
        let errors = map.rebind(Action::MoveUp, &["w", "bogus"]);
        assert_eq!(errors, vec![KeyParseError::Unknown("bogus".into())]);
        assert_eq!(map.resolve(&KeyToken::Char('k')), None);
        assert_eq!(map.resolve(&named(NamedKey::Up)), None);
        assert_eq!(map.resolve(&KeyToken::Char('w')), Some(Action::MoveUp));
    }

    #[test]
    fn later_binding_wins() {
        let mut map = Keymap::empty();
        map.bind(KeyToken::Char('x'), Action::Delete);
        map.bind(KeyToken::Char('x'), Action::Exit);
        assert_eq!(map.resolve(&KeyToken::Char('x')), Some(Action::Exit));
        assert_eq!(map.len(), 1);
    }
}
