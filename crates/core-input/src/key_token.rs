use core_events::{KeyToken, ModMask, NamedKey};
use crossterm::event::{
    KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKeyEventKind,
    KeyModifiers as CKeyModifiers,
};

/// Map a crossterm key event into a key token.
///
/// Returns `None` for releases and for key codes with no binding use (media
/// keys, lone modifiers).
pub(crate) fn map_key_event(event: &CKeyEvent) -> Option<KeyToken> {
    if matches!(event.kind, CKeyEventKind::Release) {
        return None;
    }
    let base = map_key_token(&event.code)?;
    Some(KeyToken::with_mods(base, map_mod_mask(event.modifiers)))
}

/// Convert a crossterm key code into a bare key token.
pub(crate) fn map_key_token(code: &CKeyCode) -> Option<KeyToken> {
    if let CKeyCode::Char(c) = code {
        return Some(KeyToken::Char(*c));
    }
    named_key(code).map(KeyToken::Named)
}

fn named_key(code: &CKeyCode) -> Option<NamedKey> {
    Some(match code {
        CKeyCode::Enter => NamedKey::Enter,
        CKeyCode::Esc => NamedKey::Esc,
        CKeyCode::Backspace => NamedKey::Backspace,
        CKeyCode::Tab | CKeyCode::BackTab => NamedKey::Tab,
        CKeyCode::Up => NamedKey::Up,
        CKeyCode::Down => NamedKey::Down,
        CKeyCode::Left => NamedKey::Left,
        CKeyCode::Right => NamedKey::Right,
        CKeyCode::Home => NamedKey::Home,
        CKeyCode::End => NamedKey::End,
        CKeyCode::PageUp => NamedKey::PageUp,
        CKeyCode::PageDown => NamedKey::PageDown,
        CKeyCode::Insert => NamedKey::Insert,
        CKeyCode::Delete => NamedKey::Delete,
        CKeyCode::F(n) => NamedKey::F(*n),
        _ => return None,
    })
}

const MOD_TABLE: [(CKeyModifiers, ModMask); 3] = [
    (CKeyModifiers::CONTROL, ModMask::CTRL),
    (CKeyModifiers::ALT, ModMask::ALT),
    (CKeyModifiers::SHIFT, ModMask::SHIFT),
];

pub(crate) fn map_mod_mask(mods: CKeyModifiers) -> ModMask {
    MOD_TABLE
        .iter()
        .filter(|(ct, _)| mods.contains(*ct))
        .fold(ModMask::empty(), |acc, (_, m)| acc | *m)
}
