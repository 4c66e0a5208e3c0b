//! Key predicates shared by every view, plus constructors used by tests.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn plain(key: &KeyEvent) -> bool {
    !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

pub fn is_char(key: &KeyEvent, c: char) -> bool {
    key.code == KeyCode::Char(c) && plain(key)
}

pub fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.code == KeyCode::Char(c) && key.modifiers.contains(KeyModifiers::CONTROL)
}

pub fn is_ctrl_c(key: &KeyEvent) -> bool {
    is_ctrl(key, 'c')
}

pub fn is_quit(key: &KeyEvent) -> bool {
    is_char(key, 'q')
}

pub fn is_save(key: &KeyEvent) -> bool {
    is_ctrl(key, 's')
}

pub fn is_up(key: &KeyEvent) -> bool {
    key.code == KeyCode::Up || is_char(key, 'k')
}

pub fn is_down(key: &KeyEvent) -> bool {
    key.code == KeyCode::Down || is_char(key, 'j')
}

pub fn is_enter(key: &KeyEvent) -> bool {
    key.code == KeyCode::Enter
}

pub fn is_back(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
}

pub fn is_tab(key: &KeyEvent) -> bool {
    key.code == KeyCode::Tab && !key.modifiers.contains(KeyModifiers::SHIFT)
}

/// Terminals report shift+tab either as `BackTab` or as `Tab` with SHIFT.
pub fn is_backtab(key: &KeyEvent) -> bool {
    key.code == KeyCode::BackTab
        || (key.code == KeyCode::Tab && key.modifiers.contains(KeyModifiers::SHIFT))
}

pub fn is_space(key: &KeyEvent) -> bool {
    is_char(key, ' ')
}

pub fn is_yes(key: &KeyEvent) -> bool {
    is_char(key, 'y') || is_char(key, 'Y')
}

pub fn is_no(key: &KeyEvent) -> bool {
    is_char(key, 'n') || is_char(key, 'N') || is_back(key)
}

pub fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn key(c: char) -> KeyEvent {
    press(KeyCode::Char(c))
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}
