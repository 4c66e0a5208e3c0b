//! Single-line text field.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

use super::theme;

const MASK_CHAR: char = '•';

#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    /// Cursor position in chars, `0..=len`.
    cursor: usize,
    masked: bool,
    placeholder: &'static str,
}

impl TextInput {
    pub fn new(placeholder: &'static str) -> Self {
        Self {
            placeholder,
            ..Self::default()
        }
    }

    pub fn masked(placeholder: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::new(placeholder)
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_masked(&self) -> bool {
        self.masked
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_at(&self, pos: usize) -> usize {
        self.value
            .char_indices()
            .nth(pos)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Applies an editing key. Returns true when the value changed; keys
    /// that only move the cursor or are not editing keys return false.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => {
                let at = self.byte_at(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_at(self.cursor);
                self.value.remove(at);
                true
            }
            KeyCode::Delete if self.cursor < self.len() => {
                let at = self.byte_at(self.cursor);
                self.value.remove(at);
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.len());
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor = self.len();
                false
            }
            _ => false,
        }
    }

    /// What the field shows: the value, or one bullet per char when masked.
    pub fn display(&self) -> String {
        if self.masked {
            std::iter::repeat(MASK_CHAR).take(self.len()).collect()
        } else {
            self.value.clone()
        }
    }

    pub fn spans(&self, focused: bool) -> Vec<Span<'static>> {
        let prompt = Span::styled("> ", if focused { theme::accent() } else { theme::dim() });
        if self.value.is_empty() && !focused {
            return vec![prompt, Span::styled(self.placeholder, theme::dim())];
        }
        if !focused {
            return vec![prompt, Span::styled(self.display(), theme::text())];
        }

        let shown: Vec<char> = self.display().chars().collect();
        let before: String = shown[..self.cursor].iter().collect();
        let under = shown.get(self.cursor).copied().unwrap_or(' ');
        let after: String = shown.get(self.cursor + 1..).map(|s| s.iter().collect()).unwrap_or_default();
        let mut spans = vec![prompt, Span::styled(before, theme::text())];
        spans.push(Span::styled(
            under.to_string(),
            Style::default().add_modifier(Modifier::REVERSED),
        ));
        if !after.is_empty() {
            spans.push(Span::styled(after, theme::text()));
        }
        if self.value.is_empty() {
            spans.push(Span::styled(self.placeholder, theme::dim()));
        }
        spans
    }
}
