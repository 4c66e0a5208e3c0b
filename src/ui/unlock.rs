//! Master password prompt. Creates the vault on first run (password plus
//! confirmation) or unlocks an existing one.

use std::path::{Path, PathBuf};

use ratatui::text::{Line, Span};

use super::input::TextInput;
use super::{keys, theme, Command, Context, Msg, Sensitive, View};
use crate::storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Password,
    Confirm,
}

pub struct Unlock {
    dir: PathBuf,
    first_run: bool,
    password: TextInput,
    confirm: TextInput,
    focus: Field,
    error: Option<String>,
    busy: bool,
}

impl Unlock {
    pub fn new(dir: &Path) -> Self {
        Self::with_first_run(dir, storage::is_first_run(dir))
    }

    pub fn with_first_run(dir: &Path, first_run: bool) -> Self {
        Self {
            dir: dir.to_path_buf(),
            first_run,
            password: TextInput::masked("master password"),
            confirm: TextInput::masked("confirm password"),
            focus: Field::Password,
            error: None,
            busy: false,
        }
    }

    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Drops typed passwords once the vault is open.
    pub fn unlocked(&mut self) {
        self.password.clear();
        self.confirm.clear();
        self.busy = false;
    }

    fn submit(&mut self) -> Vec<Command> {
        if self.busy {
            return Vec::new();
        }
        if self.password.value().is_empty() {
            self.error = Some("password cannot be empty".into());
            return Vec::new();
        }
        if self.first_run {
            if self.focus == Field::Password {
                self.focus = Field::Confirm;
                return Vec::new();
            }
            if self.password.value() != self.confirm.value() {
                self.error = Some("passwords do not match".into());
                self.confirm.clear();
                return Vec::new();
            }
        }
        self.busy = true;
        vec![Command::OpenVault {
            dir: self.dir.clone(),
            password: Sensitive::new(self.password.value()),
        }]
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Password => Field::Confirm,
            Field::Confirm => Field::Password,
        };
    }
}

impl View for Unlock {
    fn update(&mut self, msg: Msg, _ctx: &Context) -> Vec<Command> {
        match msg {
            Msg::Error(text) => {
                self.error = Some(text);
                self.busy = false;
                Vec::new()
            }
            Msg::Key(key) => {
                self.error = None;
                if keys::is_enter(&key) {
                    return self.submit();
                }
                if keys::is_tab(&key) {
                    if self.first_run {
                        self.toggle_focus();
                    }
                    return Vec::new();
                }
                match self.focus {
                    Field::Password => self.password.handle_key(&key),
                    Field::Confirm => self.confirm.handle_key(&key),
                };
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, _ctx: &Context) -> Vec<Line<'static>> {
        let (title, hint) = if self.first_run {
            ("create new vault", "Choose a master password to protect your vault.")
        } else {
            ("unlock vault", "Enter your master password.")
        };

        let mut lines = vec![
            Line::default(),
            Line::from(Span::styled(format!("  {title}"), theme::accent())),
            Line::from(Span::styled(format!("  {hint}"), theme::muted())),
            Line::default(),
            Line::from(Span::styled("  password", theme::label())),
            field_line(&self.password, self.focus == Field::Password),
        ];
        if self.first_run {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("  confirm", theme::label())));
            lines.push(field_line(&self.confirm, self.focus == Field::Confirm));
        }
        if let Some(err) = &self.error {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(format!("  {err}"), theme::error())));
        } else if self.busy {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("  opening vault...", theme::muted())));
        }
        lines
    }

    fn captures_text(&self) -> bool {
        true
    }
}

fn field_line(input: &TextInput, focused: bool) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    spans.extend(input.spans(focused));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crossterm::event::KeyCode;

    use super::*;
    use crate::clock::FixedClock;
    use crate::ui::keys::{key, press};
    use crate::ui::plain;

    fn ctx() -> Context {
        Context {
            clock: Arc::new(FixedClock::at_unix(0)),
            totp_tick: Duration::from_secs(1),
        }
    }

    fn type_text(view: &mut Unlock, text: &str) {
        for c in text.chars() {
            view.update(Msg::Key(key(c)), &ctx());
        }
    }

    fn enter(view: &mut Unlock) -> Vec<Command> {
        view.update(Msg::Key(press(KeyCode::Enter)), &ctx())
    }

    #[test]
    fn empty_password_is_rejected_without_store_call() {
        let mut view = Unlock::with_first_run(Path::new("/tmp/v"), false);
        assert!(enter(&mut view).is_empty());
        assert_eq!(view.error(), Some("password cannot be empty"));
    }

    #[test]
    fn returning_user_submits_on_enter() {
        let mut view = Unlock::with_first_run(Path::new("/tmp/v"), false);
        type_text(&mut view, "secret");
        let cmds = enter(&mut view);
        match cmds.as_slice() {
            [Command::OpenVault { dir, password }] => {
                assert_eq!(dir, Path::new("/tmp/v"));
                assert_eq!(password.expose(), "secret");
            }
            other => panic!("unexpected commands: {other:?}"),
        }
        assert!(view.is_busy());
        assert!(enter(&mut view).is_empty(), "no second open while busy");
    }

    #[test]
    fn first_run_moves_to_confirm_then_checks_match() {
        let mut view = Unlock::with_first_run(Path::new("/tmp/v"), true);
        type_text(&mut view, "abc");
        assert!(enter(&mut view).is_empty());
        assert_eq!(view.focus(), Field::Confirm);

        type_text(&mut view, "abd");
        assert!(enter(&mut view).is_empty());
        assert_eq!(view.error(), Some("passwords do not match"));
        assert_eq!(view.focus(), Field::Confirm);
        assert_eq!(view.confirm.value(), "");

        type_text(&mut view, "abc");
        let cmds = enter(&mut view);
        assert!(matches!(cmds.as_slice(), [Command::OpenVault { .. }]));
    }

    #[test]
    fn tab_only_toggles_on_first_run() {
        let mut returning = Unlock::with_first_run(Path::new("/tmp/v"), false);
        returning.update(Msg::Key(press(KeyCode::Tab)), &ctx());
        assert_eq!(returning.focus(), Field::Password);

        let mut fresh = Unlock::with_first_run(Path::new("/tmp/v"), true);
        fresh.update(Msg::Key(press(KeyCode::Tab)), &ctx());
        assert_eq!(fresh.focus(), Field::Confirm);
    }

    #[test]
    fn store_error_shown_inline_and_input_kept() {
        let mut view = Unlock::with_first_run(Path::new("/tmp/v"), false);
        type_text(&mut view, "wrong");
        enter(&mut view);
        view.update(Msg::Error("incorrect password or corrupted vault".into()), &ctx());
        assert!(!view.is_busy());
        assert_eq!(view.password.value(), "wrong");
        let screen = plain(&view.render(&ctx()));
        assert!(screen.contains("incorrect password"));
        assert!(!screen.contains("wrong"));

        view.update(Msg::Key(key('x')), &ctx());
        assert_eq!(view.error(), None);
    }

    #[test]
    fn titles_follow_mode() {
        let fresh = Unlock::with_first_run(Path::new("/tmp/v"), true);
        assert!(plain(&fresh.render(&ctx())).contains("create new vault"));
        let returning = Unlock::with_first_run(Path::new("/tmp/v"), false);
        assert!(plain(&returning.render(&ctx())).contains("unlock vault"));
    }
}
