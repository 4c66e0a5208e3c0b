use ratatui::text::{Line, Span};

use super::{keys, navigate, theme, Command, Context, Msg, View, ViewId};
use crate::models::Filter;
use crate::storage::VaultHandle;

const ITEMS: [(&str, ViewId); 2] = [("Secrets", ViewId::SecretList), ("Tasks", ViewId::TaskList)];

#[derive(Default)]
pub struct Menu {
    vault: Option<VaultHandle>,
    cursor: usize,
    secret_count: usize,
    pending_count: usize,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.secret_count, self.pending_count)
    }

    /// Reloads both counts; a failing store keeps the previous value.
    pub fn refresh_counts(&mut self) {
        let Some(vault) = &self.vault else {
            return;
        };
        match vault.secrets().list() {
            Ok(secrets) => self.secret_count = secrets.len(),
            Err(e) => tracing::warn!(error = %e, "menu: listing secrets failed"),
        }
        match vault.tasks().list(&Filter::pending()) {
            Ok(tasks) => self.pending_count = tasks.len(),
            Err(e) => tracing::warn!(error = %e, "menu: listing tasks failed"),
        }
    }
}

impl View for Menu {
    fn update(&mut self, msg: Msg, _ctx: &Context) -> Vec<Command> {
        let Msg::Key(key) = msg else {
            return Vec::new();
        };
        if keys::is_up(&key) {
            self.cursor = self.cursor.saturating_sub(1);
        } else if keys::is_down(&key) {
            self.cursor = (self.cursor + 1).min(ITEMS.len() - 1);
        } else if keys::is_enter(&key) {
            return vec![navigate(ITEMS[self.cursor].1)];
        }
        Vec::new()
    }

    fn render(&self, _ctx: &Context) -> Vec<Line<'static>> {
        let counts = [
            format!("({})", self.secret_count),
            format!("({} pending)", self.pending_count),
        ];
        let mut lines = vec![Line::default()];
        for (i, ((label, _), count)) in ITEMS.iter().zip(counts).enumerate() {
            let selected = i == self.cursor;
            let (cursor, style) = if selected {
                (Span::styled(theme::CURSOR, theme::accent()), theme::accent())
            } else {
                (Span::raw(theme::NO_CURSOR), theme::text())
            };
            lines.push(Line::from(vec![
                Span::raw("  "),
                cursor,
                Span::styled(*label, style),
                Span::styled(format!(" {count}"), theme::muted()),
            ]));
        }
        lines
    }

    fn attach(&mut self, vault: VaultHandle) {
        self.vault = Some(vault);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use crossterm::event::KeyCode;

    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Secret, Task};
    use crate::storage::{JsonVault, Vault};
    use crate::ui::keys::{key, press};
    use crate::ui::{plain, Payload};

    fn ctx() -> Context {
        Context {
            clock: Arc::new(FixedClock::at_unix(0)),
            totp_tick: Duration::from_secs(1),
        }
    }

    #[test]
    fn cursor_is_bounded() {
        let mut menu = Menu::new();
        menu.update(Msg::Key(key('k')), &ctx());
        assert_eq!(menu.cursor(), 0);
        for _ in 0..3 {
            menu.update(Msg::Key(press(KeyCode::Down)), &ctx());
        }
        assert_eq!(menu.cursor(), 1);
    }

    #[test]
    fn enter_navigates_to_selected_list() {
        let mut menu = Menu::new();
        menu.update(Msg::Key(key('j')), &ctx());
        let cmds = menu.update(Msg::Key(press(KeyCode::Enter)), &ctx());
        assert!(matches!(
            cmds.as_slice(),
            [Command::Emit(Msg::Navigate { view: ViewId::TaskList, payload: Payload::None })]
        ));
    }

    #[test]
    fn counts_show_total_secrets_and_pending_tasks() {
        let vault = Arc::new(JsonVault::in_memory());
        let now = Utc::now();
        vault.secrets().add(Secret::note("a", "x", now)).unwrap();
        vault.tasks().add(Task::new("open", now)).unwrap();
        let mut done = Task::new("closed", now);
        done.toggle_done(now);
        vault.tasks().add(done).unwrap();

        let mut menu = Menu::new();
        menu.attach(vault);
        menu.refresh_counts();
        assert_eq!(menu.counts(), (1, 1));
        let screen = plain(&menu.render(&ctx()));
        assert!(screen.contains("Secrets (1)"));
        assert!(screen.contains("Tasks (1 pending)"));
    }
}
