use chrono::{DateTime, Local, Utc};
use crossterm::event::KeyEvent;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use super::{keys, navigate, navigate_with, report, theme, Command, Context, Msg, Payload, View, ViewId};
use crate::dates;
use crate::models::{Priority, Task};
use crate::storage::VaultHandle;

const LABEL_WIDTH: usize = 12;

#[derive(Default)]
pub struct TaskDetail {
    vault: Option<VaultHandle>,
    task: Option<Task>,
    confirm_delete: bool,
}

impl TaskDetail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    fn load(&mut self, id: &str) -> Vec<Command> {
        self.confirm_delete = false;
        self.task = None;
        let Some(vault) = &self.vault else {
            return Vec::new();
        };
        match vault.tasks().get(id) {
            Ok(task) => {
                self.task = Some(task);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "task detail: load failed");
                vec![report(e)]
            }
        }
    }

    fn toggle(&mut self, ctx: &Context) -> Vec<Command> {
        let (Some(vault), Some(task)) = (&self.vault, &mut self.task) else {
            return Vec::new();
        };
        let mut updated = task.clone();
        updated.toggle_done(ctx.clock.now_utc());
        if let Err(e) = vault.tasks().update(updated.clone()) {
            tracing::warn!(error = %e, "task detail: toggle failed");
            return vec![report(e)];
        }
        *task = updated;
        Vec::new()
    }

    fn confirm_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if keys::is_yes(&key) {
            self.confirm_delete = false;
            let (Some(vault), Some(task)) = (&self.vault, &self.task) else {
                return Vec::new();
            };
            if let Err(e) = vault.tasks().delete(&task.id) {
                tracing::warn!(error = %e, "task detail: delete failed");
                return vec![report(e)];
            }
            return vec![navigate(ViewId::TaskList)];
        }
        if keys::is_no(&key) {
            self.confirm_delete = false;
        }
        Vec::new()
    }
}

impl View for TaskDetail {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Vec<Command> {
        match msg {
            Msg::Navigate { payload, .. } => match payload {
                Payload::Id(id) => self.load(&id),
                Payload::Task(task) => self.load(&task.id),
                Payload::None => Vec::new(),
            },
            Msg::Key(key) if self.confirm_delete => self.confirm_key(key),
            Msg::Key(key) => {
                if keys::is_back(&key) {
                    return vec![navigate(ViewId::TaskList)];
                }
                let Some(task) = &self.task else {
                    return Vec::new();
                };
                if keys::is_char(&key, 'e') {
                    return vec![navigate_with(ViewId::TaskForm, Payload::Task(task.clone()))];
                }
                if keys::is_space(&key) {
                    return self.toggle(ctx);
                }
                if keys::is_char(&key, 'd') {
                    self.confirm_delete = true;
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, ctx: &Context) -> Vec<Line<'static>> {
        let Some(task) = &self.task else {
            return vec![
                Line::default(),
                Line::from(Span::styled("  no task selected", theme::muted())),
            ];
        };
        let today = ctx.clock.today();

        let mut lines = vec![
            Line::default(),
            Line::from(Span::styled(
                format!("  {}", task.title),
                theme::text().add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];

        let (status, status_style) = if task.done {
            ("done", theme::ok())
        } else {
            ("pending", theme::warn())
        };
        lines.push(field("status", status.to_string(), status_style));

        let priority_style = match task.priority {
            Priority::High => theme::error(),
            Priority::Medium => theme::warn(),
            Priority::Low | Priority::None => theme::text(),
        };
        lines.push(field("priority", task.priority.label().to_string(), priority_style));

        if let Some(due) = task.due {
            let style = if !task.done && dates::is_overdue(task.due, today) {
                theme::error()
            } else {
                theme::text()
            };
            let shown = format!(
                "{} ({})",
                dates::format_relative(due, today),
                dates::format_for_edit(task.due)
            );
            lines.push(field("due", shown, style));
        }
        if !task.tags.is_empty() {
            let tags: Vec<String> = task.tags.iter().map(|t| format!("#{t}")).collect();
            lines.push(field("tags", tags.join(" "), theme::label()));
        }
        lines.push(field("created", timestamp(task.created_at), theme::muted()));
        if let Some(done_at) = task.completed_at {
            lines.push(field("completed", timestamp(done_at), theme::muted()));
        }

        if self.confirm_delete {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("  delete \"{}\"? (y/n)", task.title),
                theme::warn(),
            )));
        }
        lines
    }

    fn attach(&mut self, vault: VaultHandle) {
        self.vault = Some(vault);
    }
}

fn field(label: &str, value: String, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<width$}", width = LABEL_WIDTH), theme::muted()),
        Span::styled(value, style),
    ])
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::NaiveDate;
    use crossterm::event::KeyCode;

    use super::*;
    use crate::clock::FixedClock;
    use crate::models::Filter;
    use crate::storage::{JsonVault, Vault};
    use crate::ui::keys::{key, press};
    use crate::ui::plain;

    fn ctx() -> Context {
        Context {
            clock: Arc::new(FixedClock::on_date(2026, 2, 18)),
            totp_tick: Duration::from_secs(1),
        }
    }

    fn open(task: Task) -> (Arc<JsonVault>, TaskDetail) {
        let vault = Arc::new(JsonVault::in_memory());
        let id = task.id.clone();
        vault.tasks().add(task).unwrap();
        let mut detail = TaskDetail::new();
        detail.attach(vault.clone());
        detail.update(Msg::Navigate { view: ViewId::TaskDetail, payload: Payload::Id(id) }, &ctx());
        (vault, detail)
    }

    #[test]
    fn renders_status_priority_due_and_tags() {
        let mut task = Task::new("file taxes", Utc::now());
        task.priority = Priority::High;
        task.due = NaiveDate::from_ymd_opt(2026, 2, 21);
        task.tags = vec!["home".into()];
        let (_vault, detail) = open(task);

        let screen = plain(&detail.render(&ctx()));
        assert!(screen.contains("file taxes"));
        assert!(screen.contains("pending"));
        assert!(screen.contains("high"));
        assert!(screen.contains("in 3 days (2026-02-21)"));
        assert!(screen.contains("#home"));
        assert!(!screen.contains("completed"));
    }

    #[test]
    fn space_toggles_done_in_store() {
        let (vault, mut detail) = open(Task::new("ship", Utc::now()));
        detail.update(Msg::Key(key(' ')), &ctx());
        assert!(detail.task().unwrap().done);
        assert_eq!(vault.tasks().list(&Filter::done()).unwrap().len(), 1);
        assert!(plain(&detail.render(&ctx())).contains("completed"));

        detail.update(Msg::Key(key(' ')), &ctx());
        assert!(vault.tasks().list(&Filter::done()).unwrap().is_empty());
    }

    #[test]
    fn edit_carries_full_task() {
        let task = Task::new("ship", Utc::now());
        let expected = task.clone();
        let (_vault, mut detail) = open(task);
        let cmds = detail.update(Msg::Key(key('e')), &ctx());
        assert!(matches!(
            cmds.as_slice(),
            [Command::Emit(Msg::Navigate { view: ViewId::TaskForm, payload: Payload::Task(t) })] if *t == expected
        ));
    }

    #[test]
    fn delete_then_back_to_list() {
        let (vault, mut detail) = open(Task::new("ship", Utc::now()));
        detail.update(Msg::Key(key('d')), &ctx());
        assert!(plain(&detail.render(&ctx())).contains("delete \"ship\"? (y/n)"));
        let cmds = detail.update(Msg::Key(key('y')), &ctx());
        assert!(matches!(
            cmds.as_slice(),
            [Command::Emit(Msg::Navigate { view: ViewId::TaskList, .. })]
        ));
        assert!(vault.tasks().list(&Filter::default()).unwrap().is_empty());
    }

    #[test]
    fn missing_task_renders_placeholder() {
        let mut detail = TaskDetail::new();
        detail.attach(Arc::new(JsonVault::in_memory()));
        let cmds = detail.update(
            Msg::Navigate { view: ViewId::TaskDetail, payload: Payload::Id("nope".into()) },
            &ctx(),
        );
        assert_eq!(cmds.len(), 1);
        assert!(plain(&detail.render(&ctx())).contains("no task selected"));
        let back = detail.update(Msg::Key(press(KeyCode::Esc)), &ctx());
        assert!(matches!(back.as_slice(), [Command::Emit(Msg::Navigate { .. })]));
    }
}
