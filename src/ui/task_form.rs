//! Create/edit form for tasks. A `Payload::Task` opens it in edit mode.

use crossterm::event::KeyEvent;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use super::input::TextInput;
use super::{keys, navigate, theme, Command, Context, Msg, Payload, View, ViewId};
use crate::dates;
use crate::errors::Result;
use crate::models::{parse_tags, Priority, Task};
use crate::storage::VaultHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Priority,
    Due,
    Tags,
}

impl Field {
    const ORDER: [Field; 4] = [Field::Title, Field::Priority, Field::Due, Field::Tags];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

pub struct TaskForm {
    vault: Option<VaultHandle>,
    editing: Option<Task>,
    title: TextInput,
    due: TextInput,
    tags: TextInput,
    priority: Priority,
    focus: Field,
    error: Option<String>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    pub fn new() -> Self {
        Self {
            vault: None,
            editing: None,
            title: TextInput::new("task title"),
            due: TextInput::new("YYYY-MM-DD, tomorrow, +3d, next week"),
            tags: TextInput::new("comma-separated tags"),
            priority: Priority::None,
            focus: Field::Title,
            error: None,
        }
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    fn load(&mut self, task: Option<Task>) {
        match &task {
            Some(t) => {
                self.title.set_value(&t.title);
                self.due.set_value(&dates::format_for_edit(t.due));
                self.tags.set_value(&t.tags.join(", "));
                self.priority = t.priority;
            }
            None => {
                self.title.clear();
                self.due.clear();
                self.tags.clear();
                self.priority = Priority::None;
            }
        }
        self.editing = task;
        self.focus = Field::Title;
        self.error = None;
    }

    /// Moves focus unless the due field holds text the date grammar rejects.
    fn move_focus(&mut self, to: Field, ctx: &Context) {
        if self.focus == Field::Due {
            if let Err(e) = dates::parse(self.due.value(), ctx.clock.today()) {
                self.error = Some(e.to_string());
                return;
            }
        }
        self.focus = to;
    }

    fn save(&mut self, ctx: &Context) -> Vec<Command> {
        let title = self.title.value().trim().to_string();
        if title.is_empty() {
            self.error = Some("title is required".into());
            return Vec::new();
        }
        match self.persist(title, ctx) {
            Ok(()) => vec![navigate(ViewId::TaskList)],
            Err(e) => {
                tracing::warn!(error = %e, "task form: save failed");
                self.error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    fn persist(&self, title: String, ctx: &Context) -> Result<()> {
        let due = dates::parse(self.due.value(), ctx.clock.today())?;
        let Some(vault) = &self.vault else {
            return Ok(());
        };
        let mut task = match &self.editing {
            Some(original) => original.clone(),
            None => Task::new(title.clone(), ctx.clock.now_utc()),
        };
        task.title = title;
        task.priority = self.priority;
        task.due = due;
        task.tags = parse_tags(self.tags.value());
        if self.editing.is_some() {
            vault.tasks().update(task)
        } else {
            vault.tasks().add(task)
        }
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &Context) -> Vec<Command> {
        self.error = None;
        if keys::is_back(&key) {
            return vec![navigate(ViewId::TaskList)];
        }
        if keys::is_save(&key) {
            return self.save(ctx);
        }
        if keys::is_backtab(&key) {
            self.move_focus(self.focus.prev(), ctx);
            return Vec::new();
        }
        if keys::is_tab(&key) {
            self.move_focus(self.focus.next(), ctx);
            return Vec::new();
        }
        if keys::is_enter(&key) {
            match self.focus {
                Field::Priority => self.priority = self.priority.next(),
                Field::Tags => return self.save(ctx),
                Field::Title | Field::Due => self.move_focus(self.focus.next(), ctx),
            }
            return Vec::new();
        }
        match self.focus {
            Field::Priority if keys::is_space(&key) => self.priority = self.priority.next(),
            Field::Priority => {}
            Field::Title => {
                self.title.handle_key(&key);
            }
            Field::Due => {
                self.due.handle_key(&key);
            }
            Field::Tags => {
                self.tags.handle_key(&key);
            }
        }
        Vec::new()
    }

    fn label(&self, field: Field, text: &'static str) -> Line<'static> {
        let style = if self.focus == field {
            theme::accent()
        } else {
            theme::label()
        };
        Line::from(Span::styled(format!("  {text}"), style))
    }

    fn input_line(&self, field: Field, input: &TextInput) -> Line<'static> {
        let mut spans = vec![Span::raw("  ")];
        spans.extend(input.spans(self.focus == field));
        Line::from(spans)
    }

    fn priority_line(&self) -> Line<'static> {
        let style = match self.priority {
            Priority::High => theme::error().add_modifier(Modifier::BOLD),
            Priority::Medium => theme::warn(),
            Priority::Low | Priority::None => theme::text(),
        };
        let value = Span::styled(self.priority.label(), style);
        if self.focus == Field::Priority {
            Line::from(vec![
                Span::raw("  "),
                Span::styled(theme::CURSOR, theme::accent()),
                value,
                Span::styled(" (enter/space to cycle)", theme::muted()),
            ])
        } else {
            Line::from(vec![Span::raw("    "), value])
        }
    }
}

impl View for TaskForm {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Vec<Command> {
        match msg {
            Msg::Navigate { payload, .. } => {
                match payload {
                    Payload::Task(task) => self.load(Some(task)),
                    Payload::None | Payload::Id(_) => self.load(None),
                }
                Vec::new()
            }
            Msg::Key(key) => self.handle_key(key, ctx),
            _ => Vec::new(),
        }
    }

    fn render(&self, _ctx: &Context) -> Vec<Line<'static>> {
        let mode = if self.editing.is_some() {
            "edit task"
        } else {
            "new task"
        };
        let mut lines = vec![
            Line::default(),
            Line::from(Span::styled(format!("  {mode}"), theme::accent())),
            Line::default(),
            self.label(Field::Title, "title"),
            self.input_line(Field::Title, &self.title),
            Line::default(),
            self.label(Field::Priority, "priority"),
            self.priority_line(),
            Line::default(),
            self.label(Field::Due, "due date"),
            self.input_line(Field::Due, &self.due),
            Line::default(),
            self.label(Field::Tags, "tags"),
            self.input_line(Field::Tags, &self.tags),
        ];
        if let Some(err) = &self.error {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(format!("  {err}"), theme::error())));
        }
        lines
    }

    fn attach(&mut self, vault: VaultHandle) {
        self.vault = Some(vault);
    }

    fn captures_text(&self) -> bool {
        true
    }
}
