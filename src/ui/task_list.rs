//! Task list with status/tag filter cycling, in-place completion and bulk
//! clearing of done tasks.

use std::cmp::Ordering;

use crossterm::event::KeyEvent;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use super::filter::{collect_tags, FilterCycle};
use super::{
    keys, navigate, navigate_with, report, scroll_start, theme, visible_rows, Command, Context,
    Msg, Payload, View, ViewId,
};
use crate::dates;
use crate::errors::Result;
use crate::models::{Filter, Priority, StatusFilter, Task};
use crate::storage::VaultHandle;

const BUCKETS: &[&str] = &["all", "pending", "done"];

/// Pending before done, then priority high to none, then soonest due date
/// with undated tasks last. Stable, so ties keep store order.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.done
            .cmp(&b.done)
            .then_with(|| b.priority.rank().cmp(&a.priority.rank()))
            .then_with(|| match (a.due, b.due) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirm {
    None,
    Delete,
    ClearDone,
}

pub struct TaskList {
    vault: Option<VaultHandle>,
    tasks: Vec<Task>,
    cursor: usize,
    height: u16,
    filter: FilterCycle,
    confirm: Confirm,
    done_count: usize,
    status: Option<String>,
}

impl Default for TaskList {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskList {
    pub fn new() -> Self {
        Self {
            vault: None,
            tasks: Vec::new(),
            cursor: 0,
            height: 24,
            filter: FilterCycle::new(BUCKETS),
            confirm: Confirm::None,
            done_count: 0,
            status: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn filter(&self) -> &FilterCycle {
        &self.filter
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn query(&self) -> Filter {
        if let Some(tag) = self.filter.tag() {
            return Filter::tagged(tag);
        }
        let status = match self.filter.bucket() {
            Some(1) => StatusFilter::Pending,
            Some(2) => StatusFilter::Done,
            _ => StatusFilter::All,
        };
        Filter {
            status,
            ..Filter::default()
        }
    }

    fn reload(&mut self) -> Result<()> {
        let Some(vault) = &self.vault else {
            return Ok(());
        };
        let all = vault.tasks().list(&Filter::default())?;
        self.done_count = all.iter().filter(|t| t.done).count();
        self.filter
            .set_tags(collect_tags(all.iter().map(|t| t.tags.as_slice())));

        let query = self.query();
        let mut tasks: Vec<Task> = all.into_iter().filter(|t| query.matches(t)).collect();
        sort_tasks(&mut tasks);
        self.tasks = tasks;
        self.cursor = self.cursor.min(self.tasks.len().saturating_sub(1));
        Ok(())
    }

    fn reload_or_report(&mut self) -> Vec<Command> {
        match self.reload() {
            Ok(()) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "task list: reload failed");
                vec![report(e)]
            }
        }
    }

    fn toggle_selected(&mut self, ctx: &Context) -> Vec<Command> {
        let (Some(vault), Some(task)) = (&self.vault, self.tasks.get(self.cursor)) else {
            return Vec::new();
        };
        let mut task = task.clone();
        task.toggle_done(ctx.clock.now_utc());
        if let Err(e) = vault.tasks().update(task) {
            tracing::warn!(error = %e, "task list: toggle failed");
            return vec![report(e)];
        }
        self.reload_or_report()
    }

    fn delete_selected(&mut self) -> Vec<Command> {
        let (Some(vault), Some(task)) = (&self.vault, self.tasks.get(self.cursor)) else {
            return Vec::new();
        };
        let title = task.title.clone();
        if let Err(e) = vault.tasks().delete(&task.id) {
            tracing::warn!(error = %e, "task list: delete failed");
            return vec![report(e)];
        }
        self.status = Some(format!("deleted '{title}'"));
        self.reload_or_report()
    }

    fn clear_done(&mut self) -> Vec<Command> {
        let Some(vault) = &self.vault else {
            return Vec::new();
        };
        match vault.tasks().clear_done() {
            Ok(n) => self.status = Some(format!("cleared {n} done tasks")),
            Err(e) => {
                tracing::warn!(error = %e, "task list: clear done failed");
                return vec![report(e)];
            }
        }
        self.reload_or_report()
    }

    fn confirm_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let pending = self.confirm;
        if keys::is_yes(&key) {
            self.confirm = Confirm::None;
            return match pending {
                Confirm::Delete => self.delete_selected(),
                Confirm::ClearDone => self.clear_done(),
                Confirm::None => Vec::new(),
            };
        }
        if keys::is_no(&key) {
            self.confirm = Confirm::None;
        }
        Vec::new()
    }
}

impl View for TaskList {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Vec<Command> {
        let key = match msg {
            Msg::Navigate { .. } => {
                self.confirm = Confirm::None;
                return self.reload_or_report();
            }
            Msg::Key(key) => key,
            _ => return Vec::new(),
        };
        if self.confirm != Confirm::None {
            return self.confirm_key(key);
        }

        if keys::is_back(&key) {
            return vec![navigate(ViewId::Menu)];
        } else if keys::is_up(&key) {
            self.cursor = self.cursor.saturating_sub(1);
        } else if keys::is_down(&key) {
            self.cursor = (self.cursor + 1).min(self.tasks.len().saturating_sub(1));
        } else if keys::is_enter(&key) {
            if let Some(task) = self.tasks.get(self.cursor) {
                return vec![navigate_with(ViewId::TaskDetail, Payload::Id(task.id.clone()))];
            }
        } else if keys::is_space(&key) {
            return self.toggle_selected(ctx);
        } else if keys::is_char(&key, 'n') {
            return vec![navigate(ViewId::TaskForm)];
        } else if keys::is_char(&key, 'd') {
            if !self.tasks.is_empty() {
                self.confirm = Confirm::Delete;
            }
        } else if keys::is_char(&key, 'x') {
            if self.done_count > 0 {
                self.confirm = Confirm::ClearDone;
            }
        } else if keys::is_tab(&key) {
            self.filter.advance();
            self.status = None;
            return self.reload_or_report();
        }
        Vec::new()
    }

    fn render(&self, ctx: &Context) -> Vec<Line<'static>> {
        let label = match self.filter.tag() {
            Some(tag) => format!("filter: #{tag}"),
            None => format!("filter: {}", BUCKETS[self.filter.bucket().unwrap_or(0)]),
        };
        let mut lines = vec![
            Line::default(),
            Line::from(Span::styled(format!("  {label}"), theme::muted())),
            Line::default(),
        ];

        if self.tasks.is_empty() {
            lines.push(Line::from(Span::styled("  no tasks", theme::muted())));
        } else {
            let today = ctx.clock.today();
            let visible = visible_rows(self.height);
            let start = scroll_start(self.cursor, visible, self.tasks.len());
            for (i, task) in self.tasks.iter().enumerate().skip(start).take(visible) {
                lines.push(row(task, i == self.cursor, today));
            }
            if self.tasks.len() > visible {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    format!("  ({} of {})", self.cursor + 1, self.tasks.len()),
                    theme::muted(),
                )));
            }
        }

        let prompt = match self.confirm {
            Confirm::Delete => self
                .tasks
                .get(self.cursor)
                .map(|t| format!("  Delete \"{}\"? (y/n)", t.title)),
            Confirm::ClearDone => Some(format!("  Clear {} done tasks? (y/n)", self.done_count)),
            Confirm::None => None,
        };
        if let Some(prompt) = prompt {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(prompt, theme::warn())));
        } else if let Some(status) = &self.status {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(format!("  {status}"), theme::ok())));
        }
        lines
    }

    fn resize(&mut self, _width: u16, height: u16) {
        self.height = height;
    }

    fn attach(&mut self, vault: VaultHandle) {
        self.vault = Some(vault);
    }
}

fn row(task: &Task, selected: bool, today: chrono::NaiveDate) -> Line<'static> {
    let cursor = if selected {
        Span::styled(theme::CURSOR, theme::accent())
    } else {
        Span::raw(theme::NO_CURSOR)
    };
    let check = if task.done { "[x]" } else { "[ ]" };
    let priority = match task.priority {
        Priority::High => Span::styled("!!", theme::error().add_modifier(Modifier::BOLD)),
        Priority::Medium => Span::styled(" !", theme::warn()),
        Priority::Low | Priority::None => Span::raw("  "),
    };
    let title_style = if task.done {
        theme::dim().add_modifier(Modifier::CROSSED_OUT)
    } else {
        theme::text()
    };

    let mut spans = vec![
        Span::raw("  "),
        cursor,
        Span::raw(format!("{check} ")),
        priority,
        Span::raw(" "),
        Span::styled(task.title.clone(), title_style),
    ];
    if task.due.is_some() {
        let style = if !task.done && dates::is_overdue(task.due, today) {
            theme::error()
        } else {
            theme::muted()
        };
        spans.push(Span::styled(
            format!("  due: {}", dates::format_due(task.due, today)),
            style,
        ));
    }
    if !task.tags.is_empty() {
        let tags: Vec<String> = task.tags.iter().map(|t| format!("#{t}")).collect();
        spans.push(Span::styled(format!("  {}", tags.join(" ")), theme::label()));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{NaiveDate, Utc};
    use crossterm::event::KeyCode;

    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{JsonVault, Vault};
    use crate::ui::keys::{key, press};
    use crate::ui::plain;

    fn ctx() -> Context {
        Context {
            clock: Arc::new(FixedClock::on_date(2026, 2, 18)),
            totp_tick: Duration::from_secs(1),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn task(title: &str, done: bool, priority: Priority, due: Option<NaiveDate>) -> Task {
        let mut t = Task::new(title, Utc::now());
        t.done = done;
        t.priority = priority;
        t.due = due;
        t
    }

    fn list_with(tasks: Vec<Task>) -> (Arc<JsonVault>, TaskList) {
        let vault = Arc::new(JsonVault::in_memory());
        for t in tasks {
            vault.tasks().add(t).unwrap();
        }
        let mut list = TaskList::new();
        list.attach(vault.clone());
        list.update(Msg::Navigate { view: ViewId::TaskList, payload: Payload::None }, &ctx());
        (vault, list)
    }

    fn titles(list: &TaskList) -> Vec<&str> {
        list.tasks().iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn sort_matches_documented_order() {
        let mut tasks = vec![
            task("A", true, Priority::High, None),
            task("B", false, Priority::Low, Some(day(20))),
            task("C", false, Priority::High, Some(day(25))),
            task("D", false, Priority::High, Some(day(19))),
            task("E", false, Priority::None, None),
        ];
        sort_tasks(&mut tasks);
        let order: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(order, ["D", "C", "B", "E", "A"]);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let mut tasks = vec![
            task("first", false, Priority::Medium, None),
            task("second", false, Priority::Medium, None),
        ];
        sort_tasks(&mut tasks);
        assert_eq!(tasks[0].title, "first");
    }

    #[test]
    fn tab_cycles_status_then_tags() {
        let mut tagged = task("tagged", false, Priority::None, None);
        tagged.tags = vec!["work".into()];
        let (_vault, mut list) =
            list_with(vec![tagged, task("closed", true, Priority::None, None)]);

        assert_eq!(list.tasks().len(), 2);
        list.update(Msg::Key(press(KeyCode::Tab)), &ctx());
        assert_eq!(titles(&list), ["tagged"]);
        list.update(Msg::Key(press(KeyCode::Tab)), &ctx());
        assert_eq!(titles(&list), ["closed"]);
        list.update(Msg::Key(press(KeyCode::Tab)), &ctx());
        assert!(plain(&list.render(&ctx())).contains("filter: #work"));
        assert_eq!(titles(&list), ["tagged"]);
        list.update(Msg::Key(press(KeyCode::Tab)), &ctx());
        assert!(plain(&list.render(&ctx())).contains("filter: all"));
    }

    #[test]
    fn space_toggles_and_resorts() {
        let (vault, mut list) = list_with(vec![
            task("one", false, Priority::None, None),
            task("two", false, Priority::None, None),
        ]);
        list.update(Msg::Key(key(' ')), &ctx());
        assert_eq!(titles(&list), ["two", "one"]);
        let stored = vault.tasks().list(&Filter::done()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].completed_at, Some(ctx().clock.now_utc()));
    }

    #[test]
    fn clear_done_needs_done_tasks_and_confirmation() {
        let (vault, mut list) = list_with(vec![task("open", false, Priority::None, None)]);
        list.update(Msg::Key(key('x')), &ctx());
        assert!(!plain(&list.render(&ctx())).contains("(y/n)"));

        vault.tasks().add(task("a", true, Priority::None, None)).unwrap();
        vault.tasks().add(task("b", true, Priority::None, None)).unwrap();
        list.update(Msg::Navigate { view: ViewId::TaskList, payload: Payload::None }, &ctx());
        list.update(Msg::Key(key('x')), &ctx());
        assert!(plain(&list.render(&ctx())).contains("Clear 2 done tasks? (y/n)"));
        list.update(Msg::Key(key('y')), &ctx());
        assert_eq!(list.status(), Some("cleared 2 done tasks"));
        assert_eq!(titles(&list), ["open"]);
    }

    #[test]
    fn delete_prompt_names_task() {
        let (vault, mut list) = list_with(vec![task("ship it", false, Priority::None, None)]);
        list.update(Msg::Key(key('d')), &ctx());
        assert!(plain(&list.render(&ctx())).contains("Delete \"ship it\"? (y/n)"));
        list.update(Msg::Key(key('y')), &ctx());
        assert!(vault.tasks().list(&Filter::default()).unwrap().is_empty());
        assert!(plain(&list.render(&ctx())).contains("no tasks"));
    }

    #[test]
    fn rows_show_markers_due_and_tags() {
        let mut overdue = task("pay rent", false, Priority::High, Some(day(16)));
        overdue.tags = vec!["home".into(), "money".into()];
        let (_vault, list) = list_with(vec![overdue]);
        let screen = plain(&list.render(&ctx()));
        assert!(screen.contains("[ ] !! pay rent  due: overdue by 2 days  #home #money"));
    }

    #[test]
    fn scroll_indicator_when_overflowing() {
        let many = (0..10).map(|i| task(&format!("t{i}"), false, Priority::None, None)).collect();
        let (_vault, mut list) = list_with(many);
        list.resize(80, 12);
        for _ in 0..5 {
            list.update(Msg::Key(key('j')), &ctx());
        }
        let screen = plain(&list.render(&ctx()));
        assert!(screen.contains("(6 of 10)"));
        assert!(screen.contains("t5"));
        assert!(!screen.contains("t0"));
    }

    #[test]
    fn empty_list_ignores_actions() {
        let (_vault, mut list) = list_with(Vec::new());
        assert!(list.update(Msg::Key(press(KeyCode::Enter)), &ctx()).is_empty());
        assert!(list.update(Msg::Key(key(' ')), &ctx()).is_empty());
        list.update(Msg::Key(key('d')), &ctx());
        assert!(!plain(&list.render(&ctx())).contains("(y/n)"));
    }
}
