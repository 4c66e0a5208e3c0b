//! Secret list: type/tag filter cycling, incremental search and delete.

use ratatui::text::{Line, Span};

use super::filter::{collect_tags, FilterCycle};
use super::input::TextInput;
use super::{
    keys, navigate, navigate_with, report, scroll_start, theme, visible_rows, Command, Context,
    Msg, Payload, View, ViewId,
};
use crate::errors::Result;
use crate::models::{Secret, SecretKind};
use crate::storage::VaultHandle;

const BUCKETS: &[&str] = &["all", "password", "api key", "ssh key", "note"];

pub struct SecretList {
    vault: Option<VaultHandle>,
    /// Unfiltered records, or the search result while a query is set.
    base: Vec<Secret>,
    items: Vec<Secret>,
    cursor: usize,
    height: u16,
    filter: FilterCycle,
    searching: bool,
    query: TextInput,
    confirm_delete: bool,
    status: Option<String>,
}

impl Default for SecretList {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretList {
    pub fn new() -> Self {
        Self {
            vault: None,
            base: Vec::new(),
            items: Vec::new(),
            cursor: 0,
            height: 24,
            filter: FilterCycle::new(BUCKETS),
            searching: false,
            query: TextInput::new("name, tag or type"),
            confirm_delete: false,
            status: None,
        }
    }

    pub fn items(&self) -> &[Secret] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn filter(&self) -> &FilterCycle {
        &self.filter
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn selected(&self) -> Option<&Secret> {
        self.items.get(self.cursor)
    }

    fn reload(&mut self) -> Result<()> {
        let Some(vault) = &self.vault else {
            return Ok(());
        };
        let query = self.query.value().trim();
        self.base = if query.is_empty() {
            vault.secrets().list()?
        } else {
            vault.secrets().search(query)?
        };
        self.filter
            .set_tags(collect_tags(self.base.iter().map(|s| s.tags.as_slice())));
        self.apply_filter();
        Ok(())
    }

    fn reload_or_report(&mut self) -> Vec<Command> {
        match self.reload() {
            Ok(()) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "secret list: reload failed");
                vec![report(e)]
            }
        }
    }

    fn apply_filter(&mut self) {
        let kind = self
            .filter
            .bucket()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| SecretKind::ALL.get(i).copied());
        let tag = self.filter.tag();
        self.items = self
            .base
            .iter()
            .filter(|s| kind.is_none_or(|k| s.kind == k))
            .filter(|s| tag.is_none_or(|t| s.has_tag(t)))
            .cloned()
            .collect();
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
    }

    fn delete_selected(&mut self) -> Vec<Command> {
        self.confirm_delete = false;
        let (Some(vault), Some(secret)) = (&self.vault, self.selected()) else {
            return Vec::new();
        };
        let name = secret.name.clone();
        if let Err(e) = vault.secrets().delete(&secret.id) {
            tracing::warn!(error = %e, "secret list: delete failed");
            return vec![report(e)];
        }
        self.status = Some(format!("deleted '{name}'"));
        self.reload_or_report()
    }

    fn handle_search_key(&mut self, key: crossterm::event::KeyEvent) -> Vec<Command> {
        if keys::is_back(&key) {
            self.searching = false;
            self.query.clear();
            return self.reload_or_report();
        }
        if keys::is_enter(&key) {
            self.searching = false;
            return Vec::new();
        }
        if self.query.handle_key(&key) {
            return self.reload_or_report();
        }
        Vec::new()
    }
}

impl View for SecretList {
    fn update(&mut self, msg: Msg, _ctx: &Context) -> Vec<Command> {
        let key = match msg {
            Msg::Navigate { .. } => {
                self.confirm_delete = false;
                self.status = None;
                return self.reload_or_report();
            }
            Msg::Key(key) => key,
            _ => return Vec::new(),
        };

        if self.confirm_delete {
            if keys::is_yes(&key) {
                return self.delete_selected();
            }
            if keys::is_no(&key) {
                self.confirm_delete = false;
            }
            return Vec::new();
        }
        if self.searching {
            return self.handle_search_key(key);
        }

        if keys::is_up(&key) {
            self.cursor = self.cursor.saturating_sub(1);
        } else if keys::is_down(&key) {
            self.cursor = (self.cursor + 1).min(self.items.len().saturating_sub(1));
        } else if keys::is_enter(&key) {
            if let Some(secret) = self.selected() {
                return vec![navigate_with(ViewId::SecretDetail, Payload::Id(secret.id.clone()))];
            }
        } else if keys::is_char(&key, 'n') {
            return vec![navigate(ViewId::SecretForm)];
        } else if keys::is_char(&key, 'd') {
            self.confirm_delete = !self.items.is_empty();
        } else if keys::is_char(&key, '/') {
            self.searching = true;
            self.status = None;
        } else if keys::is_tab(&key) {
            self.filter.advance();
            self.status = None;
            self.apply_filter();
        } else if keys::is_back(&key) {
            return vec![navigate(ViewId::Menu)];
        }
        Vec::new()
    }

    fn render(&self, _ctx: &Context) -> Vec<Line<'static>> {
        let mut lines = vec![self.filter_line()];

        if self.searching || !self.query.value().is_empty() {
            let mut spans = vec![Span::styled("  search: ", theme::label())];
            if self.searching {
                spans.extend(self.query.spans(true).into_iter().skip(1));
            } else {
                spans.push(Span::styled(self.query.value().to_string(), theme::text()));
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::default());

        if self.items.is_empty() {
            lines.push(Line::from(Span::styled("  no secrets found", theme::muted())));
        } else {
            let visible = visible_rows(self.height);
            let start = scroll_start(self.cursor, visible, self.items.len());
            for (i, secret) in self.items.iter().enumerate().skip(start).take(visible) {
                lines.push(row(secret, i == self.cursor));
            }
        }

        lines.push(Line::default());
        if self.confirm_delete {
            if let Some(secret) = self.selected() {
                lines.push(Line::from(Span::styled(
                    format!("  delete '{}'? (y/n)", secret.name),
                    theme::warn(),
                )));
            }
        } else if let Some(status) = &self.status {
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

    fn captures_text(&self) -> bool {
        self.searching
    }
}

impl SecretList {
    fn filter_line(&self) -> Line<'static> {
        let mut spans = vec![Span::raw("  ")];
        for (i, label) in BUCKETS.iter().enumerate() {
            let style = if self.filter.bucket() == Some(i) {
                theme::accent()
            } else {
                theme::dim()
            };
            spans.push(Span::styled(*label, style));
            spans.push(Span::raw("  "));
        }
        if let Some(tag) = self.filter.tag() {
            spans.push(Span::styled(format!("#{tag}"), theme::accent()));
        } else if !self.filter.tags().is_empty() {
            spans.push(Span::styled("tags", theme::dim()));
        }
        Line::from(spans)
    }
}

fn row(secret: &Secret, selected: bool) -> Line<'static> {
    let (cursor, name_style) = if selected {
        (Span::styled(theme::CURSOR, theme::accent()), theme::accent())
    } else {
        (Span::raw(theme::NO_CURSOR), theme::text())
    };
    let mut spans = vec![
        Span::raw("  "),
        cursor,
        Span::styled(secret.name.clone(), name_style),
        Span::styled(format!(" {}", secret.kind.badge()), theme::muted()),
    ];
    if !secret.tags.is_empty() {
        spans.push(Span::styled(
            format!(" [{}]", secret.tags.join(", ")),
            theme::dim(),
        ));
    }
    Line::from(spans)
}
