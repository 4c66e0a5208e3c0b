//! Secret detail: ordered field list with copy/open actions, a shared
//! show/hide bit for credential fields and a live TOTP code.

use chrono::{DateTime, Local, Utc};
use crossterm::event::KeyEvent;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use super::{
    keys, navigate, navigate_with, report, theme, Command, Context, Msg, Payload, Sensitive, View,
    ViewId,
};
use crate::models::{Secret, SecretKind};
use crate::storage::VaultHandle;
use crate::totp::{self, TotpCode};

const LABEL_WIDTH: usize = 14;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAction {
    None,
    Copy,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailField {
    pub label: &'static str,
    pub value: String,
    pub sensitive: bool,
    /// Regenerated on every TOTP tick instead of read from the record.
    pub live: bool,
    pub action: FieldAction,
}

impl DetailField {
    fn plain(label: &'static str, value: &str) -> Self {
        Self {
            label,
            value: value.to_string(),
            sensitive: false,
            live: false,
            action: FieldAction::None,
        }
    }

    fn copy(mut self) -> Self {
        self.action = FieldAction::Copy;
        self
    }

    fn open(mut self) -> Self {
        self.action = FieldAction::Open;
        self
    }

    fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

/// The fields shown for `secret`, in display order.
pub fn build_fields(secret: &Secret) -> Vec<DetailField> {
    let mut fields = vec![
        DetailField::plain("name", &secret.name),
        DetailField::plain("type", secret.kind.as_str()),
    ];
    let notes = |fields: &mut Vec<DetailField>| {
        if !secret.notes().is_empty() {
            fields.push(DetailField::plain("notes", secret.notes()));
        }
    };

    match secret.kind {
        SecretKind::Password => {
            fields.push(DetailField::plain("url", secret.url()).open());
            fields.push(DetailField::plain("username", secret.username()).copy());
            fields.push(DetailField::plain("password", secret.password_value()).sensitive().copy());
            if !secret.totp_secret().is_empty() {
                fields.push(DetailField::plain("totp secret", secret.totp_secret()).sensitive());
                fields.push(DetailField {
                    live: true,
                    ..DetailField::plain("totp code", "").copy()
                });
            }
            notes(&mut fields);
        }
        SecretKind::ApiKey => {
            fields.push(DetailField::plain("service", secret.service()));
            fields.push(DetailField::plain("key", secret.key()).sensitive().copy());
            notes(&mut fields);
        }
        SecretKind::SshKey => {
            fields.push(DetailField::plain("label", secret.label()));
            fields.push(DetailField::plain("private key", secret.private_key()).sensitive().copy());
            fields.push(DetailField::plain("public key", secret.public_key()).copy());
            if !secret.passphrase().is_empty() {
                fields.push(DetailField::plain("passphrase", secret.passphrase()).sensitive().copy());
            }
            notes(&mut fields);
        }
        SecretKind::Note => {
            fields.push(DetailField::plain("content", secret.content()));
        }
    }

    if !secret.tags.is_empty() {
        fields.push(DetailField::plain("tags", &secret.tags.join(", ")));
    }
    fields.push(DetailField::plain("created", &timestamp(secret.created_at)));
    fields.push(DetailField::plain("updated", &timestamp(secret.updated_at)));
    fields
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Totp {
    Pending,
    Code(TotpCode),
    Invalid,
}

pub struct SecretDetail {
    vault: Option<VaultHandle>,
    secret: Option<Secret>,
    fields: Vec<DetailField>,
    cursor: usize,
    reveal: bool,
    confirm_delete: bool,
    clipboard_msg: Option<String>,
    totp: Totp,
    generation: u64,
}

impl Default for SecretDetail {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretDetail {
    pub fn new() -> Self {
        Self {
            vault: None,
            secret: None,
            fields: Vec::new(),
            cursor: 0,
            reveal: false,
            confirm_delete: false,
            clipboard_msg: None,
            totp: Totp::Pending,
            generation: 0,
        }
    }

    pub fn fields(&self) -> &[DetailField] {
        &self.fields
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_revealed(&self) -> bool {
        self.reveal
    }

    pub fn clipboard_msg(&self) -> Option<&str> {
        self.clipboard_msg.as_deref()
    }

    /// Generation of the TOTP timer currently allowed to fire.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn has_totp(&self) -> bool {
        self.secret
            .as_ref()
            .is_some_and(|s| !s.totp_secret().is_empty())
    }

    fn load(&mut self, id: &str, ctx: &Context) -> Vec<Command> {
        self.secret = None;
        self.fields.clear();
        self.cursor = 0;
        self.reveal = false;
        self.confirm_delete = false;
        self.clipboard_msg = None;
        self.totp = Totp::Pending;
        self.generation += 1;

        let Some(vault) = &self.vault else {
            return Vec::new();
        };
        match vault.secrets().get(id) {
            Ok(secret) => {
                self.fields = build_fields(&secret);
                self.secret = Some(secret);
            }
            Err(e) => {
                tracing::warn!(error = %e, "secret detail: load failed");
                return vec![report(e)];
            }
        }
        if !self.has_totp() {
            return Vec::new();
        }
        self.refresh_totp(ctx);
        vec![self.schedule_tick(ctx)]
    }

    fn refresh_totp(&mut self, ctx: &Context) {
        let Some(secret) = &self.secret else {
            return;
        };
        self.totp = match totp::generate(secret.totp_secret(), ctx.clock.unix_time()) {
            Ok(code) => Totp::Code(code),
            Err(e) => {
                tracing::debug!(error = %e, "secret detail: totp generation failed");
                Totp::Invalid
            }
        };
    }

    fn schedule_tick(&self, ctx: &Context) -> Command {
        Command::ScheduleTotpTick {
            generation: self.generation,
            after: ctx.totp_tick,
        }
    }

    fn run_action(&self) -> Vec<Command> {
        let Some(field) = self.fields.get(self.cursor) else {
            return Vec::new();
        };
        match field.action {
            FieldAction::Copy => {
                let value = if field.live {
                    match &self.totp {
                        Totp::Code(code) => code.code.clone(),
                        Totp::Pending | Totp::Invalid => return Vec::new(),
                    }
                } else {
                    field.value.clone()
                };
                vec![Command::CopyToClipboard {
                    field: field.label.to_string(),
                    value: Sensitive::new(value),
                }]
            }
            FieldAction::Open if !field.value.is_empty() => {
                vec![Command::OpenUrl(field.value.clone())]
            }
            FieldAction::Open | FieldAction::None => Vec::new(),
        }
    }

    fn confirm_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if keys::is_yes(&key) {
            self.confirm_delete = false;
            let (Some(vault), Some(secret)) = (&self.vault, &self.secret) else {
                return Vec::new();
            };
            if let Err(e) = vault.secrets().delete(&secret.id) {
                tracing::warn!(error = %e, "secret detail: delete failed");
                return vec![report(e)];
            }
            return vec![navigate(ViewId::SecretList)];
        }
        if keys::is_no(&key) {
            self.confirm_delete = false;
        }
        Vec::new()
    }
}

impl View for SecretDetail {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Vec<Command> {
        match msg {
            Msg::Navigate {
                payload: Payload::Id(id),
                ..
            } => self.load(&id, ctx),
            Msg::TotpTick { generation } => {
                if generation != self.generation || !self.has_totp() {
                    tracing::trace!(generation, current = self.generation, "stale totp tick");
                    return Vec::new();
                }
                self.refresh_totp(ctx);
                vec![self.schedule_tick(ctx)]
            }
            Msg::ClipboardCopied { field, clears_in } => {
                self.clipboard_msg = Some(format!("copied {field} (clears in {}s)", clears_in.as_secs()));
                Vec::new()
            }
            Msg::ClipboardCleared => {
                self.clipboard_msg = None;
                Vec::new()
            }
            Msg::Key(key) if self.confirm_delete => self.confirm_key(key),
            Msg::Key(key) => {
                if keys::is_back(&key) {
                    return vec![navigate(ViewId::SecretList)];
                }
                if keys::is_up(&key) {
                    self.cursor = self.cursor.saturating_sub(1);
                } else if keys::is_down(&key) {
                    self.cursor = (self.cursor + 1).min(self.fields.len().saturating_sub(1));
                } else if keys::is_enter(&key) || keys::is_char(&key, 'c') {
                    return self.run_action();
                } else if keys::is_char(&key, 's') {
                    self.reveal = !self.reveal;
                } else if keys::is_char(&key, 'e') {
                    if let Some(secret) = &self.secret {
                        return vec![navigate_with(ViewId::SecretForm, Payload::Id(secret.id.clone()))];
                    }
                } else if keys::is_char(&key, 'd') {
                    self.confirm_delete = self.secret.is_some();
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, _ctx: &Context) -> Vec<Line<'static>> {
        let Some(secret) = &self.secret else {
            return vec![
                Line::default(),
                Line::from(Span::styled("  no secret selected", theme::muted())),
            ];
        };

        let mut lines = vec![Line::default()];
        for (i, field) in self.fields.iter().enumerate() {
            let cursor = if i == self.cursor {
                Span::styled(theme::CURSOR, theme::accent())
            } else {
                Span::raw(theme::NO_CURSOR)
            };
            let mut label_style = if field.sensitive {
                theme::warn()
            } else {
                theme::label()
            };
            if field.label == "name" {
                label_style = theme::accent().add_modifier(Modifier::BOLD);
            }
            let mut spans = vec![
                Span::raw("  "),
                cursor,
                Span::styled(format!("{:<width$}", field.label, width = LABEL_WIDTH), label_style),
                Span::raw("  "),
            ];
            spans.extend(self.value_spans(secret, field));
            lines.push(Line::from(spans));
        }

        if self.confirm_delete {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("  delete '{}'? (y/n)", secret.name),
                theme::warn(),
            )));
        }
        if let Some(msg) = &self.clipboard_msg {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(format!("  {msg}"), theme::ok())));
        }
        lines
    }

    fn attach(&mut self, vault: VaultHandle) {
        self.vault = Some(vault);
    }
}

impl SecretDetail {
    fn value_spans(&self, secret: &Secret, field: &DetailField) -> Vec<Span<'static>> {
        if field.live {
            return match &self.totp {
                Totp::Code(code) => vec![
                    Span::styled(code.code.clone(), theme::ok()),
                    Span::styled(format!(" ({}s)", code.remaining), theme::muted()),
                ],
                Totp::Pending => vec![Span::styled("generating...", theme::dim())],
                Totp::Invalid => vec![Span::styled("invalid totp secret", theme::error())],
            };
        }
        if field.label == "type" {
            return vec![Span::styled(secret.kind.badge(), theme::accent())];
        }
        if field.sensitive && !self.reveal {
            return vec![Span::styled(theme::MASK, theme::dim())];
        }
        vec![Span::styled(field.value.clone(), theme::text())]
    }
}
