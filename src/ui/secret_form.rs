//! Create/edit form for secrets.

use std::collections::BTreeMap;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::text::{Line, Span};

use super::input::TextInput;
use super::{keys, navigate, theme, Command, Context, Msg, Payload, View, ViewId};
use crate::errors::Result;
use crate::models::{parse_tags, Secret, SecretKind};
use crate::storage::VaultHandle;

struct FormInput {
    label: &'static str,
    key: &'static str,
    input: TextInput,
}

impl FormInput {
    fn new(label: &'static str, key: &'static str, value: &str, masked: bool) -> Self {
        let input = if masked {
            TextInput::masked(label)
        } else {
            TextInput::new(label)
        };
        Self {
            label,
            key,
            input: input.with_value(value),
        }
    }
}

/// Inputs for `kind`: name first, tags last, credential fields masked.
fn build_inputs(kind: SecretKind, secret: Option<&Secret>) -> Vec<FormInput> {
    let value = |key: &str| secret.map(|s| s.field(key)).unwrap_or("");
    let mut inputs = vec![FormInput::new("name", "name", secret.map_or("", |s| s.name.as_str()), false)];

    let spec: &[(&'static str, &'static str, bool)] = match kind {
        SecretKind::Password => &[
            ("url", "url", false),
            ("username", "username", false),
            ("password", "password", true),
            ("totp secret", "totp_secret", true),
            ("notes", "notes", false),
        ],
        SecretKind::ApiKey => &[
            ("service", "service", false),
            ("key", "key", true),
            ("notes", "notes", false),
        ],
        SecretKind::SshKey => &[
            ("label", "label", false),
            ("private key", "private_key", true),
            ("public key", "public_key", false),
            ("passphrase", "passphrase", true),
            ("notes", "notes", false),
        ],
        SecretKind::Note => &[("content", "content", false)],
    };
    for &(label, key, masked) in spec {
        inputs.push(FormInput::new(label, key, value(key), masked));
    }

    let tags = secret.map(|s| s.tags.join(", ")).unwrap_or_default();
    inputs.push(FormInput::new("tags", "tags", &tags, false));
    inputs
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Create,
    Edit(String),
}

pub struct SecretForm {
    vault: Option<VaultHandle>,
    mode: Mode,
    kind: SecretKind,
    inputs: Vec<FormInput>,
    /// `None` is the type selector, only reachable in create mode.
    focus: Option<usize>,
    dirty: bool,
    confirm_discard: bool,
    error: Option<String>,
}

impl Default for SecretForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretForm {
    pub fn new() -> Self {
        Self {
            vault: None,
            mode: Mode::Create,
            kind: SecretKind::Password,
            inputs: build_inputs(SecretKind::Password, None),
            focus: None,
            dirty: false,
            confirm_discard: false,
            error: None,
        }
    }

    pub fn kind(&self) -> SecretKind {
        self.kind
    }

    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::Edit(_))
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.inputs.iter().map(|i| i.label).collect()
    }

    fn reset(&mut self, mode: Mode) {
        self.mode = mode;
        self.dirty = false;
        self.confirm_discard = false;
        self.error = None;
    }

    fn init_create(&mut self) {
        self.reset(Mode::Create);
        self.kind = SecretKind::Password;
        self.inputs = build_inputs(self.kind, None);
        self.focus = None;
    }

    fn init_edit(&mut self, id: String) {
        let loaded = match &self.vault {
            Some(vault) => vault.secrets().get(&id),
            None => return,
        };
        self.reset(Mode::Edit(id));
        match loaded {
            Ok(secret) => {
                self.kind = secret.kind;
                self.inputs = build_inputs(secret.kind, Some(&secret));
                self.focus = Some(0);
            }
            Err(e) => {
                tracing::warn!(error = %e, "secret form: load failed");
                self.error = Some(e.to_string());
            }
        }
    }

    fn cycle_kind(&mut self, forward: bool) {
        let len = SecretKind::ALL.len();
        let at = SecretKind::ALL
            .iter()
            .position(|k| *k == self.kind)
            .unwrap_or(0);
        let next = if forward { (at + 1) % len } else { (at + len - 1) % len };
        self.kind = SecretKind::ALL[next];

        let name = self.inputs.first().map(|i| i.input.value().to_string()).unwrap_or_default();
        self.inputs = build_inputs(self.kind, None);
        if let Some(first) = self.inputs.first_mut() {
            first.input.set_value(&name);
        }
    }

    fn last(&self) -> usize {
        self.inputs.len().saturating_sub(1)
    }

    fn focus_next(&mut self) {
        self.focus = match self.focus {
            None => Some(0),
            Some(i) => Some((i + 1).min(self.last())),
        };
    }

    fn focus_prev(&mut self) {
        self.focus = match (self.focus, &self.mode) {
            (Some(0), Mode::Create) => None,
            (Some(i), _) => Some(i.saturating_sub(1)),
            (None, _) => None,
        };
    }

    fn value(&self, key: &str) -> &str {
        self.inputs
            .iter()
            .find(|i| i.key == key)
            .map(|i| i.input.value())
            .unwrap_or("")
    }

    fn save(&mut self, ctx: &Context) -> Vec<Command> {
        let name = self.value("name").trim().to_string();
        if name.is_empty() {
            self.error = Some("name is required".into());
            return Vec::new();
        }
        let tags = parse_tags(self.value("tags"));

        let result = match &self.mode {
            Mode::Create => self.create(name, tags, ctx),
            Mode::Edit(id) => self.update_existing(id, name, tags, ctx),
        };
        match result {
            Ok(()) => vec![navigate(ViewId::SecretList)],
            Err(e) => {
                tracing::warn!(error = %e, "secret form: save failed");
                self.error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    fn create(&self, name: String, tags: Vec<String>, ctx: &Context) -> Result<()> {
        let Some(vault) = &self.vault else {
            return Ok(());
        };
        let mut fields = BTreeMap::new();
        for key in self.kind.required_fields() {
            fields.insert(key.to_string(), self.value(key).to_string());
        }
        for key in self.kind.optional_fields() {
            let value = self.value(key);
            if !value.is_empty() {
                fields.insert(key.to_string(), value.to_string());
            }
        }
        let mut secret = Secret::new(self.kind, name, fields, ctx.clock.now_utc())?;
        secret.tags = tags;
        vault.secrets().add(secret)
    }

    fn update_existing(&self, id: &str, name: String, tags: Vec<String>, ctx: &Context) -> Result<()> {
        let Some(vault) = &self.vault else {
            return Ok(());
        };
        let mut secret = vault.secrets().get(id)?;
        secret.name = name;
        secret.tags = tags;
        for key in secret.kind.required_fields() {
            secret.set_field(key, self.value(key));
        }
        for key in secret.kind.optional_fields() {
            let value = self.value(key);
            if value.is_empty() {
                secret.fields.remove(*key);
            } else {
                secret.set_field(key, value);
            }
        }
        secret.updated_at = ctx.clock.now_utc();
        vault.secrets().update(secret)
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &Context) -> Vec<Command> {
        if self.confirm_discard {
            if keys::is_yes(&key) {
                self.confirm_discard = false;
                return vec![navigate(ViewId::SecretList)];
            }
            if keys::is_no(&key) {
                self.confirm_discard = false;
            }
            return Vec::new();
        }
        self.error = None;

        if keys::is_save(&key) {
            return self.save(ctx);
        }
        if keys::is_back(&key) {
            if self.dirty {
                self.confirm_discard = true;
                return Vec::new();
            }
            return vec![navigate(ViewId::SecretList)];
        }
        if keys::is_backtab(&key) {
            self.dirty = true;
            self.focus_prev();
            return Vec::new();
        }
        if keys::is_tab(&key) {
            self.dirty = true;
            self.focus_next();
            return Vec::new();
        }
        if keys::is_enter(&key) {
            match self.focus {
                None => self.focus = Some(0),
                Some(i) if i == self.last() => return self.save(ctx),
                Some(_) => {
                    self.dirty = true;
                    self.focus_next();
                }
            }
            return Vec::new();
        }

        match self.focus {
            None if self.mode == Mode::Create => match key.code {
                KeyCode::Left => self.cycle_kind(false),
                KeyCode::Right => self.cycle_kind(true),
                _ => {}
            },
            None => {}
            Some(i) => {
                if let Some(field) = self.inputs.get_mut(i) {
                    if field.input.handle_key(&key) {
                        self.dirty = true;
                    }
                }
            }
        }
        Vec::new()
    }
}

impl View for SecretForm {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Vec<Command> {
        match msg {
            Msg::Navigate { payload, .. } => {
                match payload {
                    Payload::Id(id) => self.init_edit(id),
                    Payload::None | Payload::Task(_) => self.init_create(),
                }
                Vec::new()
            }
            Msg::Key(key) => self.handle_key(key, ctx),
            _ => Vec::new(),
        }
    }

    fn render(&self, _ctx: &Context) -> Vec<Line<'static>> {
        let mut lines = vec![Line::default()];

        if self.mode == Mode::Create {
            let selected = self.focus.is_none();
            let mut spans = vec![
                Span::raw("  "),
                cursor(selected),
                Span::styled("type", theme::label()),
                Span::raw("  "),
            ];
            for (i, kind) in SecretKind::ALL.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" | ", theme::dim()));
                }
                let style = if *kind == self.kind {
                    theme::accent()
                } else {
                    theme::muted()
                };
                spans.push(Span::styled(kind.label(), style));
            }
            if selected {
                spans.push(Span::styled("  (←/→ to change)", theme::muted()));
            }
            lines.push(Line::from(spans));
            lines.push(Line::default());
        }

        for (i, field) in self.inputs.iter().enumerate() {
            let focused = self.focus == Some(i);
            lines.push(Line::from(vec![
                Span::raw("  "),
                cursor(focused),
                Span::styled(field.label, theme::label()),
            ]));
            let mut spans = vec![Span::raw("    ")];
            spans.extend(field.input.spans(focused));
            lines.push(Line::from(spans));
            if i + 1 < self.inputs.len() {
                lines.push(Line::default());
            }
        }

        if self.confirm_discard {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("  Discard changes? (y/n)", theme::warn())));
        }
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

fn cursor(active: bool) -> Span<'static> {
    if active {
        Span::styled(theme::CURSOR, theme::accent())
    } else {
        Span::raw(theme::NO_CURSOR)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::storage::{JsonVault, Vault};
    use crate::ui::keys::{ctrl, key, press};
    use crate::ui::plain;

    fn ctx() -> Context {
        Context {
            clock: Arc::new(FixedClock::on_date(2026, 2, 18)),
            totp_tick: Duration::from_secs(1),
        }
    }

    fn form_with(vault: &Arc<JsonVault>, payload: Payload) -> SecretForm {
        let mut form = SecretForm::new();
        form.attach(vault.clone());
        form.update(Msg::Navigate { view: ViewId::SecretForm, payload }, &ctx());
        form
    }

    fn send(form: &mut SecretForm, k: KeyEvent) -> Vec<Command> {
        form.update(Msg::Key(k), &ctx())
    }

    fn type_text(form: &mut SecretForm, text: &str) {
        for c in text.chars() {
            send(form, key(c));
        }
    }

    #[test]
    fn create_password_secret() {
        let vault = Arc::new(JsonVault::in_memory());
        let mut form = form_with(&vault, Payload::None);
        assert_eq!(form.focus(), None);

        send(&mut form, press(KeyCode::Enter));
        type_text(&mut form, "github");
        send(&mut form, press(KeyCode::Tab));
        type_text(&mut form, "https://github.com");
        send(&mut form, press(KeyCode::Tab));
        type_text(&mut form, "me");
        send(&mut form, press(KeyCode::Tab));
        type_text(&mut form, "hunter2");
        send(&mut form, press(KeyCode::Tab));
        send(&mut form, press(KeyCode::Tab));
        send(&mut form, press(KeyCode::Tab));
        type_text(&mut form, "dev, , work");

        let cmds = send(&mut form, press(KeyCode::Enter));
        assert!(matches!(
            cmds.as_slice(),
            [Command::Emit(Msg::Navigate { view: ViewId::SecretList, .. })]
        ));
        let saved = vault.secrets().list().unwrap();
        assert_eq!(saved.len(), 1);
        let s = &saved[0];
        assert_eq!(s.kind, SecretKind::Password);
        assert_eq!(s.name, "github");
        assert_eq!(s.password_value(), "hunter2");
        assert_eq!(s.tags, vec!["dev", "work"]);
        assert!(!s.fields.contains_key("totp_secret"));
        assert_eq!(s.created_at, ctx().clock.now_utc());
    }

    #[test]
    fn blank_name_is_rejected_inline() {
        let vault = Arc::new(JsonVault::in_memory());
        let mut form = form_with(&vault, Payload::None);
        send(&mut form, press(KeyCode::Enter));
        type_text(&mut form, "   ");
        assert!(send(&mut form, ctrl('s')).is_empty());
        assert_eq!(form.error(), Some("name is required"));
        assert!(plain(&form.render(&ctx())).contains("name is required"));
        assert!(vault.secrets().list().unwrap().is_empty());

        send(&mut form, key('x'));
        assert_eq!(form.error(), None);
    }

    #[test]
    fn changing_type_keeps_name() {
        let vault = Arc::new(JsonVault::in_memory());
        let mut form = form_with(&vault, Payload::None);
        send(&mut form, press(KeyCode::Enter));
        type_text(&mut form, "aws");
        send(&mut form, press(KeyCode::BackTab));
        assert_eq!(form.focus(), None);

        send(&mut form, press(KeyCode::Right));
        assert_eq!(form.kind(), SecretKind::ApiKey);
        assert_eq!(form.labels(), ["name", "service", "key", "notes", "tags"]);
        assert_eq!(form.value("name"), "aws");

        send(&mut form, press(KeyCode::Left));
        send(&mut form, press(KeyCode::Left));
        assert_eq!(form.kind(), SecretKind::Note);
        assert_eq!(form.labels(), ["name", "content", "tags"]);
    }

    #[test]
    fn traversal_does_not_wrap() {
        let vault = Arc::new(JsonVault::in_memory());
        let mut form = form_with(&vault, Payload::None);
        send(&mut form, press(KeyCode::BackTab));
        assert_eq!(form.focus(), None);
        for _ in 0..20 {
            send(&mut form, press(KeyCode::Tab));
        }
        assert_eq!(form.focus(), Some(6));
        assert!(form.is_dirty());
    }

    #[test]
    fn esc_confirms_only_when_dirty() {
        let vault = Arc::new(JsonVault::in_memory());
        let mut form = form_with(&vault, Payload::None);
        let cmds = send(&mut form, press(KeyCode::Esc));
        assert!(matches!(cmds.as_slice(), [Command::Emit(Msg::Navigate { .. })]));

        let mut form = form_with(&vault, Payload::None);
        send(&mut form, press(KeyCode::Enter));
        type_text(&mut form, "x");
        assert!(send(&mut form, press(KeyCode::Esc)).is_empty());
        assert!(plain(&form.render(&ctx())).contains("Discard changes? (y/n)"));

        send(&mut form, key('n'));
        type_text(&mut form, "y");
        assert_eq!(form.value("name"), "xy");

        send(&mut form, press(KeyCode::Esc));
        let cmds = send(&mut form, key('y'));
        assert!(matches!(
            cmds.as_slice(),
            [Command::Emit(Msg::Navigate { view: ViewId::SecretList, .. })]
        ));
    }

    #[test]
    fn edit_merges_into_loaded_record() {
        let vault = Arc::new(JsonVault::in_memory());
        let created = Utc::now();
        let mut secret = Secret::api_key("aws", "s3", "OLD", created);
        secret.set_field("notes", "rotate soon");
        let id = secret.id.clone();
        vault.secrets().add(secret).unwrap();

        let mut form = form_with(&vault, Payload::Id(id.clone()));
        assert!(form.is_editing());
        assert_eq!(form.focus(), Some(0));
        assert_eq!(form.value("key"), "OLD");

        send(&mut form, press(KeyCode::Tab));
        send(&mut form, press(KeyCode::Tab));
        for _ in 0..3 {
            send(&mut form, press(KeyCode::Backspace));
        }
        type_text(&mut form, "NEW");
        send(&mut form, press(KeyCode::Tab));
        for _ in 0.."rotate soon".len() {
            send(&mut form, press(KeyCode::Backspace));
        }
        send(&mut form, ctrl('s'));

        let saved = vault.secrets().get(&id).unwrap();
        assert_eq!(saved.key(), "NEW");
        assert!(!saved.fields.contains_key("notes"));
        assert_eq!(saved.created_at, created);
        assert_eq!(saved.updated_at, ctx().clock.now_utc());
    }

    #[test]
    fn masked_fields_never_render_value() {
        let vault = Arc::new(JsonVault::in_memory());
        let secret = Secret::password("github", "u", "me", "hunter2", Utc::now());
        let id = secret.id.clone();
        vault.secrets().add(secret).unwrap();
        let form = form_with(&vault, Payload::Id(id));
        let screen = plain(&form.render(&ctx()));
        assert!(!screen.contains("hunter2"));
        assert!(screen.contains("github"));
        assert!(!screen.contains("(←/→ to change)"));
    }
}
