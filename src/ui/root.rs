//! Root controller: owns every sub-controller, routes messages to the
//! active one and handles navigation, the vault handle, quitting, the error
//! banner and clipboard bookkeeping.

use std::path::Path;
use std::time::Duration;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::clipboard::ClipboardState;
use super::menu::Menu;
use super::secret_detail::SecretDetail;
use super::secret_form::SecretForm;
use super::secret_list::SecretList;
use super::task_detail::TaskDetail;
use super::task_form::TaskForm;
use super::task_list::TaskList;
use super::unlock::Unlock;
use super::{footer, keys, theme, Command, Context, Msg, View, ViewId};
use crate::clock::SharedClock;
use crate::config::Settings;
use crate::storage::VaultHandle;

const APP_NAME: &str = "zvault";

pub struct Model {
    view: ViewId,
    width: u16,
    height: u16,
    vault: Option<VaultHandle>,
    banner: Option<String>,
    clipboard: ClipboardState,
    ctx: Context,
    unlock: Unlock,
    menu: Menu,
    secret_list: SecretList,
    secret_detail: SecretDetail,
    secret_form: SecretForm,
    task_list: TaskList,
    task_detail: TaskDetail,
    task_form: TaskForm,
}

impl Model {
    pub fn new(vault_dir: &Path, clock: SharedClock, clipboard_clear: Duration, totp_tick: Duration) -> Self {
        Self::with_unlock(Unlock::new(vault_dir), clock, clipboard_clear, totp_tick)
    }

    pub fn from_settings(settings: &Settings, clock: SharedClock) -> Self {
        Self::new(
            &settings.vault_dir,
            clock,
            settings.clipboard_clear,
            settings.totp_tick,
        )
    }

    pub fn with_unlock(unlock: Unlock, clock: SharedClock, clipboard_clear: Duration, totp_tick: Duration) -> Self {
        Self {
            view: ViewId::Unlock,
            width: 80,
            height: 24,
            vault: None,
            banner: None,
            clipboard: ClipboardState::new(clipboard_clear),
            ctx: Context { clock, totp_tick },
            unlock,
            menu: Menu::new(),
            secret_list: SecretList::new(),
            secret_detail: SecretDetail::new(),
            secret_form: SecretForm::new(),
            task_list: TaskList::new(),
            task_detail: TaskDetail::new(),
            task_form: TaskForm::new(),
        }
    }

    pub fn view_id(&self) -> ViewId {
        self.view
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn vault(&self) -> Option<&VaultHandle> {
        self.vault.as_ref()
    }

    pub fn clipboard(&self) -> &ClipboardState {
        &self.clipboard
    }

    pub fn unlock(&self) -> &Unlock {
        &self.unlock
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn secret_list(&self) -> &SecretList {
        &self.secret_list
    }

    pub fn secret_detail(&self) -> &SecretDetail {
        &self.secret_detail
    }

    pub fn secret_form(&self) -> &SecretForm {
        &self.secret_form
    }

    pub fn task_list(&self) -> &TaskList {
        &self.task_list
    }

    pub fn task_detail(&self) -> &TaskDetail {
        &self.task_detail
    }

    pub fn task_form(&self) -> &TaskForm {
        &self.task_form
    }

    fn view_mut(&mut self, id: ViewId) -> &mut dyn View {
        match id {
            ViewId::Unlock => &mut self.unlock,
            ViewId::Menu => &mut self.menu,
            ViewId::SecretList => &mut self.secret_list,
            ViewId::SecretDetail => &mut self.secret_detail,
            ViewId::SecretForm => &mut self.secret_form,
            ViewId::TaskList => &mut self.task_list,
            ViewId::TaskDetail => &mut self.task_detail,
            ViewId::TaskForm => &mut self.task_form,
        }
    }

    fn view_ref(&self, id: ViewId) -> &dyn View {
        match id {
            ViewId::Unlock => &self.unlock,
            ViewId::Menu => &self.menu,
            ViewId::SecretList => &self.secret_list,
            ViewId::SecretDetail => &self.secret_detail,
            ViewId::SecretForm => &self.secret_form,
            ViewId::TaskList => &self.task_list,
            ViewId::TaskDetail => &self.task_detail,
            ViewId::TaskForm => &self.task_form,
        }
    }

    fn all_views(&mut self) -> [&mut dyn View; 8] {
        [
            &mut self.unlock,
            &mut self.menu,
            &mut self.secret_list,
            &mut self.secret_detail,
            &mut self.secret_form,
            &mut self.task_list,
            &mut self.task_detail,
            &mut self.task_form,
        ]
    }

    fn forward(&mut self, id: ViewId, msg: Msg) -> Vec<Command> {
        let ctx = self.ctx.clone();
        self.view_mut(id).update(msg, &ctx)
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Key(key) => {
                if keys::is_ctrl_c(&key) {
                    return vec![Command::Quit];
                }
                if keys::is_quit(&key) && !self.view_ref(self.view).captures_text() {
                    return vec![Command::Quit];
                }
                self.forward(self.view, Msg::Key(key))
            }
            Msg::Resize { width, height } => {
                self.width = width;
                self.height = height;
                for view in self.all_views() {
                    view.resize(width, height);
                }
                Vec::new()
            }
            Msg::Navigate { view, payload } => {
                tracing::debug!(from = ?self.view, to = ?view, "navigate");
                self.view = view;
                self.banner = None;
                if view == ViewId::Menu {
                    self.menu.refresh_counts();
                }
                self.forward(view, Msg::Navigate { view, payload })
            }
            Msg::Error(text) => {
                if self.view == ViewId::Unlock {
                    return self.forward(ViewId::Unlock, Msg::Error(text));
                }
                self.banner = Some(text);
                Vec::new()
            }
            Msg::VaultOpened(handle) => {
                tracing::info!("vault opened");
                for view in self.all_views() {
                    view.attach(handle.clone());
                }
                self.vault = Some(handle);
                self.unlock.unlocked();
                self.view = ViewId::Menu;
                self.banner = None;
                self.menu.refresh_counts();
                Vec::new()
            }
            Msg::ClipboardWritten { field, result } => {
                let mut cmds = vec![self.clipboard.record_copy()];
                match result {
                    Ok(()) => {
                        tracing::info!(field = %field, "copied to clipboard");
                        let clears_in = self.clipboard.clear_after();
                        cmds.extend(self.forward(ViewId::SecretDetail, Msg::ClipboardCopied { field, clears_in }));
                    }
                    Err(e) => {
                        tracing::warn!(field = %field, error = %e, "clipboard write failed");
                        self.banner = Some("clipboard unavailable".into());
                    }
                }
                cmds
            }
            Msg::ClipboardTimer { generation } => {
                if !self.clipboard.is_current(generation) {
                    tracing::trace!(generation, current = self.clipboard.generation(), "stale clipboard timer");
                    return Vec::new();
                }
                let mut cmds = vec![Command::ClearClipboard];
                cmds.extend(self.forward(ViewId::SecretDetail, Msg::ClipboardCleared));
                cmds
            }
            msg @ (Msg::ClipboardCopied { .. } | Msg::ClipboardCleared) => {
                self.forward(ViewId::SecretDetail, msg)
            }
            Msg::TotpTick { generation } => {
                if self.view != ViewId::SecretDetail {
                    tracing::trace!(generation, "totp tick outside secret detail");
                    return Vec::new();
                }
                self.forward(ViewId::SecretDetail, Msg::TotpTick { generation })
            }
        }
    }

    fn header(&self) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("  {APP_NAME}"), theme::accent().add_modifier(Modifier::BOLD)),
            Span::styled(" · ", theme::dim()),
            Span::styled(self.view.title(), theme::muted()),
        ])
    }

    fn rule(&self) -> Line<'static> {
        Line::from(Span::styled(
            "─".repeat(self.width.max(1) as usize),
            theme::dim(),
        ))
    }

    fn banner_line(&self) -> Option<Line<'static>> {
        self.banner
            .as_ref()
            .map(|text| Line::from(Span::styled(format!("  {text}"), theme::error())))
    }

    /// The whole screen as lines: header, rule, view content, banner, footer.
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![self.header(), self.rule()];
        lines.extend(self.view_ref(self.view).render(&self.ctx));
        if let Some(banner) = self.banner_line() {
            lines.push(Line::default());
            lines.push(banner);
        }
        lines.push(Line::default());
        lines.push(footer::render(self.view));
        lines
    }

    pub fn draw(&self, f: &mut Frame<'_>) {
        let banner_height = if self.banner.is_some() { 1 } else { 0 };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1), // rule
                Constraint::Min(1),    // content
                Constraint::Length(banner_height),
                Constraint::Length(3), // footer
            ])
            .split(f.size());

        f.render_widget(Paragraph::new(self.header()), layout[0]);
        f.render_widget(Paragraph::new(self.rule()), layout[1]);
        f.render_widget(
            Paragraph::new(self.view_ref(self.view).render(&self.ctx)),
            layout[2],
        );
        if let Some(banner) = self.banner_line() {
            f.render_widget(Paragraph::new(banner), layout[3]);
        }
        let footer = Paragraph::new(footer::render(self.view))
            .block(Block::default().borders(Borders::ALL).border_style(theme::dim()));
        f.render_widget(footer, layout[4]);
    }
}
