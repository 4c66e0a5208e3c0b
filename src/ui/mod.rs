//! Interactive controller: one root model routing messages to per-view
//! sub-controllers, each returning effects for the driver to run.

pub mod clipboard;
pub mod filter;
pub mod footer;
pub mod input;
pub mod keys;
pub mod menu;
pub mod root;
pub mod secret_detail;
pub mod secret_form;
pub mod secret_list;
pub mod task_detail;
pub mod task_form;
pub mod task_list;
pub mod theme;
pub mod unlock;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::KeyEvent;
use ratatui::text::Line;
use zeroize::Zeroizing;

use crate::clock::SharedClock;
use crate::models::Task;
use crate::storage::VaultHandle;

pub use root::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Unlock,
    Menu,
    SecretList,
    SecretDetail,
    SecretForm,
    TaskList,
    TaskDetail,
    TaskForm,
}

impl ViewId {
    pub fn title(self) -> &'static str {
        match self {
            ViewId::Unlock => "unlock",
            ViewId::Menu => "menu",
            ViewId::SecretList => "secrets",
            ViewId::SecretDetail => "secret",
            ViewId::SecretForm => "edit secret",
            ViewId::TaskList => "tasks",
            ViewId::TaskDetail => "task",
            ViewId::TaskForm => "edit task",
        }
    }

    /// Where Esc leads from this view.
    pub fn parent(self) -> ViewId {
        match self {
            ViewId::SecretDetail | ViewId::SecretForm => ViewId::SecretList,
            ViewId::TaskDetail | ViewId::TaskForm => ViewId::TaskList,
            ViewId::Unlock | ViewId::Menu | ViewId::SecretList | ViewId::TaskList => ViewId::Menu,
        }
    }
}

/// Data carried by a navigation request.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    #[default]
    None,
    Id(String),
    Task(Task),
}

/// A string that never shows up in `Debug` output.
#[derive(Clone)]
pub struct Sensitive(Zeroizing<String>);

impl Sensitive {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sensitive(***)")
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Navigate { view: ViewId, payload: Payload },
    Error(String),
    VaultOpened(VaultHandle),
    ClipboardWritten { field: String, result: Result<(), String> },
    ClipboardCopied { field: String, clears_in: Duration },
    ClipboardTimer { generation: u64 },
    ClipboardCleared,
    TotpTick { generation: u64 },
}

/// Effects requested by `update`; the driver runs them and feeds any
/// resulting message back in.
#[derive(Debug)]
pub enum Command {
    Emit(Msg),
    OpenVault { dir: PathBuf, password: Sensitive },
    CopyToClipboard { field: String, value: Sensitive },
    ScheduleClipboardClear { generation: u64, after: Duration },
    ClearClipboard,
    ScheduleTotpTick { generation: u64, after: Duration },
    OpenUrl(String),
    Quit,
}

pub fn navigate(view: ViewId) -> Command {
    navigate_with(view, Payload::None)
}

pub fn navigate_with(view: ViewId, payload: Payload) -> Command {
    Command::Emit(Msg::Navigate { view, payload })
}

pub fn report(err: impl fmt::Display) -> Command {
    Command::Emit(Msg::Error(err.to_string()))
}

/// Shared, read-only inputs every controller may need.
#[derive(Clone)]
pub struct Context {
    pub clock: SharedClock,
    pub totp_tick: Duration,
}

/// A per-view sub-controller.
pub trait View {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Vec<Command>;

    fn render(&self, ctx: &Context) -> Vec<Line<'static>>;

    fn resize(&mut self, _width: u16, _height: u16) {}

    fn attach(&mut self, _vault: VaultHandle) {}

    /// True while a free-text field has focus, so `q` must not quit.
    fn captures_text(&self) -> bool {
        false
    }
}

/// Rows available to a list: terminal height minus chrome, at least 3.
pub fn visible_rows(height: u16) -> usize {
    (height as usize).saturating_sub(10).max(3)
}

/// Start of a scroll window that keeps `cursor` in view.
pub fn scroll_start(cursor: usize, visible: usize, len: usize) -> usize {
    let start = (cursor + 1).saturating_sub(visible);
    start.min(len.saturating_sub(visible))
}

/// Flattens styled lines to plain text, one line per row.
pub fn plain(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents() {
        assert_eq!(ViewId::SecretForm.parent(), ViewId::SecretList);
        assert_eq!(ViewId::TaskDetail.parent(), ViewId::TaskList);
        assert_eq!(ViewId::TaskList.parent(), ViewId::Menu);
    }

    #[test]
    fn visible_rows_has_floor() {
        assert_eq!(visible_rows(0), 3);
        assert_eq!(visible_rows(12), 3);
        assert_eq!(visible_rows(30), 20);
    }

    #[test]
    fn scroll_window_follows_cursor() {
        assert_eq!(scroll_start(0, 3, 10), 0);
        assert_eq!(scroll_start(2, 3, 10), 0);
        assert_eq!(scroll_start(5, 3, 10), 3);
        assert_eq!(scroll_start(9, 3, 10), 7);
        assert_eq!(scroll_start(1, 3, 2), 0);
    }

    #[test]
    fn sensitive_debug_is_redacted() {
        let s = Sensitive::new("hunter2");
        assert_eq!(format!("{s:?}"), "Sensitive(***)");
        assert_eq!(s.expose(), "hunter2");
    }
}
