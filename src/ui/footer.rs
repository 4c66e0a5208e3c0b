use ratatui::text::{Line, Span};

use super::theme;
use super::ViewId;

pub type HelpPair = (&'static str, &'static str);

pub fn help_for(view: ViewId) -> &'static [HelpPair] {
    match view {
        ViewId::Unlock => &[("enter", "submit"), ("tab", "next field"), ("ctrl+c", "quit")],
        ViewId::Menu => &[("enter", "select"), ("q", "quit")],
        ViewId::SecretList => &[
            ("enter", "open"),
            ("n", "new"),
            ("d", "delete"),
            ("/", "search"),
            ("tab", "filter"),
            ("esc", "back"),
        ],
        ViewId::SecretDetail => &[
            ("c", "copy"),
            ("s", "show/hide"),
            ("e", "edit"),
            ("d", "delete"),
            ("esc", "back"),
        ],
        ViewId::SecretForm => &[
            ("tab", "next"),
            ("shift+tab", "prev"),
            ("ctrl+s", "save"),
            ("esc", "cancel"),
        ],
        ViewId::TaskList => &[
            ("enter", "detail"),
            ("n", "new"),
            ("space", "done"),
            ("d", "delete"),
            ("x", "clear"),
            ("tab", "filter"),
            ("esc", "back"),
        ],
        ViewId::TaskDetail => &[("e", "edit"), ("space", "done"), ("d", "delete"), ("esc", "back")],
        ViewId::TaskForm => &[("tab", "next field"), ("ctrl+s", "save"), ("esc", "cancel")],
    }
}

pub fn render(view: ViewId) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (i, (key, desc)) in help_for(view).iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" · ", theme::dim()));
        }
        spans.push(Span::styled(*key, theme::accent()));
        spans.push(Span::styled(format!(" {desc}"), theme::muted()));
    }
    Line::from(spans)
}
