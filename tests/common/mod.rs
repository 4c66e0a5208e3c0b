#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use zvault::clock::FixedClock;
use zvault::storage::JsonVault;
use zvault::ui::keys::{ctrl, key, press};
use zvault::ui::unlock::Unlock;
use zvault::ui::{plain, Command, Model, Msg, ViewId};

/// Drives the root model the way the terminal driver does, minus the
/// terminal: emitted messages are fed back in order, every other command
/// is recorded.
pub struct Harness {
    pub model: Model,
    pub vault: Arc<JsonVault>,
    pub effects: Vec<Command>,
}

impl Harness {
    /// An unlocked model on an empty in-memory vault, "today" = 2026-02-18.
    pub fn new() -> Self {
        Self::with_vault(JsonVault::in_memory())
    }

    pub fn with_vault(vault: JsonVault) -> Self {
        let vault = Arc::new(vault);
        let model = Model::with_unlock(
            Unlock::with_first_run(Path::new("/tmp/zvault-it"), false),
            Arc::new(FixedClock::on_date(2026, 2, 18)),
            Duration::from_secs(10),
            Duration::from_secs(1),
        );
        let mut h = Self {
            model,
            vault: vault.clone(),
            effects: Vec::new(),
        };
        h.send(Msg::VaultOpened(vault));
        assert_eq!(h.model.view_id(), ViewId::Menu);
        h
    }

    pub fn send(&mut self, msg: Msg) {
        let mut pending = vec![msg];
        while !pending.is_empty() {
            let msg = pending.remove(0);
            for cmd in self.model.update(msg) {
                match cmd {
                    Command::Emit(next) => pending.push(next),
                    other => self.effects.push(other),
                }
            }
        }
    }

    pub fn press(&mut self, code: KeyCode) {
        self.send(Msg::Key(press(code)));
    }

    pub fn key(&mut self, c: char) {
        self.send(Msg::Key(key(c)));
    }

    pub fn ctrl(&mut self, c: char) {
        self.send(Msg::Key(ctrl(c)));
    }

    pub fn raw(&mut self, event: KeyEvent) {
        self.send(Msg::Key(event));
    }

    pub fn type_str(&mut self, text: &str) {
        for c in text.chars() {
            self.key(c);
        }
    }

    pub fn screen(&self) -> String {
        plain(&self.model.render_lines())
    }
}
