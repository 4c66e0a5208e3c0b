use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::clock::SystemClock;
use crate::config::{self, Invocation, Settings};
use crate::crypto::KdfParams;
use crate::logging;
use crate::platform::{Clipboard, SystemClipboard, SystemOpener, UrlOpener};
use crate::storage::{JsonVaultOpener, VaultOpener};
use crate::ui::{Command, Model, Msg};

/// Upper bound on how long the loop blocks waiting for input, so worker
/// results are picked up even when no key is pressed.
const IDLE_POLL: Duration = Duration::from_millis(200);

pub fn run() -> Result<()> {
    let bin_name = executable_name();
    let invocation = config::parse_args(std::env::args().skip(1), |key| std::env::var(key).ok())
        .with_context(|| format!("run `{bin_name} --help` for usage"))?;
    let settings = match invocation {
        Invocation::Version => {
            println!("{bin_name} v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Invocation::Help => {
            print!("{}", config::usage(&bin_name));
            return Ok(());
        }
        Invocation::Run(settings) => settings,
    };

    logging::init();
    tracing::info!(dir = %settings.vault_dir.display(), "starting");

    let mut driver = Driver::from_settings(&settings);
    run_terminal(&mut driver)
}

fn run_terminal(driver: &mut Driver) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = (|| -> Result<()> {
        let size = terminal.size()?;
        driver.dispatch(Msg::Resize {
            width: size.width,
            height: size.height,
        });

        while !driver.should_quit() {
            terminal.draw(|f| driver.model().draw(f))?;

            let timeout = driver
                .next_timeout(Instant::now())
                .map_or(IDLE_POLL, |t| t.min(IDLE_POLL));
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        driver.dispatch(Msg::Key(key));
                    }
                    Event::Resize(width, height) => {
                        driver.dispatch(Msg::Resize { width, height });
                    }
                    _ => {}
                }
            }
            driver.pump(Instant::now());
        }
        Ok(())
    })();

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show).ok();
    terminal.show_cursor().ok();

    driver.shutdown();
    result
}

/// Runs the model's commands: worker-thread vault opens, clipboard access,
/// URL opening, and the timer deadline queue.
pub struct Driver {
    model: Model,
    opener: Arc<dyn VaultOpener>,
    clipboard: Box<dyn Clipboard>,
    urls: Box<dyn UrlOpener>,
    timers: Vec<(Instant, Msg)>,
    worker_tx: Sender<Msg>,
    worker_rx: Receiver<Msg>,
    quit: bool,
}

impl Driver {
    pub fn new(
        model: Model,
        opener: Arc<dyn VaultOpener>,
        clipboard: Box<dyn Clipboard>,
        urls: Box<dyn UrlOpener>,
    ) -> Self {
        let (worker_tx, worker_rx) = mpsc::channel();
        Self {
            model,
            opener,
            clipboard,
            urls,
            timers: Vec::new(),
            worker_tx,
            worker_rx,
            quit: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Model::from_settings(settings, Arc::new(SystemClock)),
            Arc::new(JsonVaultOpener {
                kdf: KdfParams::default(),
            }),
            Box::new(SystemClipboard::new()),
            Box::new(SystemOpener),
        )
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Feeds one message through the model, then every message its
    /// commands produce, in order.
    pub fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            for cmd in self.model.update(msg) {
                self.execute(cmd, &mut queue);
            }
        }
    }

    /// Delivers finished worker results and every timer due at `now`.
    /// Timers armed while these run wait for the next pump.
    pub fn pump(&mut self, now: Instant) {
        while let Ok(msg) = self.worker_rx.try_recv() {
            self.dispatch(msg);
        }
        for msg in self.take_due(now) {
            self.dispatch(msg);
        }
    }

    /// Time until the earliest armed timer, if any.
    pub fn next_timeout(&self, now: Instant) -> Option<Duration> {
        self.timers
            .iter()
            .map(|(at, _)| at.saturating_duration_since(now))
            .min()
    }

    fn take_due(&mut self, now: Instant) -> Vec<Msg> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|(at, _)| *at <= now);
        self.timers = pending;
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, msg)| msg).collect()
    }

    fn schedule(&mut self, after: Duration, msg: Msg) {
        self.timers.push((Instant::now() + after, msg));
    }

    fn execute(&mut self, cmd: Command, queue: &mut VecDeque<Msg>) {
        match cmd {
            Command::Emit(msg) => queue.push_back(msg),
            Command::OpenVault { dir, password } => {
                let opener = Arc::clone(&self.opener);
                let tx = self.worker_tx.clone();
                thread::spawn(move || {
                    let msg = match opener.open(&dir, password.expose()) {
                        Ok(handle) => Msg::VaultOpened(handle),
                        Err(e) => {
                            tracing::warn!(dir = %dir.display(), error = %e, "vault open failed");
                            Msg::Error(e.to_string())
                        }
                    };
                    let _ = tx.send(msg);
                });
            }
            Command::CopyToClipboard { field, value } => {
                let result = self.clipboard.copy(value.expose()).map_err(|e| e.to_string());
                queue.push_back(Msg::ClipboardWritten { field, result });
            }
            Command::ScheduleClipboardClear { generation, after } => {
                self.schedule(after, Msg::ClipboardTimer { generation });
            }
            Command::ClearClipboard => {
                if let Err(e) = self.clipboard.clear() {
                    tracing::warn!(error = %e, "clipboard clear failed");
                } else {
                    tracing::debug!("clipboard cleared");
                }
            }
            Command::ScheduleTotpTick { generation, after } => {
                self.schedule(after, Msg::TotpTick { generation });
            }
            Command::OpenUrl(url) => self.urls.open(&url),
            Command::Quit => {
                tracing::info!("quit requested");
                self.quit = true;
            }
        }
    }

    /// Clears a clipboard still waiting on its timer and closes the vault.
    pub fn shutdown(&mut self) {
        let clear_pending = self
            .timers
            .iter()
            .any(|(_, msg)| matches!(msg, Msg::ClipboardTimer { .. }));
        if clear_pending {
            if let Err(e) = self.clipboard.clear() {
                tracing::warn!(error = %e, "clipboard clear on exit failed");
            }
        }
        self.timers.clear();
        if let Some(vault) = self.model.vault() {
            if let Err(e) = vault.close() {
                tracing::warn!(error = %e, "vault close failed");
            }
        }
    }
}

fn executable_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(|p| p.file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map_or_else(|| "zvault".to_string(), str::to_string)
}
