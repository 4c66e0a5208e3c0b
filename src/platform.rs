//! System clipboard and URL opener behind small traits, so the driver can
//! run against fakes in tests.

use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use crate::errors::{Result, ZvaultError};

pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

pub trait UrlOpener {
    /// Fire-and-forget; failures are only logged.
    fn open(&self, url: &str);
}

/// arboard-backed clipboard. The handle is created on first use and kept
/// so X11/Wayland selections stay owned until cleared.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut arboard::Clipboard> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ZvaultError::Clipboard(format!("clipboard unavailable: {e}")))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ZvaultError::Clipboard("clipboard unavailable".into()))
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        self.handle()?
            .set_text(text.to_owned())
            .map_err(|e| ZvaultError::Clipboard(format!("failed to set clipboard: {e}")))
    }

    fn clear(&mut self) -> Result<()> {
        self.handle()?
            .set_text(String::new())
            .map_err(|e| ZvaultError::Clipboard(format!("failed to clear clipboard: {e}")))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) {
        if let Err(e) = spawn_reaped(open_command(url)) {
            tracing::warn!(error = %e, "failed to open url");
        }
    }
}

/// Spawns `cmd` detached from the terminal and waits for it on a
/// background thread so the child never lingers as a zombie.
fn spawn_reaped(mut cmd: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(thread::spawn(move || child.wait()))
}

fn open_command(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/c", "start", "", url]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn spawned_child_is_waited_on() {
        let handle = spawn_reaped(Command::new("true")).unwrap();
        let status = handle.join().unwrap().unwrap();
        assert!(status.success());
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(spawn_reaped(Command::new("zvault-no-such-program")).is_err());
    }
}
