pub mod dialog;
pub mod terminal;

use std::sync::mpsc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

use crate::config::Config;
use crate::error::AskpassError;

pub type Result<T> = std::result::Result<T, AskpassError>;

pub const DIALOG_MESSAGE: &str = "sudo needs your password to continue.";
pub const TERMINAL_MESSAGE: &str = "[sudo-askpass] Password: ";

/// Where an interactive password can be requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Dialog,
    Terminal,
}

/// Capability interface over the human on the other end.
/// `Ok(None)` covers cancel, empty input, end-of-input and timeouts alike.
pub trait InteractivePrompter {
    fn has_terminal(&self) -> bool;
    fn dialog(&self, message: &str) -> Result<Option<SecretString>>;
    fn terminal(&self, message: &str) -> Result<Option<SecretString>>;
}

/// A GUI session wins unless suppressed; otherwise fall back to an attached terminal.
pub fn select_channel(config: &Config, prompter: &dyn InteractivePrompter) -> Option<Channel> {
    if config.gui_session && !config.non_interactive {
        Some(Channel::Dialog)
    } else if prompter.has_terminal() {
        Some(Channel::Terminal)
    } else {
        None
    }
}

/// Production prompter: native dialog tool and the controlling terminal.
pub struct SystemPrompter {
    timeout: Option<Duration>,
}

impl SystemPrompter {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl InteractivePrompter for SystemPrompter {
    fn has_terminal(&self) -> bool {
        terminal::is_attached()
    }

    fn dialog(&self, message: &str) -> Result<Option<SecretString>> {
        dialog::DialogCommand::native(message).run(self.timeout)
    }

    fn terminal(&self, message: &str) -> Result<Option<SecretString>> {
        match self.timeout {
            Some(timeout) => terminal::read_with_timeout(message, timeout),
            None => terminal::read(message),
        }
    }
}

/// Run a blocking read on a worker thread, giving up after `timeout`.
/// The worker is abandoned on expiry; the process is expected to exit shortly after.
pub fn with_timeout<F>(timeout: Duration, read: F) -> Result<Option<SecretString>>
where
    F: FnOnce() -> Result<Option<SecretString>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(read());
    });
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            debug!(?timeout, "prompt timed out");
            Ok(None)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(AskpassError::Prompt("prompt worker exited unexpectedly".into()))
        }
    }
}
