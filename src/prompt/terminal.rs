use std::io;
use std::time::Duration;

use secrecy::SecretString;

use super::Result;
use crate::error::AskpassError;

/// Whether a controlling terminal is available to prompt on.
#[cfg(unix)]
pub fn is_attached() -> bool {
    open_tty().is_ok()
}

#[cfg(not(unix))]
pub fn is_attached() -> bool {
    use std::io::IsTerminal;
    std::io::stdin().is_terminal()
}

#[cfg(unix)]
fn open_tty() -> io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")
}

/// Read one line from the terminal with echo disabled.
/// Empty input and end-of-input both mean "no password".
pub fn read(message: &str) -> Result<Option<SecretString>> {
    answer(rpassword::prompt_password(message))
}

fn answer(line: io::Result<String>) -> Result<Option<SecretString>> {
    match line {
        Ok(line) if line.is_empty() => Ok(None),
        Ok(line) => Ok(Some(SecretString::new(line))),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(AskpassError::Prompt(e.to_string())),
    }
}

/// Like [`read`], but gives up after `timeout`. Terminal modes are restored
/// on expiry since the abandoned reader never gets to do it.
pub fn read_with_timeout(message: &str, timeout: Duration) -> Result<Option<SecretString>> {
    let message = message.to_string();
    bounded(timeout, TtyState::save(), move || read(&message), TtyState::restore)
}

/// Run `read` under `timeout`, handing `saved` to `restore` when no answer came back.
fn bounded<S, F>(
    timeout: Duration,
    saved: Option<S>,
    read: F,
    restore: impl FnOnce(&S),
) -> Result<Option<SecretString>>
where
    F: FnOnce() -> Result<Option<SecretString>> + Send + 'static,
{
    let result = super::with_timeout(timeout, read);
    if let (Some(state), Ok(None)) = (&saved, &result) {
        restore(state);
    }
    result
}

#[cfg(unix)]
struct TtyState {
    tty: std::fs::File,
    termios: nix::sys::termios::Termios,
}

#[cfg(unix)]
impl TtyState {
    fn save() -> Option<Self> {
        let tty = open_tty().ok()?;
        let termios = nix::sys::termios::tcgetattr(&tty).ok()?;
        Some(Self { tty, termios })
    }

    fn restore(&self) {
        use nix::sys::termios::{tcsetattr, SetArg};
        use std::io::Write;

        if let Err(e) = tcsetattr(&self.tty, SetArg::TCSANOW, &self.termios) {
            tracing::debug!(error = %e, "could not restore terminal mode");
        }
        let _ = (&self.tty).write_all(b"\n");
    }
}

#[cfg(not(unix))]
struct TtyState;

#[cfg(not(unix))]
impl TtyState {
    fn save() -> Option<Self> {
        None
    }

    fn restore(&self) {}
}
