//! Native password dialog: AppleScript on macOS, zenity elsewhere.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use secrecy::SecretString;
use tracing::debug;
use zeroize::Zeroize;

use super::Result;
use crate::error::AskpassError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const DIALOG_TITLE: &str = "sudo";

/// A dialog program whose stdout carries the entered password.
#[derive(Debug)]
pub struct DialogCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl DialogCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The dialog tool native to this platform.
    pub fn native(message: &str) -> Self {
        if cfg!(target_os = "macos") {
            Self::new("osascript", vec!["-e".into(), applescript(message)])
        } else {
            Self::new(
                "zenity",
                vec!["--password".into(), format!("--title={}", DIALOG_TITLE)],
            )
        }
    }

    /// Show the dialog and wait for an answer. Cancel, empty input and an
    /// expired `timeout` all yield `Ok(None)`.
    pub fn run(&self, timeout: Option<Duration>) -> Result<Option<SecretString>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    AskpassError::ToolMissing(self.program.display().to_string())
                }
                _ => AskpassError::Prompt(e.to_string()),
            })?;

        let Some(status) = wait(&mut child, timeout)? else {
            debug!(?timeout, "dialog timed out");
            return Ok(None);
        };
        if !status.success() {
            debug!(code = ?status.code(), "dialog cancelled");
            return Ok(None);
        }

        let mut raw = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_string(&mut raw)?;
        }
        let answer = raw.trim_end_matches(['\r', '\n']).to_string();
        raw.zeroize();

        if answer.is_empty() {
            return Ok(None);
        }
        Ok(Some(SecretString::new(answer)))
    }
}

/// Wait for `child`, killing it once `timeout` has elapsed.
fn wait(child: &mut Child, timeout: Option<Duration>) -> Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return Ok(Some(child.wait()?));
    };
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn applescript(message: &str) -> String {
    format!(
        "text returned of (display dialog \"{}\" with title \"{}\" default answer \"\" \
         with hidden answer with icon caution buttons {{\"Cancel\", \"OK\"}} default button \"OK\")",
        escape_applescript(message),
        DIALOG_TITLE
    )
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
