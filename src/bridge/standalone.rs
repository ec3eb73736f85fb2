//! Bridge used outside Telegram.
//!
//! Dialogs and links go to a [`BrowserShell`]; buttons and haptics have no
//! plain-browser equivalent and are no-ops.

use std::io::{BufRead, Write};

use tracing::debug;

use super::{HostBridge, ImpactStyle, LaunchParams};
use crate::Result;

/// Plain-browser primitives (`alert`, `confirm`, `window.open`, `window.close`).
pub trait BrowserShell: Send + Sync {
    fn alert(&self, message: &str);
    fn confirm(&self, message: &str) -> bool;
    fn open_window(&self, url: &str);
    fn close_window(&self);
}

/// Shell backed by the terminal.
#[derive(Debug, Default)]
pub struct TerminalShell;

impl BrowserShell for TerminalShell {
    fn alert(&self, message: &str) {
        eprintln!("[alert] {}", message);
    }

    fn confirm(&self, message: &str) -> bool {
        eprint!("[confirm] {} [y/N] ", message);
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn open_window(&self, url: &str) {
        println!("{}", url);
    }

    fn close_window(&self) {
        eprintln!("[closed]");
    }
}

pub struct StandaloneBridge {
    launch: LaunchParams,
    shell: Box<dyn BrowserShell>,
}

impl StandaloneBridge {
    pub fn new(launch: LaunchParams, shell: Box<dyn BrowserShell>) -> Self {
        Self { launch, shell }
    }
}

impl HostBridge for StandaloneBridge {
    fn is_hosted(&self) -> bool {
        false
    }

    fn launch(&self) -> &LaunchParams {
        &self.launch
    }

    fn ready(&self) {}

    fn expand(&self) {}

    fn show_main_button(&self, text: &str) {
        debug!(text, "Main button unavailable outside Telegram");
    }

    fn hide_main_button(&self) {}

    fn show_back_button(&self) {}

    fn hide_back_button(&self) {}

    fn haptic(&self, style: ImpactStyle) {
        debug!(style = style.as_str(), "Haptic feedback unavailable outside Telegram");
    }

    fn show_alert(&self, message: &str) {
        self.shell.alert(message);
    }

    fn show_confirm(&self, message: &str) -> bool {
        self.shell.confirm(message)
    }

    fn send_data(&self, data: &serde_json::Value) -> Result<()> {
        debug!(%data, "sendData ignored outside Telegram");
        Ok(())
    }

    fn open_link(&self, url: &str) {
        self.shell.open_window(url);
    }

    fn open_telegram_link(&self, url: &str) {
        self.shell.open_window(url);
    }

    fn close(&self) {
        self.shell.close_window();
    }

    /// Outside Telegram nobody signs a user into the launch data.
    fn user_id(&self) -> Option<i64> {
        None
    }
}
