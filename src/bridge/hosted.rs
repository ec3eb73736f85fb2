//! Bridge to a Telegram client.
//!
//! Calls become `{eventType, eventData}` messages (the Web App event
//! protocol) written to a [`HostTransport`]. The host answers popups with a
//! `popup_closed` event.

use std::io::{BufRead, Write};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{HostBridge, ImpactStyle, LaunchParams};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupButton {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Events posted to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "eventData")]
pub enum HostEvent {
    #[serde(rename = "web_app_ready")]
    Ready,
    #[serde(rename = "web_app_expand")]
    Expand,
    #[serde(rename = "web_app_setup_main_button")]
    SetupMainButton {
        is_visible: bool,
        is_active: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    #[serde(rename = "web_app_setup_back_button")]
    SetupBackButton { is_visible: bool },
    #[serde(rename = "web_app_trigger_haptic_feedback")]
    HapticFeedback {
        #[serde(rename = "type")]
        kind: String,
        impact_style: ImpactStyle,
    },
    #[serde(rename = "web_app_open_popup")]
    OpenPopup {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        message: String,
        buttons: Vec<PopupButton>,
    },
    #[serde(rename = "web_app_data_send")]
    DataSend { data: String },
    #[serde(rename = "web_app_open_link")]
    OpenLink { url: String },
    #[serde(rename = "web_app_open_tg_link")]
    OpenTgLink { path_full: String },
    #[serde(rename = "web_app_close")]
    Close,
}

/// Events the host sends back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "eventData", rename_all = "snake_case")]
pub enum HostReply {
    PopupClosed {
        #[serde(default)]
        button_id: Option<String>,
    },
    MainButtonPressed,
    BackButtonPressed,
}

/// Channel to the host client.
pub trait HostTransport: Send + Sync {
    fn post(&self, event: HostEvent) -> Result<()>;

    /// Wait for the next reply. `None` when the host is gone.
    fn next_reply(&self) -> Option<HostReply> {
        None
    }
}

/// JSON lines on stdout, replies as JSON lines on stdin.
#[derive(Debug, Default)]
pub struct StdoutTransport;

impl HostTransport for StdoutTransport {
    fn post(&self, event: HostEvent) -> Result<()> {
        let line = serde_json::to_string(&event)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }

    fn next_reply(&self) -> Option<HostReply> {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line.ok()?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(reply) => return Some(reply),
                Err(err) => warn!("Ignoring malformed host reply: {}", err),
            }
        }
        None
    }
}

/// In-process transport: events go to an mpsc channel, replies come from a
/// queue filled by the embedder.
#[derive(Debug)]
pub struct ChannelTransport {
    events: mpsc::UnboundedSender<HostEvent>,
    replies: Mutex<std::collections::VecDeque<HostReply>>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                events: tx,
                replies: Mutex::new(Default::default()),
            },
            rx,
        )
    }

    /// Queue a reply for the next `next_reply` call.
    pub fn push_reply(&self, reply: HostReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }
}

impl HostTransport for ChannelTransport {
    fn post(&self, event: HostEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| Error::BridgeError("host channel closed".into()))
    }

    fn next_reply(&self) -> Option<HostReply> {
        self.replies.lock().ok()?.pop_front()
    }
}

pub struct HostedBridge {
    launch: LaunchParams,
    transport: Box<dyn HostTransport>,
}

impl HostedBridge {
    pub fn new(launch: LaunchParams, transport: Box<dyn HostTransport>) -> Self {
        Self { launch, transport }
    }

    /// Fire-and-forget post. The host being unreachable is not fatal to a page.
    fn emit(&self, event: HostEvent) {
        debug!(?event, "Posting host event");
        if let Err(err) = self.transport.post(event) {
            warn!("Host event dropped: {}", err);
        }
    }

    fn popup(&self, message: &str, buttons: Vec<PopupButton>) {
        self.emit(HostEvent::OpenPopup {
            title: None,
            message: message.to_string(),
            buttons,
        });
    }
}

fn button(kind: &str, id: &str) -> PopupButton {
    PopupButton {
        kind: kind.to_string(),
        id: Some(id.to_string()),
    }
}

/// `web_app_open_tg_link` takes the path after `https://t.me`.
fn telegram_path(url: &str) -> String {
    let stripped = url
        .strip_prefix("https://t.me")
        .or_else(|| url.strip_prefix("http://t.me"))
        .or_else(|| url.strip_prefix("tg://"))
        .unwrap_or(url);
    if stripped.starts_with('/') {
        stripped.to_string()
    } else {
        format!("/{}", stripped)
    }
}

impl HostBridge for HostedBridge {
    fn is_hosted(&self) -> bool {
        true
    }

    fn launch(&self) -> &LaunchParams {
        &self.launch
    }

    fn ready(&self) {
        self.emit(HostEvent::Ready);
    }

    fn expand(&self) {
        self.emit(HostEvent::Expand);
    }

    fn show_main_button(&self, text: &str) {
        let text = if text.is_empty() { "Continue" } else { text };
        self.emit(HostEvent::SetupMainButton {
            is_visible: true,
            is_active: true,
            text: Some(text.to_string()),
        });
    }

    fn hide_main_button(&self) {
        self.emit(HostEvent::SetupMainButton {
            is_visible: false,
            is_active: false,
            text: None,
        });
    }

    fn show_back_button(&self) {
        self.emit(HostEvent::SetupBackButton { is_visible: true });
    }

    fn hide_back_button(&self) {
        self.emit(HostEvent::SetupBackButton { is_visible: false });
    }

    fn haptic(&self, style: ImpactStyle) {
        self.emit(HostEvent::HapticFeedback {
            kind: "impact".to_string(),
            impact_style: style,
        });
    }

    fn show_alert(&self, message: &str) {
        self.popup(message, vec![button("ok", "ok")]);
    }

    fn show_confirm(&self, message: &str) -> bool {
        self.popup(message, vec![button("ok", "ok"), button("cancel", "cancel")]);
        loop {
            match self.transport.next_reply() {
                Some(HostReply::PopupClosed { button_id }) => {
                    return button_id.as_deref() == Some("ok");
                }
                Some(other) => debug!(?other, "Ignoring reply while waiting for popup"),
                None => return false,
            }
        }
    }

    fn send_data(&self, data: &serde_json::Value) -> Result<()> {
        let data = serde_json::to_string(data)?;
        self.transport.post(HostEvent::DataSend { data })
    }

    fn open_link(&self, url: &str) {
        self.emit(HostEvent::OpenLink {
            url: url.to_string(),
        });
    }

    fn open_telegram_link(&self, url: &str) {
        self.emit(HostEvent::OpenTgLink {
            path_full: telegram_path(url),
        });
    }

    fn close(&self) {
        self.emit(HostEvent::Close);
    }
}
