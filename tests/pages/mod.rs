//! End-to-end page tests against a mocked backend.

mod test_app;
mod test_download;
mod test_price_offer;
mod test_question;

use std::sync::Arc;

use httpmock::MockServer;
use prizma_miniapp::bridge::{
    ChannelTransport, HostEvent, HostedBridge, InitData, LaunchParams, TelegramUser,
};
use prizma_miniapp::{Config, LocalStorage, Session};
use tokio::sync::mpsc::UnboundedReceiver;

pub const USER: i64 = 31;

pub struct Harness {
    pub session: Session,
    pub events: UnboundedReceiver<HostEvent>,
}

impl Harness {
    pub fn new(server: &MockServer) -> Self {
        Self::with_start_param(server, None)
    }

    pub fn with_start_param(server: &MockServer, start_param: Option<&str>) -> Self {
        let (transport, events) = ChannelTransport::new();
        let launch = LaunchParams {
            init_data: InitData {
                user: Some(TelegramUser {
                    id: USER,
                    ..Default::default()
                }),
                start_param: start_param.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        };
        let bridge = Arc::new(HostedBridge::new(launch, Box::new(transport)));

        let mut config = Config::defaults().with_api_url(server.url("/api"));
        config.report_poll_interval_secs = 0;
        config.error_retry_secs = 0;
        config.failed_redirect_delay_ms = 0;

        let session = Session::new(config, bridge, LocalStorage::in_memory())
            .expect("session should build");
        Self { session, events }
    }

    pub fn drain(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Popup messages posted since the last drain.
    pub fn alerts(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::OpenPopup { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }
}

pub fn user_path(suffix: &str) -> String {
    format!("/api/user/{}/{}", USER, suffix)
}
