//! Per-run application context.
//!
//! Holds what every page needs: configuration, the backend client, the host
//! bridge and local storage. Pages receive it explicitly.

use std::sync::Arc;

use tracing::debug;

use crate::bridge::HostBridge;
use crate::config::Config;
use crate::error::Result;
use crate::integrations::BackendClient;
use crate::storage::{keys, LocalStorage};

#[derive(Clone)]
pub struct Session {
    config: Arc<Config>,
    api: BackendClient,
    bridge: Arc<dyn HostBridge>,
    storage: LocalStorage,
}

impl Session {
    /// Build the backend client from `config`. The raw launch data is
    /// forwarded only inside Telegram.
    pub fn new(config: Config, bridge: Arc<dyn HostBridge>, storage: LocalStorage) -> Result<Self> {
        let mut api = BackendClient::from_config(&config)?;
        if config.send_init_data && bridge.is_hosted() {
            if let Some(raw) = bridge.raw_init_data() {
                api = api.with_init_data(raw);
            }
        }
        Ok(Self::with_client(config, api, bridge, storage))
    }

    pub fn with_client(
        config: Config,
        api: BackendClient,
        bridge: Arc<dyn HostBridge>,
        storage: LocalStorage,
    ) -> Self {
        Self {
            config: Arc::new(config),
            api,
            bridge,
            storage,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &BackendClient {
        &self.api
    }

    pub fn bridge(&self) -> &dyn HostBridge {
        self.bridge.as_ref()
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Telegram user id; outside Telegram the stored test id, then the
    /// configured fallback.
    pub fn user_id(&self) -> i64 {
        if let Some(id) = self.bridge.user_id() {
            return id;
        }
        if let Some(id) = self.storage.get_i64(keys::TEST_USER_ID) {
            debug!(user_id = id, "Using stored test user id");
            return id;
        }
        self.config.fallback_user_id
    }

    pub fn set_test_user_id(&self, user_id: i64) -> Result<()> {
        self.storage.set(keys::TEST_USER_ID, user_id.to_string())
    }
}
