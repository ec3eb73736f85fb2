//! Telegram host bridge.
//!
//! [`HostBridge`] is the capability surface the pages use for native UI:
//! buttons, haptics, dialogs, links and closing the app. Two implementations
//! exist:
//! - [`hosted::HostedBridge`] posts Telegram `web_app_*` events to the host client
//! - [`standalone::StandaloneBridge`] runs outside Telegram and substitutes
//!   plain-browser equivalents (alert, confirm, window open/close)
//!
//! Launch parameters (`tgWebAppData`, `tgWebAppStartParam`, theme) are parsed
//! from the launch URL with `urlencoding`.

pub mod hosted;
pub mod standalone;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Result;

pub use hosted::{ChannelTransport, HostEvent, HostReply, HostTransport, HostedBridge, StdoutTransport};
pub use standalone::{BrowserShell, StandaloneBridge, TerminalShell};

/// Haptic impact style accepted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

impl ImpactStyle {
    /// Styles the host does not accept normalise to `Medium`.
    pub fn parse(value: &str) -> Self {
        match value {
            "light" => ImpactStyle::Light,
            "heavy" => ImpactStyle::Heavy,
            _ => ImpactStyle::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactStyle::Light => "light",
            ImpactStyle::Medium => "medium",
            ImpactStyle::Heavy => "heavy",
        }
    }
}

/// Native UI capabilities of the environment the app runs in.
pub trait HostBridge: Send + Sync {
    /// True when a Telegram client is on the other side.
    fn is_hosted(&self) -> bool;

    fn launch(&self) -> &LaunchParams;

    fn ready(&self);
    fn expand(&self);

    fn show_main_button(&self, text: &str);
    fn hide_main_button(&self);
    fn show_back_button(&self);
    fn hide_back_button(&self);

    fn haptic(&self, style: ImpactStyle);

    fn show_alert(&self, message: &str);
    /// Blocks until the user answers.
    fn show_confirm(&self, message: &str) -> bool;

    fn send_data(&self, data: &serde_json::Value) -> Result<()>;
    fn open_link(&self, url: &str);
    fn open_telegram_link(&self, url: &str);
    fn close(&self);

    /// User id signed into the launch data, if any.
    fn user_id(&self) -> Option<i64> {
        self.launch().init_data.user.as_ref().map(|u| u.id)
    }

    fn start_param(&self) -> Option<&str> {
        self.launch().start_param()
    }

    fn raw_init_data(&self) -> Option<&str> {
        self.launch().raw_init_data.as_deref()
    }

    fn theme(&self) -> &ThemeParams {
        &self.launch().theme
    }
}

// ============================================================================
// Launch parameters
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// Decoded `initData` (`initDataUnsafe` in the web SDK). Not validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitData {
    pub query_id: Option<String>,
    pub user: Option<TelegramUser>,
    pub auth_date: Option<i64>,
    pub start_param: Option<String>,
    pub hash: Option<String>,
}

impl InitData {
    pub fn parse(raw: &str) -> Self {
        let params = parse_query(raw);

        let user = params
            .get("user")
            .and_then(|json| serde_json::from_str::<TelegramUser>(json).ok());

        Self {
            query_id: params.get("query_id").cloned(),
            user,
            auth_date: params.get("auth_date").and_then(|v| v.parse().ok()),
            start_param: params.get("start_param").cloned(),
            hash: params.get("hash").cloned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeParams {
    #[serde(default)]
    pub bg_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub hint_color: Option<String>,
    #[serde(default)]
    pub button_color: Option<String>,
    #[serde(default)]
    pub button_text_color: Option<String>,
}

impl ThemeParams {
    /// CSS custom properties for the colours the host supplied.
    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        [
            ("--tg-theme-bg-color", &self.bg_color),
            ("--tg-theme-text-color", &self.text_color),
            ("--tg-theme-hint-color", &self.hint_color),
            ("--tg-theme-button-color", &self.button_color),
            ("--tg-theme-button-text-color", &self.button_text_color),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|v| (name, v)))
        .collect()
    }
}

/// Everything the host passes to the app at launch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchParams {
    pub raw_init_data: Option<String>,
    pub init_data: InitData,
    /// `tgWebAppStartParam`, used when the init data has none.
    pub url_start_param: Option<String>,
    pub platform: Option<String>,
    pub version: Option<String>,
    pub theme: ThemeParams,
}

impl LaunchParams {
    /// Parse the `tgWebApp*` parameters from a launch URL. Both the query
    /// string and the fragment are searched; the fragment wins.
    pub fn from_url(url: &str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (url, None),
        };
        let query = rest.split_once('?').map(|(_, q)| q);

        let mut params = query.map(parse_query).unwrap_or_default();
        if let Some(fragment) = fragment {
            params.extend(parse_query(fragment));
        }

        let raw_init_data = params.get("tgWebAppData").cloned();
        let init_data = raw_init_data
            .as_deref()
            .map(InitData::parse)
            .unwrap_or_default();
        let theme = params
            .get("tgWebAppThemeParams")
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        Self {
            raw_init_data,
            init_data,
            url_start_param: params.get("tgWebAppStartParam").cloned(),
            platform: params.get("tgWebAppPlatform").cloned(),
            version: params.get("tgWebAppVersion").cloned(),
            theme,
        }
    }

    pub fn start_param(&self) -> Option<&str> {
        self.init_data
            .start_param
            .as_deref()
            .or(self.url_start_param.as_deref())
            .filter(|p| !p.is_empty())
    }

    fn carries_telegram_data(&self) -> bool {
        self.raw_init_data.is_some() || self.url_start_param.is_some()
    }
}

/// Split a query string into decoded key/value pairs. Pairs that fail to
/// decode are dropped.
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let spaced = value.replace('+', " ");
            let value = urlencoding::decode(&spaced).ok()?.into_owned();
            Some((key.to_string(), value))
        })
        .collect()
}

// ============================================================================
// Detection
// ============================================================================

/// What the process knows about where it was launched from.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    pub launch_url: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl HostEnvironment {
    pub fn launch_params(&self) -> LaunchParams {
        self.launch_url
            .as_deref()
            .map(LaunchParams::from_url)
            .unwrap_or_default()
    }
}

/// Whether the app runs inside a Telegram client.
pub fn detect_host(env: &HostEnvironment, launch: &LaunchParams) -> bool {
    if launch.platform.as_deref() == Some("unknown") {
        return false;
    }
    if launch.carries_telegram_data() {
        return true;
    }

    let user_agent = env.user_agent.as_deref().unwrap_or_default().to_lowercase();
    if user_agent.contains("telegram") || user_agent.contains("tgwebapp") {
        return true;
    }

    env.referrer.as_deref().is_some_and(is_telegram_referrer)
}

/// Referrer host is `t.me`, `telegram.org` or one of their subdomains.
fn is_telegram_referrer(referrer: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(referrer) else {
        return false;
    };
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        ["t.me", "telegram.org"]
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
    })
}

/// Pick the bridge implementation for this environment.
pub fn connect(
    env: &HostEnvironment,
    transport: Box<dyn HostTransport>,
    shell: Box<dyn BrowserShell>,
) -> Arc<dyn HostBridge> {
    let launch = env.launch_params();
    if detect_host(env, &launch) {
        info!(platform = ?launch.platform, "Telegram host detected");
        Arc::new(HostedBridge::new(launch, transport))
    } else {
        debug!("No Telegram host, running standalone");
        Arc::new(StandaloneBridge::new(launch, shell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INIT_DATA: &str = "query_id=AAH&user=%7B%22id%22%3A987654%2C%22first_name%22%3A%22Test%22%2C%22language_code%22%3A%22ru%22%7D&auth_date=1700000000&start_param=payment_success_42&hash=deadbeef";

    #[test]
    fn impact_style_normalises_unknown_values() {
        assert_eq!(ImpactStyle::parse("light"), ImpactStyle::Light);
        assert_eq!(ImpactStyle::parse("heavy"), ImpactStyle::Heavy);
        assert_eq!(ImpactStyle::parse("rigid"), ImpactStyle::Medium);
        assert_eq!(ImpactStyle::parse(""), ImpactStyle::Medium);
    }

    #[test]
    fn init_data_parses_user_and_start_param() {
        let init = InitData::parse(INIT_DATA);

        let user = init.user.unwrap();
        assert_eq!(user.id, 987654);
        assert_eq!(user.first_name.as_deref(), Some("Test"));
        assert_eq!(init.auth_date, Some(1_700_000_000));
        assert_eq!(init.start_param.as_deref(), Some("payment_success_42"));
        assert_eq!(init.hash.as_deref(), Some("deadbeef"));
    }

    #[test]
    fn init_data_tolerates_broken_user_json() {
        let init = InitData::parse("user=%7Bnot-json&hash=x");
        assert!(init.user.is_none());
        assert_eq!(init.hash.as_deref(), Some("x"));
    }

    #[test]
    fn launch_params_read_fragment() {
        let url = format!(
            "https://app.example/index.html#tgWebAppData={}&tgWebAppPlatform=ios&tgWebAppThemeParams={}",
            urlencoding::encode(INIT_DATA),
            urlencoding::encode(r##"{"bg_color":"#ffffff","button_color":"#2481cc"}"##)
        );

        let launch = LaunchParams::from_url(&url);

        assert_eq!(launch.raw_init_data.as_deref(), Some(INIT_DATA));
        assert_eq!(launch.platform.as_deref(), Some("ios"));
        assert_eq!(launch.start_param(), Some("payment_success_42"));
        assert_eq!(
            launch.theme.css_variables(),
            vec![
                ("--tg-theme-bg-color", "#ffffff".to_string()),
                ("--tg-theme-button-color", "#2481cc".to_string()),
            ]
        );
    }

    #[test]
    fn query_values_decode_plus_as_space() {
        let launch = LaunchParams::from_url(
            "https://app.example/?tgWebAppStartParam=payment+failed%21&tgWebAppVersion=7.0",
        );
        assert_eq!(launch.url_start_param.as_deref(), Some("payment failed!"));
        assert_eq!(launch.version.as_deref(), Some("7.0"));
    }

    #[test]
    fn url_start_param_is_a_fallback() {
        let launch = LaunchParams::from_url("https://app.example/?tgWebAppStartParam=payment_failed");
        assert_eq!(launch.start_param(), Some("payment_failed"));
        assert!(launch.init_data.user.is_none());
    }

    #[test]
    fn detection_covers_every_signal() {
        let plain = HostEnvironment::default();
        assert!(!detect_host(&plain, &plain.launch_params()));

        let by_url = HostEnvironment {
            launch_url: Some("https://app.example/?tgWebAppStartParam=x".into()),
            ..Default::default()
        };
        assert!(detect_host(&by_url, &by_url.launch_params()));

        let by_agent = HostEnvironment {
            user_agent: Some("Mozilla/5.0 TelegramBot-Like".into()),
            ..Default::default()
        };
        assert!(detect_host(&by_agent, &by_agent.launch_params()));

        let by_referrer = HostEnvironment {
            referrer: Some("https://t.me/prizma_bot".into()),
            ..Default::default()
        };
        assert!(detect_host(&by_referrer, &by_referrer.launch_params()));
    }

    #[test]
    fn referrer_must_be_a_telegram_host() {
        let hosted = |referrer: &str| {
            let env = HostEnvironment {
                referrer: Some(referrer.into()),
                ..Default::default()
            };
            detect_host(&env, &env.launch_params())
        };

        assert!(hosted("https://web.telegram.org/k/"));
        assert!(hosted("https://T.ME/prizma_bot"));
        assert!(!hosted("https://robert.me/blog"));
        assert!(!hosted("https://notelegram.org/"));
        assert!(!hosted("https://example.com/?from=t.me"));
        assert!(!hosted("t.me"));
    }

    #[test]
    fn unknown_platform_forces_standalone() {
        let env = HostEnvironment {
            launch_url: Some(format!(
                "https://app.example/#tgWebAppData={}&tgWebAppPlatform=unknown",
                urlencoding::encode(INIT_DATA)
            )),
            user_agent: Some("Telegram".into()),
            ..Default::default()
        };
        assert!(!detect_host(&env, &env.launch_params()));
    }
}
