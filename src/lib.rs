//! Prizma Mini App client
//!
//! Drives the Prizma psychological-assessment flow against its backend:
//! - Telegram Web App bridge with a standalone fallback
//! - Page controllers for the questionnaire, pricing and report pages
//! - Report-readiness policy and polling loops
//! - Special-offer countdown and pricing display
//! - Prometheus metrics for commands, API calls and navigation

pub mod app;
pub mod bridge;
pub mod config;
pub mod error;
pub mod integrations;
pub mod metrics;
pub mod models;
pub mod offer;
pub mod pages;
pub mod policy;
pub mod polling;
pub mod routing;
pub mod session;
pub mod storage;

// Re-export common types
pub use app::{App, Landing};
pub use bridge::{HostBridge, HostEnvironment, ImpactStyle, LaunchParams};
pub use config::Config;
pub use error::{Error, Result};
pub use integrations::BackendClient;
pub use pages::{PageOutcome, View};
pub use policy::{Decision, Policy, Rule};
pub use routing::Page;
pub use session::Session;
pub use storage::LocalStorage;
