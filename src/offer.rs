//! Special-offer countdown and pricing display.

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::models::{Pricing, TimerResponse};
use crate::storage::{keys, LocalStorage};

pub const EXPIRED_TIME: &str = "00:00:00";
/// Shown when the backend timer is unavailable.
pub const FALLBACK_TIME: &str = "23:59:59";
/// Offer state survives a failed checkout for this long.
pub const OFFER_RESTORE_WINDOW: Duration = Duration::from_secs(5 * 60);

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_hms(total_seconds: i64) -> String {
    if total_seconds <= 0 {
        return EXPIRED_TIME.to_string();
    }
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Price with thousands grouping and the rouble suffix: `4,999р`.
pub fn format_price(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}р", grouped)
}

/// Seconds left of an offer that started at `started_at` and lasts `duration`.
pub fn remaining_seconds(
    started_at: NaiveDateTime,
    now: NaiveDateTime,
    duration: chrono::Duration,
) -> i64 {
    let elapsed = now.signed_duration_since(started_at);
    (duration - elapsed).num_seconds().max(0)
}

/// One-second countdown frames, ending with [`EXPIRED_TIME`].
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: i64,
    done: bool,
}

impl Countdown {
    pub fn new(remaining_seconds: i64) -> Self {
        Self {
            remaining: remaining_seconds,
            done: false,
        }
    }

    pub fn remaining(&self) -> i64 {
        self.remaining.max(0)
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0
    }
}

impl Iterator for Countdown {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        if self.remaining <= 0 {
            self.done = true;
            return Some(EXPIRED_TIME.to_string());
        }
        let frame = format_hms(self.remaining);
        self.remaining -= 1;
        Some(frame)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceView {
    pub current: String,
    /// Crossed-out price, shown only while the offer runs.
    pub original: Option<String>,
}

impl From<&Pricing> for PriceView {
    fn from(pricing: &Pricing) -> Self {
        Self {
            current: format_price(pricing.current_price),
            original: pricing
                .is_offer_active
                .then(|| format_price(pricing.original_price)),
        }
    }
}

/// What the price-offer page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferView {
    pub time: String,
    pub expired: bool,
    pub remaining_seconds: Option<i64>,
    pub price: Option<PriceView>,
}

impl OfferView {
    pub fn fallback() -> Self {
        Self {
            time: FALLBACK_TIME.to_string(),
            expired: false,
            remaining_seconds: None,
            price: None,
        }
    }

    /// Build the view from the timer endpoint. Without a usable timer, users
    /// who were on the offer before still see it with the fallback time.
    pub fn from_timer(response: &TimerResponse, was_on_offer: bool) -> Option<Self> {
        let timer = response
            .timer
            .as_ref()
            .filter(|_| response.status.as_deref() == Some("success"));

        match timer {
            Some(timer) => {
                let expired = timer.is_expired || timer.remaining_seconds <= 0;
                let time = if expired {
                    EXPIRED_TIME.to_string()
                } else if timer.time_string.is_empty() {
                    format_hms(timer.remaining_seconds)
                } else {
                    timer.time_string.clone()
                };
                Some(Self {
                    time,
                    expired,
                    remaining_seconds: Some(timer.remaining_seconds.max(0)),
                    price: response.pricing.as_ref().map(PriceView::from),
                })
            }
            None if was_on_offer => Some(Self::fallback()),
            None => None,
        }
    }

    pub fn countdown(&self) -> Option<Countdown> {
        self.remaining_seconds.map(Countdown::new)
    }
}

/// Offer-return flags read on the price-offer page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferReturn {
    pub was_on_offer: bool,
    /// Returned within [`OFFER_RESTORE_WINDOW`]; the flags were cleared.
    pub restored: bool,
}

/// Note that the user left the offer for a checkout that did not complete.
pub fn remember_offer_return(storage: &LocalStorage, now_ms: i64) {
    let result = storage
        .set_flag(keys::WAS_ON_SPECIAL_OFFER)
        .and_then(|_| storage.set(keys::SPECIAL_OFFER_TIMESTAMP, now_ms.to_string()));
    if let Err(err) = result {
        warn!("Failed to store offer return flags: {}", err);
    }
}

pub fn restore_offer_return(storage: &LocalStorage, now_ms: i64) -> OfferReturn {
    let was_on_offer = storage.flag(keys::WAS_ON_SPECIAL_OFFER);
    let timestamp = storage.get_i64(keys::SPECIAL_OFFER_TIMESTAMP);

    let restored = match (was_on_offer, timestamp) {
        (true, Some(ts)) => {
            let window = OFFER_RESTORE_WINDOW.as_millis() as i64;
            now_ms.saturating_sub(ts) < window
        }
        _ => false,
    };

    if restored {
        debug!("Restoring special offer after failed payment");
        for key in [keys::WAS_ON_SPECIAL_OFFER, keys::SPECIAL_OFFER_TIMESTAMP] {
            if let Err(err) = storage.remove(key) {
                warn!(key, "Failed to clear offer flag: {}", err);
            }
        }
    }

    OfferReturn {
        was_on_offer,
        restored,
    }
}
