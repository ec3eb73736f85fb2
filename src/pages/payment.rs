//! Waiting room while the user completes checkout.

use super::{Controls, PageOutcome, View};
use crate::error::Result;
use crate::polling::PaymentMonitor;
use crate::routing::Page;
use crate::session::Session;

pub fn controls() -> Controls {
    Controls::hidden().with_back(Page::Price)
}

/// Blocks until the payment settles or the monitor times out.
pub async fn load(session: &Session) -> Result<PageOutcome> {
    let outcome = PaymentMonitor::new(session).run().await;
    Ok(match outcome.page() {
        Some(page) => PageOutcome::Redirect(page),
        None => PageOutcome::Stay(View::Static),
    })
}
