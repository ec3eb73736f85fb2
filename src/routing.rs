//! Static page routing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the app's static pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Index,
    Steps,
    Login,
    Question,
    Loading,
    Answers,
    Price,
    PriceOffer,
    Payment,
    Download,
    CompletePayment,
    UncompletePayment,
}

impl Page {
    pub const ALL: [Page; 12] = [
        Page::Index,
        Page::Steps,
        Page::Login,
        Page::Question,
        Page::Loading,
        Page::Answers,
        Page::Price,
        Page::PriceOffer,
        Page::Payment,
        Page::Download,
        Page::CompletePayment,
        Page::UncompletePayment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Page::Index => "index",
            Page::Steps => "steps",
            Page::Login => "login",
            Page::Question => "question",
            Page::Loading => "loading",
            Page::Answers => "answers",
            Page::Price => "price",
            Page::PriceOffer => "price-offer",
            Page::Payment => "payment",
            Page::Download => "download",
            Page::CompletePayment => "complete-payment",
            Page::UncompletePayment => "uncomplete-payment",
        }
    }

    pub fn filename(&self) -> String {
        format!("{}.html", self.name())
    }

    /// Resolve a page from a filename, a bare name or a URL path.
    pub fn from_filename(value: &str) -> Option<Page> {
        let path = value.split(['?', '#']).next().unwrap_or_default();
        let file = path.rsplit('/').next().unwrap_or_default();
        if file.is_empty() {
            return Some(Page::Index);
        }
        let name = file.strip_suffix(".html").unwrap_or(file);
        Page::ALL.into_iter().find(|page| page.name() == name)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immediate redirect requested by the bot through `start_param`.
pub fn page_for_start_param(param: &str) -> Option<Page> {
    let matches = |prefix: &str| {
        param == prefix
            || param
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('_'))
    };

    if matches("payment_success") {
        Some(Page::CompletePayment)
    } else if matches("payment_failed") {
        Some(Page::UncompletePayment)
    } else {
        None
    }
}
