//! Page driver: opens pages, follows redirects and wires the host buttons.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::metrics;
use crate::pages::{self, ButtonAction, PageOutcome, View};
use crate::routing::{page_for_start_param, Page};
use crate::session::Session;

/// Redirects followed for one navigation before giving up.
pub const MAX_REDIRECTS: usize = 16;

/// Where a navigation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Landing {
    Shown { page: Page, view: View },
    /// An action ran without changing the page.
    Unchanged { page: Page },
    /// The user was sent to an external URL from `page`.
    External { page: Page, url: String },
    Closed,
}

impl Landing {
    pub fn page(&self) -> Option<Page> {
        match self {
            Landing::Shown { page, .. }
            | Landing::Unchanged { page }
            | Landing::External { page, .. } => Some(*page),
            Landing::Closed => None,
        }
    }
}

pub struct App {
    session: Session,
    current: Option<Page>,
    max_redirects: usize,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            current: None,
            max_redirects: MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current(&self) -> Option<Page> {
        self.current
    }

    /// First page of a run. A payment `start_param` overrides `page`.
    pub async fn start(&mut self, page: Page) -> Result<Landing> {
        let bridge = self.session.bridge();
        bridge.ready();
        bridge.expand();

        for (name, value) in bridge.theme().css_variables() {
            debug!(variable = name, %value, "Theme variable");
        }

        let target = match bridge.start_param() {
            Some(param) => match page_for_start_param(param) {
                Some(redirect) => {
                    info!(start_param = param, page = redirect.name(), "Start parameter redirect");
                    redirect
                }
                None => page,
            },
            None => page,
        };

        self.open(target).await
    }

    /// Show `page`, following every redirect its checks produce.
    pub async fn open(&mut self, page: Page) -> Result<Landing> {
        let mut page = page;
        let mut hops = 0;

        loop {
            self.enter(page);
            match pages::load(page, &self.session).await? {
                PageOutcome::Stay(view) => return Ok(Landing::Shown { page, view }),
                PageOutcome::Redirect(next) => {
                    hops += 1;
                    if hops >= self.max_redirects {
                        warn!(hops, page = next.name(), "Redirect limit reached");
                        return Err(Error::RedirectLoop(hops));
                    }
                    page = next;
                }
                PageOutcome::Reload => {
                    hops += 1;
                    if hops >= self.max_redirects {
                        return Err(Error::RedirectLoop(hops));
                    }
                }
                PageOutcome::External(url) => return Ok(self.leave(page, url)),
                PageOutcome::Unchanged => return Ok(Landing::Unchanged { page }),
                PageOutcome::Closed => return Ok(Landing::Closed),
            }
        }
    }

    /// Carry out the outcome of a page action.
    pub async fn follow(&mut self, outcome: PageOutcome) -> Result<Landing> {
        let Some(page) = self.current else {
            return Err(Error::InvalidArgument("no page is open".into()));
        };

        match outcome {
            PageOutcome::Stay(view) => Ok(Landing::Shown { page, view }),
            PageOutcome::Redirect(next) => self.open(next).await,
            PageOutcome::Reload => self.open(page).await,
            PageOutcome::External(url) => Ok(self.leave(page, url)),
            PageOutcome::Unchanged => Ok(Landing::Unchanged { page }),
            PageOutcome::Closed => Ok(Landing::Closed),
        }
    }

    pub async fn press_main(&mut self) -> Result<Landing> {
        let page = self.require_current()?;
        match pages::controls(page).main.map(|button| button.action) {
            Some(ButtonAction::Navigate(next)) => self.open(next).await,
            Some(ButtonAction::CloseApp) => {
                self.session.bridge().close();
                Ok(Landing::Closed)
            }
            None => Ok(Landing::Unchanged { page }),
        }
    }

    pub async fn press_back(&mut self) -> Result<Landing> {
        let page = self.require_current()?;
        match pages::controls(page).back {
            Some(previous) => self.open(previous).await,
            None => Ok(Landing::Unchanged { page }),
        }
    }

    fn require_current(&self) -> Result<Page> {
        self.current
            .ok_or_else(|| Error::InvalidArgument("no page is open".into()))
    }

    fn enter(&mut self, page: Page) {
        let from = self.current.map(|p| p.name()).unwrap_or("none");
        metrics::record_navigation(from, page.name());
        debug!(from, to = page.name(), "Navigating");

        self.current = Some(page);
        pages::controls(page).apply(self.session.bridge());
    }

    fn leave(&self, page: Page, url: String) -> Landing {
        info!(page = page.name(), %url, "Opening external link");
        self.session.bridge().open_link(&url);
        Landing::External { page, url }
    }
}
