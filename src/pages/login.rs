//! Profile form (name, age, gender) shown before the first question.

use chrono::Utc;
use tracing::{info, warn};

use super::{progress_route, Controls, PageOutcome, View};
use crate::bridge::ImpactStyle;
use crate::error::{Error, Result};
use crate::models::{Gender, ProfileResponse, UserProfile};
use crate::offer;
use crate::routing::Page;
use crate::session::Session;

pub const INCOMPLETE_FORM: &str = "Please fill in all fields.";
pub const SAVE_ERROR: &str = "Failed to save your data. Please try again.";

/// Ages accepted by the form, exclusive on both ends.
const AGE_BOUNDS: (u32, u32) = (0, 120);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

impl ProfileForm {
    pub fn new(name: impl Into<String>, age: u32, gender: Gender) -> Self {
        Self {
            name: name.into(),
            age: Some(age),
            gender: Some(gender),
        }
    }

    /// Prefill from an existing profile; unusable fields stay empty.
    pub fn from_profile(profile: &ProfileResponse) -> Option<Self> {
        let user = profile.user.as_ref()?;
        Some(Self {
            name: user.name.clone().unwrap_or_default(),
            age: user.age.and_then(|age| u32::try_from(age).ok()),
            gender: user.gender.as_deref().and_then(Gender::parse),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<UserProfile> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument("name is required".into()));
        }
        let age = self
            .age
            .filter(|age| *age > AGE_BOUNDS.0 && *age < AGE_BOUNDS.1)
            .ok_or_else(|| Error::InvalidArgument("age must be between 1 and 119".into()))?;
        let gender = self
            .gender
            .ok_or_else(|| Error::InvalidArgument("gender is required".into()))?;

        Ok(UserProfile {
            name: name.to_string(),
            age,
            gender: gender.as_str().to_string(),
        })
    }
}

/// Countdown of the special offer started for this user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferCountdown {
    pub remaining_seconds: i64,
}

impl OfferCountdown {
    pub fn is_expired(&self) -> bool {
        self.remaining_seconds <= 0
    }

    pub fn display(&self) -> String {
        offer::format_hms(self.remaining_seconds)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginView {
    pub prefill: Option<ProfileForm>,
    pub offer: Option<OfferCountdown>,
}

pub fn controls() -> Controls {
    Controls::hidden().with_back(Page::Steps)
}

pub async fn load(session: &Session) -> Result<PageOutcome> {
    let user_id = session.user_id();

    match session.api().get_progress(user_id).await {
        Ok(progress) => {
            if let Some(page) = progress_route(&progress) {
                return Ok(PageOutcome::Redirect(page));
            }
        }
        Err(err) => warn!(user_id, "Progress check failed: {}", err),
    }

    let view = match session.api().get_profile(user_id).await {
        Ok(profile) => {
            let offer = profile
                .user
                .as_ref()
                .and_then(|u| u.special_offer_started_at)
                .map(|started| OfferCountdown {
                    remaining_seconds: offer::remaining_seconds(
                        started,
                        Utc::now().naive_utc(),
                        session.config().special_offer_duration(),
                    ),
                });
            LoginView {
                prefill: ProfileForm::from_profile(&profile),
                offer,
            }
        }
        Err(err) => {
            warn!(user_id, "Profile prefill failed: {}", err);
            LoginView::default()
        }
    };

    Ok(PageOutcome::Stay(View::Login(view)))
}

/// Save the form and start the questionnaire.
pub async fn submit_profile(session: &Session, form: &ProfileForm) -> Result<PageOutcome> {
    let bridge = session.bridge();
    let profile = match form.validate() {
        Ok(profile) => profile,
        Err(_) => {
            bridge.show_alert(INCOMPLETE_FORM);
            return Ok(PageOutcome::Unchanged);
        }
    };

    let user_id = session.user_id();
    if let Err(err) = session.api().save_profile(user_id, &profile).await {
        warn!(user_id, "Profile save failed: {}", err);
        bridge.show_alert(SAVE_ERROR);
        return Ok(PageOutcome::Unchanged);
    }

    info!(user_id, "Profile saved");
    bridge.haptic(ImpactStyle::Light);
    Ok(PageOutcome::Redirect(Page::Question))
}
