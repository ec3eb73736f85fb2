//! Answers overview page. Purely static.

use super::{Controls, PageOutcome, View};
use crate::error::Result;
use crate::session::Session;

pub fn controls() -> Controls {
    Controls::hidden()
}

pub async fn load(_session: &Session) -> Result<PageOutcome> {
    Ok(PageOutcome::Stay(View::Static))
}
