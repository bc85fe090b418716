//! API handlers for the web API.

pub mod i18n;
pub mod identity;
pub mod letters;

use std::sync::Arc;

use axum_extra::extract::CookieJar;

use crate::delivery::PostOffice;
use crate::i18n::{I18n, I18nManager};
use crate::identity::User;
use crate::web::error::ApiError;
use crate::web::session::session_id;

pub use i18n::*;
pub use identity::*;
pub use letters::*;

/// Application state shared across handlers.
pub struct AppState {
    /// Delivery workflow and the stores behind it.
    pub office: Arc<PostOffice>,
    /// String tables.
    pub i18n: Arc<I18nManager>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(office: Arc<PostOffice>, i18n: Arc<I18nManager>) -> Self {
        Self { office, i18n }
    }

    /// String table for `lang`, falling back to the default locale.
    pub fn strings(&self, lang: Option<&str>) -> &I18n {
        self.i18n
            .get_or_default(lang.unwrap_or_else(|| self.i18n.default_locale()))
    }

    /// The user registered in the request's session.
    pub async fn require_user(
        &self,
        jar: &CookieJar,
        lang: Option<&str>,
    ) -> Result<(String, User), ApiError> {
        let not_registered = || ApiError::not_found(self.strings(lang).t("error.not_registered"));

        let session = session_id(jar).ok_or_else(not_registered)?;
        let user = self
            .office
            .identities()
            .current_user(&session)
            .await?
            .ok_or_else(not_registered)?;

        Ok((session, user))
    }
}
