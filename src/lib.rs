//! Post Box - anonymous and private letter exchange.
//!
//! Users register for a six-digit postal code and send either public letters,
//! shown in a feed without their author, or private letters addressed to a
//! postal code. Each channel has its own cooldown and every letter passes a
//! moderation gate before delivery.

pub mod clock;
pub mod config;
pub mod db;
pub mod delivery;
pub mod error;
pub mod i18n;
pub mod identity;
pub mod letter;
pub mod logging;
pub mod moderation;
pub mod web;

use std::sync::Arc;

pub use config::Config;
pub use error::{PostboxError, Result};

use clock::Clock;
use db::KvStore;
use delivery::PostOffice;
use i18n::I18nManager;
use identity::IdentityStore;
use letter::LetterStore;
use moderation::Moderator;
use web::AppState;

/// Load both stores from `kv` and assemble the state shared by the handlers.
pub async fn build_state(
    config: &Config,
    kv: Arc<dyn KvStore>,
    moderator: Arc<dyn Moderator>,
    clock: Arc<dyn Clock>,
) -> Result<Arc<AppState>> {
    let identities = Arc::new(IdentityStore::load(kv.clone(), clock.clone()).await?);
    let letters = Arc::new(LetterStore::load(kv.clone(), clock.as_ref()).await?);
    let office = PostOffice::new(kv, identities, letters, moderator, clock, &config.postbox);

    let mut i18n = I18nManager::builtin().map_err(|e| PostboxError::Config(e.to_string()))?;
    i18n.set_default(&config.locale.language)
        .map_err(|e| PostboxError::Config(format!("locale.language: {e}")))?;

    Ok(Arc::new(AppState::new(Arc::new(office), Arc::new(i18n))))
}
