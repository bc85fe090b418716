//! Content moderation for Post Box.
//!
//! Every letter passes a [`Moderator`] before delivery. The gate never fails:
//! it answers allow or deny, and any trouble reaching the classifier is
//! treated as allow.

mod gemini;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::ModerationConfig;
use crate::Result;

pub use gemini::{build_request_body, parse_verdict, GeminiModerator};

/// Content-safety oracle.
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Whether `text` may be delivered.
    async fn is_safe(&self, text: &str) -> bool;
}

/// Moderator used when no classifier credential is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveModerator;

#[async_trait]
impl Moderator for PermissiveModerator {
    async fn is_safe(&self, _text: &str) -> bool {
        warn!("No moderation API key configured, skipping safety check");
        true
    }
}

/// Build the moderator described by the configuration.
pub fn from_config(config: &ModerationConfig) -> Result<Arc<dyn Moderator>> {
    if !config.is_enabled() {
        warn!("Moderation disabled: letters will be delivered unchecked");
        return Ok(Arc::new(PermissiveModerator));
    }

    Ok(Arc::new(GeminiModerator::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permissive_allows_everything() {
        let moderator = PermissiveModerator;
        assert!(moderator.is_safe("anything at all").await);
        assert!(moderator.is_safe("").await);
    }

    #[tokio::test]
    async fn test_from_config_without_key_is_permissive() {
        let config = ModerationConfig {
            api_key: "   ".to_string(),
            ..Default::default()
        };
        let moderator = from_config(&config).unwrap();
        assert!(moderator.is_safe("hello").await);
    }

    #[test]
    fn test_from_config_with_key_builds_client() {
        let config = ModerationConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        assert!(from_config(&config).is_ok());
    }
}
