//! Post office: the letter delivery workflow.
//!
//! A send moves through validation, moderation, the cooldown check and
//! persistence, and stops at the first gate that refuses it. Refusals are
//! reported as [`DeliveryOutcome::Rejected`] and leave every store untouched.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::cooldown::{CooldownPolicy, CooldownStatus};
use super::types::{DeliveryOutcome, DeliveryStage, RejectReason, SendLetterRequest};
use crate::clock::Clock;
use crate::config::PostboxConfig;
use crate::db::KvStore;
use crate::identity::{upsert_user, IdentityStore, PostalCode, User, USERS_KEY};
use crate::letter::{Letter, LetterKind, LetterStore, LETTERS_KEY};
use crate::moderation::Moderator;
use crate::{PostboxError, Result};

/// A send that passed validation.
struct ValidatedSend {
    content: String,
    kind: LetterKind,
    recipient: Option<PostalCode>,
    reply_to_id: Option<String>,
}

/// Service that delivers letters.
pub struct PostOffice {
    kv: Arc<dyn KvStore>,
    identities: Arc<IdentityStore>,
    letters: Arc<LetterStore>,
    moderator: Arc<dyn Moderator>,
    clock: Arc<dyn Clock>,
    policy: CooldownPolicy,
    max_content_length: usize,
    /// Serializes the cooldown check with the write that consumes it.
    send_lock: Mutex<()>,
}

impl PostOffice {
    /// Create a post office over the given stores.
    ///
    /// `kv` must be the backend both stores were loaded from.
    pub fn new(
        kv: Arc<dyn KvStore>,
        identities: Arc<IdentityStore>,
        letters: Arc<LetterStore>,
        moderator: Arc<dyn Moderator>,
        clock: Arc<dyn Clock>,
        config: &PostboxConfig,
    ) -> Self {
        Self {
            kv,
            identities,
            letters,
            moderator,
            clock,
            policy: CooldownPolicy::hours(config.cooldown_hours),
            max_content_length: config.max_content_length,
            send_lock: Mutex::new(()),
        }
    }

    /// The identity store.
    pub fn identities(&self) -> &Arc<IdentityStore> {
        &self.identities
    }

    /// The letter store.
    pub fn letters(&self) -> &Arc<LetterStore> {
        &self.letters
    }

    /// Maximum letter length in characters.
    pub fn max_content_length(&self) -> usize {
        self.max_content_length
    }

    /// Cooldown state of one of `user`'s channels right now.
    pub fn cooldown(&self, user: &User, kind: LetterKind) -> CooldownStatus {
        self.policy.check(user.last_post(kind), self.clock.now())
    }

    /// Send a letter as the user registered in `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session has no registered user
    /// - The user or the letter could not be persisted
    pub async fn send(&self, session: &str, request: &SendLetterRequest) -> Result<DeliveryOutcome> {
        let sender = self
            .identities
            .current_user(session)
            .await?
            .ok_or_else(|| PostboxError::NotFound("user".to_string()))?;

        self.send_as(sender.postal_code, request).await
    }

    /// Send a letter as the registered user `sender`.
    pub async fn send_as(
        &self,
        sender: PostalCode,
        request: &SendLetterRequest,
    ) -> Result<DeliveryOutcome> {
        debug!(sender = %sender, kind = %request.kind, stage = DeliveryStage::Validating.as_str());
        let send = match self.validate(request).await {
            Ok(send) => send,
            Err(reason) => return Ok(self.reject(&sender, reason)),
        };

        debug!(sender = %sender, stage = DeliveryStage::Moderating.as_str());
        if !self.moderator.is_safe(&send.content).await {
            return Ok(self.reject(&sender, RejectReason::ContentRejected));
        }

        let _guard = self.send_lock.lock().await;

        debug!(sender = %sender, stage = DeliveryStage::RateCheck.as_str());
        let mut user = self
            .identities
            .find(&sender)
            .await
            .ok_or_else(|| PostboxError::NotFound("user".to_string()))?;
        let now = self.clock.now();

        let status = self.policy.check(user.last_post(send.kind), now);
        if !status.is_ready() {
            let remaining_hours = status.remaining_hours();
            return Ok(self.reject(&sender, RejectReason::CooldownActive { remaining_hours }));
        }

        debug!(sender = %sender, stage = DeliveryStage::Persisting.as_str());
        user.record_post(send.kind, now);

        let mut letter = match send.recipient {
            Some(recipient) => Letter::private(send.content, sender.clone(), recipient, now),
            None => Letter::public(send.content, sender.clone(), now),
        };
        if let Some(original) = send.reply_to_id {
            letter = letter.in_reply_to(original);
        }

        self.commit(&user, &letter).await?;

        info!(
            letter_id = %letter.id,
            kind = %letter.kind,
            stage = DeliveryStage::Done.as_str(),
            "Letter delivered"
        );
        Ok(DeliveryOutcome::Delivered(letter))
    }

    /// Write the user's new cooldown and the letter in one batch.
    ///
    /// Memory is only updated once both documents are stored.
    async fn commit(&self, user: &User, letter: &Letter) -> Result<()> {
        let mut users = self.identities.write_users().await;
        let mut letters = self.letters.write_letters().await;

        let mut next_users = users.clone();
        upsert_user(&mut next_users, user);
        let mut next_letters = Vec::with_capacity(letters.len() + 1);
        next_letters.push(letter.clone());
        next_letters.extend(letters.iter().cloned());

        let users_doc = serde_json::to_string(&next_users)?;
        let letters_doc = serde_json::to_string(&next_letters)?;
        if let Err(e) = self
            .kv
            .put_many(&[(USERS_KEY, users_doc.as_str()), (LETTERS_KEY, letters_doc.as_str())])
            .await
        {
            error!(sender = %user.postal_code, error = %e, "Failed to persist letter");
            return Err(e);
        }

        *users = next_users;
        *letters = next_letters;
        Ok(())
    }

    async fn validate(&self, request: &SendLetterRequest) -> std::result::Result<ValidatedSend, RejectReason> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(RejectReason::EmptyContent);
        }
        if content.chars().count() > self.max_content_length {
            return Err(RejectReason::ContentTooLong {
                max: self.max_content_length,
            });
        }

        let (recipient, reply_to_id) = match request.kind {
            LetterKind::Public => (None, None),
            LetterKind::Private => match &request.reply_to_id {
                // A reply is addressed to the original's author, whatever code was given.
                Some(original_id) => {
                    let original = self
                        .letters
                        .get(original_id)
                        .await
                        .filter(Letter::is_public)
                        .ok_or(RejectReason::InvalidRecipient)?;
                    (Some(original.sender_code), Some(original.id))
                }
                None => {
                    let code = request
                        .recipient_code
                        .as_deref()
                        .and_then(PostalCode::parse)
                        .ok_or(RejectReason::InvalidRecipient)?;
                    (Some(code), None)
                }
            },
        };

        Ok(ValidatedSend {
            content: content.to_string(),
            kind: request.kind,
            recipient,
            reply_to_id,
        })
    }

    fn reject(&self, sender: &PostalCode, reason: RejectReason) -> DeliveryOutcome {
        info!(
            sender = %sender,
            reason = reason.code(),
            stage = reason.stage().as_str(),
            "Letter rejected"
        );
        DeliveryOutcome::Rejected(reason)
    }
}
