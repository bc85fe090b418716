//! Letter store: the authoritative letter collection and its feed views.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{info, warn};

use super::types::{Letter, LetterKind};
use crate::clock::Clock;
use crate::db::{load_json, save_json, KvStore};
use crate::identity::PostalCode;
use crate::Result;

/// Record holding every letter, most recent first.
pub const LETTERS_KEY: &str = "postbox_letters";

/// Letters placed in an empty store on first start.
pub fn seed_letters(now: DateTime<Utc>) -> Vec<Letter> {
    let base = now - Duration::seconds(100);
    let seed = |id: &str, content: &str, sender: &str, at: DateTime<Utc>| Letter {
        id: id.to_string(),
        content: content.to_string(),
        sender_code: PostalCode::new_unchecked(sender),
        recipient_code: None,
        timestamp: at,
        kind: LetterKind::Public,
        is_anonymous: true,
        reply_to_id: None,
    };

    vec![
        seed(
            "seed-1",
            "To whoever reads this: The stars look different tonight. I hope you find what you are looking for.",
            "123456",
            base,
        ),
        seed(
            "seed-2",
            "The rain hasn't stopped for three days. It feels like the sky is trying to wash the slate clean.",
            "987654",
            base + Duration::seconds(5),
        ),
    ]
}

/// Newest first; the sort is stable so equal timestamps keep storage order.
fn newest_first(mut letters: Vec<Letter>) -> Vec<Letter> {
    letters.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    letters
}

/// All letters, loaded once from the persistence boundary.
pub struct LetterStore {
    kv: Arc<dyn KvStore>,
    letters: RwLock<Vec<Letter>>,
}

impl LetterStore {
    /// Load the letter collection, seeding it if none has ever been stored.
    pub async fn load(kv: Arc<dyn KvStore>, clock: &dyn Clock) -> Result<Self> {
        let letters = match load_json::<Vec<Letter>>(kv.as_ref(), LETTERS_KEY).await? {
            Some(letters) => {
                info!(count = letters.len(), "Loaded letters");
                letters
            }
            None => {
                let seeded = seed_letters(clock.now());
                save_json(kv.as_ref(), LETTERS_KEY, &seeded).await?;
                info!(count = seeded.len(), "Seeded empty letter store");
                seeded
            }
        };

        Ok(Self {
            kv,
            letters: RwLock::new(letters),
        })
    }

    /// Public letters, newest first.
    pub async fn public_feed(&self) -> Vec<Letter> {
        let letters = self.letters.read().await;
        newest_first(letters.iter().filter(|l| l.is_public()).cloned().collect())
    }

    /// Letters addressed to `code`, newest first.
    pub async fn inbox(&self, code: &PostalCode) -> Vec<Letter> {
        let letters = self.letters.read().await;
        newest_first(
            letters
                .iter()
                .filter(|l| l.recipient_code.as_ref() == Some(code))
                .cloned()
                .collect(),
        )
    }

    /// Letters written by `code`, newest first.
    pub async fn sent(&self, code: &PostalCode) -> Vec<Letter> {
        let letters = self.letters.read().await;
        newest_first(
            letters
                .iter()
                .filter(|l| &l.sender_code == code)
                .cloned()
                .collect(),
        )
    }

    /// Look up a letter by id.
    pub async fn get(&self, id: &str) -> Option<Letter> {
        self.letters.read().await.iter().find(|l| l.id == id).cloned()
    }

    /// Number of stored letters.
    pub async fn len(&self) -> usize {
        self.letters.read().await.len()
    }

    /// Whether no letters are stored.
    pub async fn is_empty(&self) -> bool {
        self.letters.read().await.is_empty()
    }

    /// Exclusive access to the collection, for writes that span stores.
    pub(crate) async fn write_letters(&self) -> RwLockWriteGuard<'_, Vec<Letter>> {
        self.letters.write().await
    }

    /// Prepend a letter and persist the collection.
    ///
    /// If the write fails the letter is removed again and the error returned.
    pub async fn append(&self, letter: Letter) -> Result<()> {
        let mut letters = self.letters.write().await;
        let id = letter.id.clone();
        letters.insert(0, letter);

        if let Err(e) = save_json(self.kv.as_ref(), LETTERS_KEY, &*letters).await {
            warn!(letter_id = %id, error = %e, "Failed to persist letter");
            letters.remove(0);
            return Err(e);
        }
        Ok(())
    }
}
