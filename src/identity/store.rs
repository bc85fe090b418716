//! Identity store: registered users and session identities.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

use super::code::{generate_code, PostalCode};
use super::types::User;
use crate::clock::Clock;
use crate::db::{load_json, save_json, KvStore};
use crate::{PostboxError, Result};

/// Record holding every registered user.
pub const USERS_KEY: &str = "postbox_users_db";

/// Record holding the current session's user.
///
/// Named sessions are stored under `postbox_user:<session>`; the empty
/// session name uses the bare key.
pub const SESSION_USER_KEY: &str = "postbox_user";

/// Attempts at drawing an unused postal code before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 64;

/// Count of distinct assignable codes (9 * 8 * 7 * 6 * 5 * 4).
pub const CODE_SPACE: usize = 60_480;

/// Record key for a session's identity.
pub fn session_key(session: &str) -> String {
    if session.is_empty() {
        SESSION_USER_KEY.to_string()
    } else {
        format!("{SESSION_USER_KEY}:{session}")
    }
}

/// Draw a code not used by any of `users`.
pub fn unique_code<F>(users: &[User], mut generate: F) -> Result<PostalCode>
where
    F: FnMut() -> PostalCode,
{
    if users.len() >= CODE_SPACE {
        return Err(PostboxError::Conflict("all postal codes are taken".to_string()));
    }

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = generate();
        if users.iter().all(|u| u.postal_code != code) {
            return Ok(code);
        }
        debug!(attempt, code = %code, "Postal code collision, drawing again");
    }

    Err(PostboxError::Conflict(format!(
        "no free postal code after {MAX_CODE_ATTEMPTS} attempts"
    )))
}

/// Replace the user with the same postal code, or add it.
pub(crate) fn upsert_user(users: &mut Vec<User>, user: &User) {
    match users.iter_mut().find(|u| u.postal_code == user.postal_code) {
        Some(slot) => *slot = user.clone(),
        None => users.push(user.clone()),
    }
}

/// Users and session identities, loaded once from the persistence boundary.
pub struct IdentityStore {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    users: RwLock<Vec<User>>,
}

impl IdentityStore {
    /// Load the user collection.
    pub async fn load(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let users: Vec<User> = load_json(kv.as_ref(), USERS_KEY).await?.unwrap_or_default();
        info!(count = users.len(), "Loaded registered users");

        Ok(Self {
            kv,
            clock,
            users: RwLock::new(users),
        })
    }

    /// Register a user for `session`.
    ///
    /// If the session already has an identity it is returned unchanged and
    /// `username` is ignored.
    pub async fn register(&self, session: &str, username: &str) -> Result<User> {
        let mut users = self.users.write().await;

        if let Some(existing) = self.session_user(&users, session).await? {
            debug!(code = %existing.postal_code, "Session already registered");
            return Ok(existing);
        }

        let username = username.trim();
        if username.is_empty() {
            return Err(PostboxError::Validation("username must not be empty".to_string()));
        }

        let code = unique_code(&users, generate_code)?;
        let user = User::new(username, code, self.clock.now());

        users.push(user.clone());
        if let Err(e) = save_json(self.kv.as_ref(), USERS_KEY, &*users).await {
            users.pop();
            return Err(e);
        }

        if let Err(e) = save_json(self.kv.as_ref(), &session_key(session), &user).await {
            warn!(
                code = %user.postal_code,
                error = %e,
                "Failed to persist session, undoing registration"
            );
            users.pop();
            if let Err(restore) = save_json(self.kv.as_ref(), USERS_KEY, &*users).await {
                error!(
                    code = %user.postal_code,
                    error = %restore,
                    "Failed to remove unregistered user"
                );
            }
            return Err(e);
        }

        info!(code = %user.postal_code, "Registered new user");
        Ok(user)
    }

    /// The identity registered in `session`, if any.
    pub async fn current_user(&self, session: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        self.session_user(&users, session).await
    }

    /// Upsert a user into the collection by postal code and persist it.
    ///
    /// The in-memory collection is left untouched if the write fails.
    pub async fn save(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        let previous = users.clone();
        upsert_user(&mut users, user);

        if let Err(e) = save_json(self.kv.as_ref(), USERS_KEY, &*users).await {
            warn!(code = %user.postal_code, error = %e, "Failed to persist user");
            *users = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Exclusive access to the collection, for writes that span stores.
    pub(crate) async fn write_users(&self) -> RwLockWriteGuard<'_, Vec<User>> {
        self.users.write().await
    }

    /// Look up a registered user by postal code.
    pub async fn find(&self, code: &PostalCode) -> Option<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| &u.postal_code == code)
            .cloned()
    }

    /// Number of registered users.
    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Resolve a session record against the collection.
    ///
    /// The session record is a snapshot taken at registration; the
    /// collection holds the current cooldown timestamps.
    async fn session_user(&self, users: &[User], session: &str) -> Result<Option<User>> {
        let snapshot: Option<User> = load_json(self.kv.as_ref(), &session_key(session)).await?;
        Ok(snapshot.map(|snap| {
            users
                .iter()
                .find(|u| u.postal_code == snap.postal_code)
                .cloned()
                .unwrap_or(snap)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::MemoryKvStore;
    use crate::letter::LetterKind;
    use chrono::Duration;

    async fn setup() -> (Arc<MemoryKvStore>, Arc<ManualClock>, IdentityStore) {
        let kv = Arc::new(MemoryKvStore::new());
        let clock = Arc::new(ManualClock::starting_now());
        let store = IdentityStore::load(kv.clone(), clock.clone()).await.unwrap();
        (kv, clock, store)
    }

    #[test]
    fn test_session_key() {
        assert_eq!(session_key(""), "postbox_user");
        assert_eq!(session_key("abc"), "postbox_user:abc");
    }

    #[tokio::test]
    async fn test_register_is_idempotent_per_session() {
        let (_kv, _clock, store) = setup().await;

        let first = store.register("s1", "Alice").await.unwrap();
        let second = store.register("s1", "Alice").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_register_ignores_new_name_for_existing_session() {
        let (_kv, _clock, store) = setup().await;

        let first = store.register("s1", "Alice").await.unwrap();
        let again = store.register("s1", "Mallory").await.unwrap();

        assert_eq!(again.username, "Alice");
        assert_eq!(again.postal_code, first.postal_code);
    }

    #[tokio::test]
    async fn test_register_new_user_fields() {
        let (_kv, clock, store) = setup().await;

        let user = store.register("s1", "  Alice  ").await.unwrap();

        assert_eq!(user.username, "Alice");
        assert!(user.postal_code.is_assignable());
        assert_eq!(user.joined_at, clock.now());
        assert!(user.last_public_post.is_none());
        assert!(user.last_private_post.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_blank_name() {
        let (_kv, _clock, store) = setup().await;
        let result = store.register("s1", "   ").await;
        assert!(matches!(result, Err(PostboxError::Validation(_))));
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_get_distinct_users() {
        let (_kv, _clock, store) = setup().await;

        let a = store.register("s1", "Alice").await.unwrap();
        let b = store.register("s2", "Bob").await.unwrap();

        assert_ne!(a.postal_code, b.postal_code);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_current_user_absent_before_register() {
        let (_kv, _clock, store) = setup().await;
        assert!(store.current_user("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_user_sees_saved_cooldown() {
        let (_kv, clock, store) = setup().await;
        let mut user = store.register("s1", "Alice").await.unwrap();

        clock.advance(Duration::minutes(5));
        user.record_post(LetterKind::Public, clock.now());
        store.save(&user).await.unwrap();

        let current = store.current_user("s1").await.unwrap().unwrap();
        assert_eq!(current.last_public_post, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let (kv, clock, store) = setup().await;
        let user = store.register("s1", "Alice").await.unwrap();
        drop(store);

        let reloaded = IdentityStore::load(kv, clock).await.unwrap();
        assert_eq!(reloaded.count().await, 1);
        assert_eq!(reloaded.current_user("s1").await.unwrap(), Some(user.clone()));
        assert_eq!(reloaded.find(&user.postal_code).await, Some(user));
    }

    #[tokio::test]
    async fn test_save_inserts_unknown_user() {
        let (_kv, clock, store) = setup().await;
        let user = User::new("Carol", PostalCode::parse("135792").unwrap(), clock.now());

        store.save(&user).await.unwrap();
        assert_eq!(store.find(&user.postal_code).await, Some(user));
    }

    #[tokio::test]
    async fn test_save_rolls_back_on_write_failure() {
        let (kv, clock, store) = setup().await;
        let user = store.register("s1", "Alice").await.unwrap();

        let mut changed = user.clone();
        changed.record_post(LetterKind::Private, clock.now());
        kv.set_fail_writes(true);

        assert!(store.save(&changed).await.is_err());
        assert_eq!(store.find(&user.postal_code).await, Some(user));
    }

    #[tokio::test]
    async fn test_register_undone_when_session_write_fails() {
        let (kv, _clock, store) = setup().await;
        kv.set_fail_prefix(Some("postbox_user:"));

        assert!(store.register("s1", "Alice").await.is_err());
        assert!(store.register("s1", "Alice").await.is_err());
        assert_eq!(store.count().await, 0);

        let stored: Option<Vec<User>> = load_json(kv.as_ref(), USERS_KEY).await.unwrap();
        assert_eq!(stored, Some(vec![]));

        kv.set_fail_prefix(None);
        let user = store.register("s1", "Alice").await.unwrap();
        assert_eq!(store.count().await, 1);
        assert_eq!(store.current_user("s1").await.unwrap(), Some(user));
    }

    #[test]
    fn test_unique_code_retries_on_collision() {
        let taken = User::new(
            "Alice",
            PostalCode::parse("123456").unwrap(),
            chrono::Utc::now(),
        );
        let mut script = vec!["123456", "123456", "654321"].into_iter();

        let code = unique_code(&[taken], || {
            PostalCode::parse(script.next().unwrap()).unwrap()
        })
        .unwrap();

        assert_eq!(code.as_str(), "654321");
    }

    #[test]
    fn test_unique_code_gives_up() {
        let taken = User::new(
            "Alice",
            PostalCode::parse("123456").unwrap(),
            chrono::Utc::now(),
        );
        let result = unique_code(&[taken], || PostalCode::parse("123456").unwrap());
        assert!(matches!(result, Err(PostboxError::Conflict(_))));
    }
}
