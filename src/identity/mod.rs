//! Identity module for Post Box.
//!
//! Users are identified by a randomly drawn postal code. Each session holds
//! at most one identity; the global collection holds every user and their
//! per-channel cooldown timestamps.

mod code;
mod store;
mod types;

pub use code::{generate_code, generate_code_with, PostalCode, CODE_LENGTH};
pub use store::{
    session_key, unique_code, IdentityStore, CODE_SPACE, MAX_CODE_ATTEMPTS, SESSION_USER_KEY,
    USERS_KEY,
};
pub use types::User;

pub(crate) use store::upsert_user;
