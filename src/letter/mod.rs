//! Letter module for Post Box.
//!
//! Letters are either public (an anonymous feed) or private (addressed to a
//! postal code). The store keeps the whole collection most-recent-first and
//! serves sorted views of it.

mod store;
mod types;

pub use store::{seed_letters, LetterStore, LETTERS_KEY};
pub use types::{Letter, LetterKind, MAX_CONTENT_LENGTH};
