//! Postal code type and generation.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of digits in a postal code.
pub const CODE_LENGTH: usize = 6;

/// Digits a generated code may contain.
const CODE_DIGITS: [u8; 9] = [b'1', b'2', b'3', b'4', b'5', b'6', b'7', b'8', b'9'];

/// A user's postal code: the identity and addressing key of a user.
///
/// Parsing only checks the addressing format (six ASCII digits). Codes
/// handed out by [`generate_code`] are additionally zero-free with distinct
/// digits; see [`PostalCode::is_assignable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostalCode(String);

impl PostalCode {
    /// Parse an address. Returns `None` unless `s` is exactly six ASCII digits.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == CODE_LENGTH && s.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    /// Wrap a code known to be well-formed, such as a built-in constant.
    pub(crate) fn new_unchecked(s: &str) -> Self {
        Self(s.to_string())
    }

    /// Whether this code satisfies the generation rules.
    pub fn is_assignable(&self) -> bool {
        let bytes = self.0.as_bytes();
        bytes.len() == CODE_LENGTH
            && bytes.iter().all(|b| CODE_DIGITS.contains(b))
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| !bytes[..i].contains(b))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PostalCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Generate a postal code using the thread-local RNG.
pub fn generate_code() -> PostalCode {
    generate_code_with(&mut rand::rng())
}

/// Generate a postal code by drawing six digits from 1..=9 without replacement.
///
/// Does not check uniqueness against registered users.
pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R) -> PostalCode {
    let mut pool = CODE_DIGITS.to_vec();
    let mut code = String::with_capacity(CODE_LENGTH);

    for _ in 0..CODE_LENGTH {
        let idx = rng.random_range(0..pool.len());
        code.push(pool.swap_remove(idx) as char);
    }

    PostalCode(code)
}
