//! Per-channel send cooldown.

use chrono::{DateTime, Duration, Utc};

/// Milliseconds in an hour.
const HOUR_MS: i64 = 60 * 60 * 1000;

/// Result of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    /// The channel may be used.
    Ready,
    /// The channel is still cooling down.
    Active {
        /// Time until the channel is ready again. Always positive.
        remaining: Duration,
    },
}

impl CooldownStatus {
    /// Check if a send is allowed.
    pub fn is_ready(&self) -> bool {
        matches!(self, CooldownStatus::Ready)
    }

    /// Remaining whole hours, rounded up. Zero when ready.
    pub fn remaining_hours(&self) -> u32 {
        match self {
            CooldownStatus::Ready => 0,
            CooldownStatus::Active { remaining } => {
                let ms = remaining.num_milliseconds().max(1);
                ((ms + HOUR_MS - 1) / HOUR_MS) as u32
            }
        }
    }
}

/// One send per channel per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    window: Duration,
}

impl CooldownPolicy {
    /// Create a policy with the given window length in hours.
    pub fn hours(hours: u32) -> Self {
        Self {
            window: Duration::hours(i64::from(hours)),
        }
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check a channel whose last successful send was at `last`.
    pub fn check(&self, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> CooldownStatus {
        let Some(last) = last else {
            return CooldownStatus::Ready;
        };

        let elapsed = now - last;
        if elapsed < self.window {
            CooldownStatus::Active {
                remaining: self.window - elapsed,
            }
        } else {
            CooldownStatus::Ready
        }
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::hours(24)
    }
}
