//! Letter delivery for Post Box.
//!
//! [`PostOffice`] runs a single send through validation, moderation, the
//! per-channel cooldown and persistence.

mod cooldown;
mod service;
mod types;

pub use cooldown::{CooldownPolicy, CooldownStatus};
pub use service::PostOffice;
pub use types::{DeliveryOutcome, DeliveryStage, RejectReason, SendLetterRequest};
