//! One-time code sub-protocol.
//!
//! Shared by signup, password reset, and sign-in recovery:
//!
//! - `CodeInput` - six single-digit slots or one pasted string, normalized
//!   to a single candidate; reports auto-submission exactly once per
//!   completion
//! - `ResendCountdown` - resend gate driven by one-second ticks
//! - `AttemptGuard` - cap on incorrect submissions per issued code

mod attempts;
mod code_input;
mod countdown;

pub use attempts::AttemptGuard;
pub use code_input::{CodeEntry, CodeInput};
pub use countdown::ResendCountdown;

/// Digits in every issued code.
pub const CODE_LENGTH: usize = 6;

/// Ticks before a resend is allowed.
pub const RESEND_COOLDOWN_TICKS: u32 = 60;
