//! Application layer - session store, wizard driver, flows, and record services.
//!
//! Everything here is async and reaches the outside world only through the
//! ports. Views hold these objects and render their state.

pub mod flows;
pub mod otp_prompt;
pub mod records;
pub mod session_store;
pub mod wizard;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use flows::{
    BookingFlow, BookingStep, PasswordResetFlow, PasswordResetStep, SignupFlow, SignupStep,
    TourCreationFlow, TourCreationStep,
};
pub use otp_prompt::{submit_code, OtpPrompt, CODE_FIELD};
pub use records::{BookingLedger, TourCatalog};
pub use session_store::{
    SessionPhase, SessionSnapshot, SessionStore, SignUpOutcome, SignedIn, MIN_PASSWORD_LENGTH,
};
pub use wizard::{FlowError, StepEffect, StepFlow, SubmitOutcome, Wizard};

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
