//! One-time code prompt shared by signup, recovery, and password reset.
//!
//! Owns the code input slots, the resend countdown, and the one-second
//! ticker driving it. The ticker is aborted on `dismount` or drop so it never
//! acts on a prompt that is no longer shown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, warn};

use super::session_store::SessionStore;
use super::wizard::{StepFlow, SubmitOutcome, Wizard};
use super::lock;
use crate::domain::foundation::AuthError;
use crate::domain::otp::{CodeEntry, CodeInput, ResendCountdown};
use crate::domain::wizard::ActionStatus;
use crate::ports::OtpPurpose;

/// Wizard field the candidate code is written to before submission.
pub const CODE_FIELD: &str = "code";

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct PromptState {
    input: CodeInput,
    countdown: ResendCountdown,
    resend: ActionStatus,
}

/// Code entry and resend controls for the pending address.
pub struct OtpPrompt {
    store: Arc<SessionStore>,
    purpose: OtpPurpose,
    state: Arc<Mutex<PromptState>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl OtpPrompt {
    /// Shows the prompt right after a code was sent and starts the countdown.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn mount(store: Arc<SessionStore>, purpose: OtpPurpose) -> Self {
        let otp = store.otp_config();
        let state = Arc::new(Mutex::new(PromptState {
            input: CodeInput::new(otp.code_length),
            countdown: ResendCountdown::started(otp.resend_cooldown_secs),
            resend: ActionStatus::Idle,
        }));

        let ticking = Arc::clone(&state);
        let ticker = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            loop {
                ticks.tick().await;
                lock(&ticking).countdown.tick();
            }
        });

        Self {
            store,
            purpose,
            state,
            ticker: Mutex::new(Some(ticker)),
        }
    }

    pub fn purpose(&self) -> OtpPurpose {
        self.purpose
    }

    /// Types `ch` into slot `position`.
    pub fn enter(&self, position: usize, ch: char) -> CodeEntry {
        lock(&self.state).input.enter(position, ch)
    }

    pub fn erase(&self, position: usize) -> CodeEntry {
        lock(&self.state).input.erase(position)
    }

    pub fn paste(&self, text: &str) -> CodeEntry {
        lock(&self.state).input.paste(text)
    }

    pub fn candidate(&self) -> Option<String> {
        lock(&self.state).input.candidate()
    }

    pub fn can_submit(&self) -> bool {
        lock(&self.state).input.can_submit()
    }

    /// Slot that should hold input focus.
    pub fn focus(&self) -> usize {
        lock(&self.state).input.focus()
    }

    pub fn seconds_until_resend(&self) -> u32 {
        lock(&self.state).countdown.remaining()
    }

    /// Returns true when the resend control is actionable.
    pub fn can_resend(&self) -> bool {
        let state = lock(&self.state);
        state.countdown.is_ready() && state.resend.is_actionable()
    }

    /// Requests a fresh code.
    ///
    /// Returns `Ok(false)` without calling out while the countdown runs or a
    /// resend is already in flight. On success the countdown restarts and the
    /// candidate is cleared.
    pub async fn resend(&self) -> Result<bool, AuthError> {
        {
            let mut state = lock(&self.state);
            if !state.countdown.is_ready() || state.resend.is_pending() {
                debug!(remaining = state.countdown.remaining(), "resend not yet available");
                return Ok(false);
            }
            state.resend = ActionStatus::Pending;
        }

        let result = self.store.resend_code(self.purpose).await;

        let mut state = lock(&self.state);
        match result {
            Ok(()) => {
                state.resend = ActionStatus::Succeeded;
                state.countdown.restart();
                state.input.clear();
                Ok(true)
            }
            Err(err) => {
                warn!(purpose = self.purpose.as_str(), error = %err, "resend failed");
                state.resend = ActionStatus::Failed;
                Err(err)
            }
        }
    }

    /// Clears the candidate after a rejected code and returns focus to slot 0.
    pub fn reject_code(&self) {
        lock(&self.state).input.clear();
    }

    /// Stops the countdown ticker.
    pub fn dismount(&self) {
        if let Some(ticker) = lock(&self.ticker).take() {
            ticker.abort();
        }
    }

    /// Returns true while the countdown ticker is running.
    pub fn is_ticking(&self) -> bool {
        lock(&self.ticker)
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }
}

impl Drop for OtpPrompt {
    fn drop(&mut self) {
        self.dismount();
    }
}

impl std::fmt::Debug for OtpPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpPrompt")
            .field("purpose", &self.purpose)
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

/// Submits `code` through the wizard's code step.
///
/// A rejected or blocked code clears the prompt so the user starts again at
/// the first slot.
pub async fn submit_code<F: StepFlow>(
    wizard: &Wizard<F>,
    prompt: &OtpPrompt,
    code: &str,
) -> SubmitOutcome<F::Step> {
    wizard.set_field(CODE_FIELD, code);
    let outcome = wizard.submit().await;
    if matches!(outcome, SubmitOutcome::Failed(_) | SubmitOutcome::Blocked(_)) {
        prompt.reject_code();
    }
    outcome
}
