//! Signup wizard: email, one-time code, password.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    check_code, check_email, check_new_password, clear_password, EMAIL_FIELD, PASSWORD_FIELD,
    REJECTED_CODE,
};
use crate::application::otp_prompt::CODE_FIELD;
use crate::application::session_store::SessionStore;
use crate::application::wizard::{FlowError, StepEffect, StepFlow, SubmitOutcome, Wizard};
use crate::domain::foundation::{StateMachine, ValidationError};
use crate::domain::wizard::{is_reachable_step, reachable_steps, FormFields, TransientNotice, WizardStep};

pub const DISPLAY_NAME_FIELD: &str = "display_name";
pub const HOST_FIELD: &str = "wants_host_role";
pub const REDIRECT_FIELD: &str = "redirect_to";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignupStep {
    EmailEntry,
    OneTimeCodeEntry,
    PasswordEntry,
    Done,
}

impl StateMachine for SignupStep {
    fn can_transition_to(&self, target: &Self) -> bool {
        is_reachable_step(self, target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        reachable_steps(self)
    }
}

impl WizardStep for SignupStep {
    const ORDER: &'static [Self] = &[
        SignupStep::EmailEntry,
        SignupStep::OneTimeCodeEntry,
        SignupStep::PasswordEntry,
        SignupStep::Done,
    ];

    fn name(&self) -> &'static str {
        match self {
            SignupStep::EmailEntry => "email_entry",
            SignupStep::OneTimeCodeEntry => "one_time_code_entry",
            SignupStep::PasswordEntry => "password_entry",
            SignupStep::Done => "done",
        }
    }
}

/// Account creation with email confirmation.
///
/// The account is created on the first step with a throwaway password; the
/// real one is set after the address is confirmed. When the service does not
/// require confirmation the code step is skipped.
pub struct SignupFlow {
    store: Arc<SessionStore>,
}

impl SignupFlow {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StepFlow for SignupFlow {
    type Step = SignupStep;
    const NAME: &'static str = "signup";

    fn validate(&self, step: SignupStep, fields: &FormFields) -> Vec<String> {
        match step {
            SignupStep::EmailEntry => {
                let mut errors = Vec::new();
                if fields.is_blank(DISPLAY_NAME_FIELD) {
                    errors.push(ValidationError::empty_field("full_name").user_message());
                }
                errors.extend(check_email(fields));
                errors
            }
            SignupStep::OneTimeCodeEntry => {
                check_code(fields, self.store.otp_config().code_length)
            }
            SignupStep::PasswordEntry => check_new_password(fields),
            SignupStep::Done => Vec::new(),
        }
    }

    fn has_action(&self, step: SignupStep) -> bool {
        step != SignupStep::Done
    }

    async fn run_action(
        &self,
        step: SignupStep,
        fields: FormFields,
    ) -> Result<StepEffect<SignupStep>, FlowError> {
        match step {
            SignupStep::EmailEntry => {
                let provisional = Uuid::new_v4().to_string();
                let outcome = self
                    .store
                    .sign_up(
                        fields.get(EMAIL_FIELD),
                        &provisional,
                        fields.trimmed(DISPLAY_NAME_FIELD),
                        fields.flag(HOST_FIELD),
                    )
                    .await?;
                if outcome.needs_verification {
                    Ok(StepEffect::advance().with_notice(TransientNotice::success(format!(
                        "We sent a code to {}",
                        fields.trimmed(EMAIL_FIELD)
                    ))))
                } else {
                    Ok(StepEffect::advance().jump_to(SignupStep::PasswordEntry))
                }
            }
            SignupStep::OneTimeCodeEntry => {
                if self.store.verify_one_time_code(fields.get(CODE_FIELD)).await? {
                    Ok(StepEffect::advance().with_notice(TransientNotice::success("Email verified")))
                } else {
                    Err(FlowError::rejected(REJECTED_CODE))
                }
            }
            SignupStep::PasswordEntry => {
                self.store.update_password(fields.get(PASSWORD_FIELD)).await?;
                Ok(StepEffect::advance())
            }
            SignupStep::Done => Ok(StepEffect::advance()),
        }
    }

    fn on_failure(&self, step: SignupStep, fields: &mut FormFields) {
        if step == SignupStep::OneTimeCodeEntry {
            fields.clear(CODE_FIELD);
        }
    }

    fn on_complete(&self, fields: &mut FormFields) {
        clear_password(fields);
        let target = self.store.take_redirect().unwrap_or_else(|| "/".to_string());
        fields.set(REDIRECT_FIELD, target);
    }
}

impl Wizard<SignupFlow> {
    /// Continues without confirming the address, finishing the flow.
    ///
    /// Only offered on the code step.
    pub async fn skip_verification(&self) -> Result<SubmitOutcome<SignupStep>, FlowError> {
        if !self.is_mounted() || self.current_step() != SignupStep::OneTimeCodeEntry {
            return Ok(SubmitOutcome::Ignored);
        }
        self.flow().store.skip_verification().await?;
        Ok(self.finish())
    }
}
