//! Password reset wizard.

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    check_code, check_email, check_new_password, clear_password, EMAIL_FIELD, PASSWORD_FIELD,
    REJECTED_CODE,
};
use crate::application::otp_prompt::CODE_FIELD;
use crate::application::session_store::SessionStore;
use crate::application::wizard::{FlowError, StepEffect, StepFlow};
use crate::domain::foundation::StateMachine;
use crate::domain::wizard::{is_reachable_step, reachable_steps, FormFields, TransientNotice, WizardStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordResetStep {
    EmailEntry,
    OneTimeCodeEntry,
    NewPassword,
    Done,
}

impl StateMachine for PasswordResetStep {
    fn can_transition_to(&self, target: &Self) -> bool {
        is_reachable_step(self, target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        reachable_steps(self)
    }
}

impl WizardStep for PasswordResetStep {
    const ORDER: &'static [Self] = &[
        PasswordResetStep::EmailEntry,
        PasswordResetStep::OneTimeCodeEntry,
        PasswordResetStep::NewPassword,
        PasswordResetStep::Done,
    ];

    fn name(&self) -> &'static str {
        match self {
            PasswordResetStep::EmailEntry => "email_entry",
            PasswordResetStep::OneTimeCodeEntry => "one_time_code_entry",
            PasswordResetStep::NewPassword => "new_password",
            PasswordResetStep::Done => "done",
        }
    }
}

pub struct PasswordResetFlow {
    store: Arc<SessionStore>,
}

impl PasswordResetFlow {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StepFlow for PasswordResetFlow {
    type Step = PasswordResetStep;
    const NAME: &'static str = "password_reset";

    fn validate(&self, step: PasswordResetStep, fields: &FormFields) -> Vec<String> {
        match step {
            PasswordResetStep::EmailEntry => check_email(fields),
            PasswordResetStep::OneTimeCodeEntry => {
                check_code(fields, self.store.otp_config().code_length)
            }
            PasswordResetStep::NewPassword => check_new_password(fields),
            PasswordResetStep::Done => Vec::new(),
        }
    }

    fn has_action(&self, step: PasswordResetStep) -> bool {
        step != PasswordResetStep::Done
    }

    async fn run_action(
        &self,
        step: PasswordResetStep,
        fields: FormFields,
    ) -> Result<StepEffect<PasswordResetStep>, FlowError> {
        match step {
            PasswordResetStep::EmailEntry => {
                self.store.begin_password_reset(fields.get(EMAIL_FIELD)).await?;
                // Same notice whether or not the address has an account.
                Ok(StepEffect::advance().with_notice(TransientNotice::info(format!(
                    "If an account exists for {}, a reset code is on its way",
                    fields.trimmed(EMAIL_FIELD)
                ))))
            }
            PasswordResetStep::OneTimeCodeEntry => {
                if self.store.verify_recovery_code(fields.get(CODE_FIELD)).await? {
                    Ok(StepEffect::advance())
                } else {
                    Err(FlowError::rejected(REJECTED_CODE))
                }
            }
            PasswordResetStep::NewPassword => {
                self.store.update_password(fields.get(PASSWORD_FIELD)).await?;
                Ok(StepEffect::advance()
                    .with_notice(TransientNotice::success("Your password has been updated")))
            }
            PasswordResetStep::Done => Ok(StepEffect::advance()),
        }
    }

    fn on_failure(&self, step: PasswordResetStep, fields: &mut FormFields) {
        if step == PasswordResetStep::OneTimeCodeEntry {
            fields.clear(CODE_FIELD);
        }
    }

    fn on_complete(&self, fields: &mut FormFields) {
        clear_password(fields);
        self.store.clear_pending();
    }
}
