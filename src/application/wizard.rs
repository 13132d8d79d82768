//! Generic step wizard driver.
//!
//! A flow describes its steps, per-step validation, and the optional remote
//! action that gates each forward transition. [`Wizard`] owns the mutable
//! state for one mounted instance of a flow and enforces the transition
//! contract:
//!
//! - forward transitions require an empty validation result;
//! - a step with an action advances only when the action succeeds;
//! - a trigger observed while the action is pending is ignored;
//! - the terminal step is reached once and cannot be left;
//! - results arriving after `dismount` are discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::lock;
use crate::domain::foundation::{AuthError, DomainError, StateMachine};
use crate::domain::wizard::{ActionStatus, FormFields, TransientNotice, WizardState, WizardStep};

/// Failure a step action reports inline.
#[derive(Debug, Clone, Error)]
pub enum FlowError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The action ran but its outcome was negative, such as a wrong code.
    #[error("{0}")]
    Rejected(String),
}

impl FlowError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Text rendered in the wizard's inline error region.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Auth(err) => err.user_message(),
            FlowError::Domain(err) => err.message.clone(),
            FlowError::Rejected(message) => message.clone(),
        }
    }
}

/// What a successful action changes besides advancing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEffect<S> {
    pub fields: FormFields,
    pub jump_to: Option<S>,
    pub notice: Option<TransientNotice>,
}

impl<S> StepEffect<S> {
    /// Plain advance to the next step.
    pub fn advance() -> Self {
        Self {
            fields: FormFields::new(),
            jump_to: None,
            notice: None,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.set(name, value);
        self
    }

    /// Skips ahead to `step`. Ignored unless `step` is later than the current one.
    pub fn jump_to(mut self, step: S) -> Self {
        self.jump_to = Some(step);
        self
    }

    pub fn with_notice(mut self, notice: TransientNotice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Result of a forward trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<S> {
    /// Moved to a non-terminal step.
    Advanced(S),
    /// Reached the terminal step.
    Completed,
    /// Local validation failed; nothing was called.
    Blocked(Vec<String>),
    /// The remote action failed; the step is unchanged.
    Failed(String),
    /// Trigger not actionable: pending, terminal, or dismounted.
    Ignored,
}

impl<S> SubmitOutcome<S> {
    /// Returns true if the wizard moved forward.
    pub fn moved(&self) -> bool {
        matches!(self, SubmitOutcome::Advanced(_) | SubmitOutcome::Completed)
    }
}

/// Configuration of one concrete wizard.
#[async_trait]
pub trait StepFlow: Send + Sync + 'static {
    type Step: WizardStep;

    /// Name used in logs.
    const NAME: &'static str;

    /// Local validation for `step`. An empty result permits the transition.
    fn validate(&self, step: Self::Step, fields: &FormFields) -> Vec<String>;

    /// Returns true if leaving `step` requires a remote action.
    fn has_action(&self, step: Self::Step) -> bool;

    /// Runs the remote action gating `step`.
    async fn run_action(
        &self,
        step: Self::Step,
        fields: FormFields,
    ) -> Result<StepEffect<Self::Step>, FlowError>;

    /// Returns true if the user may go back from `step`.
    fn allows_back(&self, _step: Self::Step) -> bool {
        false
    }

    /// Field cleanup after a failed action, such as clearing a code.
    fn on_failure(&self, _step: Self::Step, _fields: &mut FormFields) {}

    /// One-time effect when the terminal step is reached.
    fn on_complete(&self, _fields: &mut FormFields) {}
}

/// One mounted instance of a flow.
pub struct Wizard<F: StepFlow> {
    flow: F,
    state: Mutex<WizardState<F::Step>>,
    mounted: AtomicBool,
}

impl<F: StepFlow> Wizard<F> {
    /// Mounts `flow` at its entry step.
    pub fn new(flow: F) -> Self {
        Self::with_state(flow, WizardState::new())
    }

    /// Mounts `flow` at a later step with data handed off from upstream.
    pub fn resume_at(flow: F, step: F::Step, fields: FormFields) -> Self {
        debug!(flow = F::NAME, step = step.name(), "wizard resumed");
        Self::with_state(flow, WizardState::at(step, fields))
    }

    fn with_state(flow: F, state: WizardState<F::Step>) -> Self {
        Self {
            flow,
            state: Mutex::new(state),
            mounted: AtomicBool::new(true),
        }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    /// Snapshot for rendering.
    pub fn state(&self) -> WizardState<F::Step> {
        lock(&self.state).clone()
    }

    pub fn current_step(&self) -> F::Step {
        lock(&self.state).current_step
    }

    pub fn action_status(&self) -> ActionStatus {
        lock(&self.state).action
    }

    pub fn errors(&self) -> Vec<String> {
        lock(&self.state).validation_errors.clone()
    }

    pub fn field(&self, name: &str) -> String {
        lock(&self.state).fields.get(name).to_string()
    }

    pub fn set_field(&self, name: &str, value: impl Into<String>) {
        lock(&self.state).fields.set(name, value);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Advances the notice timer by one second.
    pub fn tick(&self) {
        lock(&self.state).tick_notice();
    }

    /// Abandons the flow. In-flight results are discarded when they arrive.
    pub fn dismount(&self) {
        if self.mounted.swap(false, Ordering::SeqCst) {
            debug!(flow = F::NAME, "wizard dismounted");
        }
    }

    /// Triggers the forward transition from the current step.
    pub async fn submit(&self) -> SubmitOutcome<F::Step> {
        let (step, fields) = {
            let mut state = lock(&self.state);
            if !self.is_mounted() || state.is_complete() {
                return SubmitOutcome::Ignored;
            }
            if !state.action.can_transition_to(&ActionStatus::Pending) {
                warn!(flow = F::NAME, step = state.current_step.name(), "trigger ignored; action in flight");
                return SubmitOutcome::Ignored;
            }

            let step = state.current_step;
            let errors = self.flow.validate(step, &state.fields);
            if !errors.is_empty() {
                debug!(flow = F::NAME, step = step.name(), count = errors.len(), "validation blocked transition");
                state.validation_errors = errors.clone();
                return SubmitOutcome::Blocked(errors);
            }

            if !self.flow.has_action(step) {
                state.validation_errors.clear();
                return self.apply_effect(&mut state, StepEffect::advance());
            }

            if let Err(err) = state.set_action(ActionStatus::Pending) {
                warn!(flow = F::NAME, step = step.name(), error = %err, "trigger ignored");
                return SubmitOutcome::Ignored;
            }
            (step, state.fields.clone())
        };

        let result = self.flow.run_action(step, fields).await;

        let mut state = lock(&self.state);
        if !self.is_mounted() {
            debug!(flow = F::NAME, step = step.name(), "discarding result for dismounted wizard");
            return SubmitOutcome::Ignored;
        }

        let settled = if result.is_ok() {
            ActionStatus::Succeeded
        } else {
            ActionStatus::Failed
        };
        if let Err(err) = state.set_action(settled) {
            warn!(flow = F::NAME, step = step.name(), error = %err, "action settled out of order");
        }

        match result {
            Ok(effect) => {
                state.validation_errors.clear();
                self.apply_effect(&mut state, effect)
            }
            Err(err) => {
                let message = err.user_message();
                warn!(flow = F::NAME, step = step.name(), error = %err, "step action failed");
                self.flow.on_failure(step, &mut state.fields);
                state.validation_errors = vec![message.clone()];
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Returns to the previous step where the flow offers it.
    ///
    /// Pure local change: no validation and no remote call. Refused while an
    /// action is pending, and from the terminal step since it has no edges.
    pub fn back(&self) -> bool {
        let mut state = lock(&self.state);
        if !self.is_mounted() || state.action.is_pending() {
            return false;
        }
        let step = state.current_step;
        if !self.flow.allows_back(step) {
            return false;
        }
        let Some(previous) = step.previous() else {
            return false;
        };
        if state.move_to(previous).is_err() {
            return false;
        }
        state.validation_errors.clear();
        debug!(flow = F::NAME, from = step.name(), to = previous.name(), "stepped back");
        true
    }

    /// Moves straight to the terminal step after an out-of-band completion.
    pub(crate) fn finish(&self) -> SubmitOutcome<F::Step> {
        let mut state = lock(&self.state);
        if !self.is_mounted() || state.is_complete() || state.action.is_pending() {
            return SubmitOutcome::Ignored;
        }
        let Some(last) = F::Step::ORDER.last().copied() else {
            return SubmitOutcome::Ignored;
        };
        state.validation_errors.clear();
        self.apply_effect(&mut state, StepEffect::advance().jump_to(last))
    }

    fn apply_effect(
        &self,
        state: &mut WizardState<F::Step>,
        effect: StepEffect<F::Step>,
    ) -> SubmitOutcome<F::Step> {
        let from = state.current_step;
        let target = match effect.jump_to {
            Some(jump) if jump.is_after(&from) => Some(jump),
            _ => from.next(),
        };
        let Some(target) = target else {
            return SubmitOutcome::Ignored;
        };
        if let Err(err) = state.move_to(target) {
            warn!(flow = F::NAME, from = from.name(), to = target.name(), error = %err, "transition refused");
            return SubmitOutcome::Ignored;
        }

        state.fields.merge(effect.fields);
        if effect.notice.is_some() {
            state.notice = effect.notice;
        }
        debug!(flow = F::NAME, from = from.name(), to = target.name(), "step advanced");

        if target.is_final() {
            self.flow.on_complete(&mut state.fields);
            info!(flow = F::NAME, "flow completed");
            return SubmitOutcome::Completed;
        }
        SubmitOutcome::Advanced(target)
    }
}

impl<F: StepFlow> std::fmt::Debug for Wizard<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("flow", &F::NAME)
            .field("step", &self.current_step())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
