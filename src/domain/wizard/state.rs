//! Wizard state and per-action status.

use serde::{Deserialize, Serialize};

use super::{FormFields, TransientNotice, WizardStep};
use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle of one remote action trigger.
///
/// `Pending` disables re-entry: a trigger observed while pending is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl ActionStatus {
    /// Returns true while a call is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, ActionStatus::Pending)
    }

    /// Returns true if the trigger control is actionable.
    pub fn is_actionable(&self) -> bool {
        !self.is_pending()
    }
}

impl StateMachine for ActionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ActionStatus::*;
        matches!(
            (self, target),
            (Idle, Pending)
                | (Succeeded, Pending)
                | (Failed, Pending)
                | (Pending, Succeeded)
                | (Pending, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ActionStatus::*;
        match self {
            Idle | Succeeded | Failed => vec![Pending],
            Pending => vec![Succeeded, Failed],
        }
    }
}

/// Everything a view needs to render one wizard instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState<S: WizardStep> {
    /// The step currently shown.
    pub current_step: S,

    /// Raw form input accumulated across steps.
    pub fields: FormFields,

    /// Inline error region, in the order errors were produced.
    pub validation_errors: Vec<String>,

    /// Status of the current step's remote action.
    pub action: ActionStatus,

    /// Auto-dismissing notice, if one is showing.
    pub notice: Option<TransientNotice>,
}

impl<S: WizardStep> WizardState<S> {
    /// Fresh state at the entry step.
    pub fn new() -> Self {
        Self::at(S::first(), FormFields::new())
    }

    /// State positioned at `step` with pre-supplied fields.
    pub fn at(step: S, fields: FormFields) -> Self {
        Self {
            current_step: step,
            fields,
            validation_errors: Vec::new(),
            action: ActionStatus::Idle,
            notice: None,
        }
    }

    /// Returns true once the terminal step has been reached.
    pub fn is_complete(&self) -> bool {
        self.current_step.is_final()
    }

    /// Moves to `step` along a declared edge; the state is unchanged on error.
    pub fn move_to(&mut self, step: S) -> Result<(), ValidationError> {
        self.current_step = self.current_step.transition_to(step)?;
        Ok(())
    }

    /// Moves the action status along a declared edge.
    ///
    /// `Pending` to `Pending` is not an edge, which is what makes a second
    /// trigger during an in-flight call fail here.
    pub fn set_action(&mut self, status: ActionStatus) -> Result<(), ValidationError> {
        self.action = self.action.transition_to(status)?;
        Ok(())
    }

    /// Advances the notice timer, dismissing it when expired.
    pub fn tick_notice(&mut self) {
        if let Some(notice) = self.notice.as_mut() {
            if notice.tick() {
                self.notice = None;
            }
        }
    }
}

impl<S: WizardStep> Default for WizardState<S> {
    fn default() -> Self {
        Self::new()
    }
}
