//! Ordered step contract shared by every wizard.

use std::fmt::Debug;
use std::hash::Hash;

use crate::domain::foundation::StateMachine;

/// A named step in an ordered wizard.
///
/// `ORDER` is the canonical sequence; the first entry is the only valid
/// entry point and the last entry is terminal. The wizard driver moves
/// `current_step` only through `StateMachine::transition_to`, so the edges
/// declared here are the ones it honours. Implementors delegate to
/// [`reachable_steps`] and [`is_reachable_step`].
pub trait WizardStep: StateMachine + Eq + Hash + Debug + Send + Sync + 'static {
    /// Steps in the order a user walks them.
    const ORDER: &'static [Self];

    /// Stable name used in logs and view routing.
    fn name(&self) -> &'static str;

    /// Returns the 0-based position of this step in `ORDER`.
    fn order_index(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|step| step == self)
            .unwrap_or_default()
    }

    /// The entry step.
    fn first() -> Self {
        Self::ORDER[0]
    }

    /// The step after this one, or `None` at the terminal step.
    fn next(&self) -> Option<Self> {
        Self::ORDER.get(self.order_index() + 1).copied()
    }

    /// The step before this one, or `None` at the entry step.
    fn previous(&self) -> Option<Self> {
        self.order_index()
            .checked_sub(1)
            .and_then(|idx| Self::ORDER.get(idx).copied())
    }

    /// Returns true for the terminal step.
    fn is_final(&self) -> bool {
        self.next().is_none()
    }

    /// Returns true if `self` comes strictly after `other`.
    fn is_after(&self, other: &Self) -> bool {
        self.order_index() > other.order_index()
    }
}

/// Valid targets from `step`: any later step (an action may skip ahead),
/// plus the previous one. The terminal step has none.
pub fn reachable_steps<S: WizardStep>(step: &S) -> Vec<S> {
    if step.is_final() {
        return Vec::new();
    }
    S::ORDER[step.order_index() + 1..]
        .iter()
        .copied()
        .chain(step.previous())
        .collect()
}

pub fn is_reachable_step<S: WizardStep>(step: &S, target: &S) -> bool {
    reachable_steps(step).contains(target)
}
