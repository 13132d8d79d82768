//! Transition contract shared by wizard steps, action statuses and
//! record statuses.

use super::ValidationError;

/// An enum whose values move along a fixed set of edges.
///
/// ```ignore
/// impl StateMachine for BookingStatus {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Confirmed, Cancelled))
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Confirmed => vec![Cancelled],
///             Cancelled => vec![],
///         }
///     }
/// }
///
/// booking.status = booking.status.transition_to(BookingStatus::Cancelled)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every state reachable in one move.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns `target` if the edge exists, `InvalidFormat` on `state_transition` otherwise.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot move from {:?} to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    /// No outgoing edges.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Open,
        Shut,
        Locked,
    }

    impl StateMachine for Door {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Door::Open => vec![Door::Shut],
                Door::Shut => vec![Door::Open, Door::Locked],
                Door::Locked => vec![],
            }
        }
    }

    #[test]
    fn rejected_transition_names_both_states() {
        let err = Door::Open.transition_to(Door::Locked).unwrap_err();
        assert_eq!(err.user_message(), "Cannot move from Open to Locked");
        assert_eq!(Door::Shut.transition_to(Door::Locked), Ok(Door::Locked));
        assert!(Door::Locked.is_terminal());
    }
}
