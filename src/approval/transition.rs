use crate::model::status::{ApprovalLevel, RequestStatus};
use crate::model::workflow::Decision;
use derive_more::Display;
use std::fmt;

/// Something a user asks to do with a request.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Action {
    Submit,
    Approve(ApprovalLevel),
    FollowUp,
    Reject,
    Cancel,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Submit => f.write_str("submit"),
            Action::Approve(level) => write!(f, "approve at level {}", level.number()),
            Action::FollowUp => f.write_str("request a follow-up on"),
            Action::Reject => f.write_str("reject"),
            Action::Cancel => f.write_str("cancel"),
        }
    }
}

impl Action {
    /// What gets written to the workflow history.
    pub fn decision(self) -> Decision {
        match self {
            Action::Submit => Decision::Assigned,
            Action::Approve(_) => Decision::Approved,
            Action::FollowUp => Decision::FollowUp,
            Action::Reject => Decision::Rejected,
            Action::Cancel => Decision::Cancelled,
        }
    }

    /// Owner actions are performed on one's own request; the others need
    /// validation authority.
    pub fn is_owner_action(self) -> bool {
        matches!(self, Action::Submit | Action::Cancel)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Display)]
#[display(fmt = "cannot {} a request that is {}", action, from)]
pub struct InvalidTransition {
    pub from: RequestStatus,
    pub action: Action,
}

/// The status a request moves to when `action` is applied, or an error if
/// the action is not allowed from `from`.
pub fn next_status(from: RequestStatus, action: Action) -> Result<RequestStatus, InvalidTransition> {
    use ApprovalLevel::*;
    use RequestStatus::*;

    let to = match (from, action) {
        (Pending, Action::Submit) => Submitted,

        (Submitted, Action::Approve(First)) => PendingHrValidation,
        (Submitted, Action::FollowUp) => PendingFollowUp,
        (PendingFollowUp, Action::Approve(First)) => ValidatedAfterFollowUp,
        (PendingHrValidation | ValidatedAfterFollowUp, Action::Approve(Second)) => Approved,

        (Submitted | PendingFollowUp, Action::Reject) => Rejected,
        (PendingHrValidation | ValidatedAfterFollowUp, Action::Reject) => Rejected,

        (Pending | Submitted, Action::Cancel) => Cancelled,

        _ => return Err(InvalidTransition { from, action }),
    };

    debug_assert!(to.rank() > from.rank());
    Ok(to)
}

/// Level whose authority `action` needs on a request in `from`, if any.
pub fn required_level(from: RequestStatus, action: Action) -> Option<ApprovalLevel> {
    match action {
        Action::Approve(level) => Some(level),
        Action::FollowUp | Action::Reject => from.awaiting_level(),
        Action::Submit | Action::Cancel => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    const ACTIONS: [Action; 6] = [
        Action::Submit,
        Action::Approve(ApprovalLevel::First),
        Action::Approve(ApprovalLevel::Second),
        Action::FollowUp,
        Action::Reject,
        Action::Cancel,
    ];

    #[test]
    fn nominal_path_reaches_approved() {
        let mut status = RequestStatus::Pending;
        for action in [
            Action::Submit,
            Action::Approve(ApprovalLevel::First),
            Action::Approve(ApprovalLevel::Second),
        ] {
            status = next_status(status, action).unwrap();
        }
        assert_eq!(status, RequestStatus::Approved);
    }

    #[test]
    fn follow_up_path_reaches_approved() {
        let mut status = RequestStatus::Submitted;
        status = next_status(status, Action::FollowUp).unwrap();
        assert_eq!(status, RequestStatus::PendingFollowUp);
        status = next_status(status, Action::Approve(ApprovalLevel::First)).unwrap();
        assert_eq!(status, RequestStatus::ValidatedAfterFollowUp);
        status = next_status(status, Action::Approve(ApprovalLevel::Second)).unwrap();
        assert_eq!(status, RequestStatus::Approved);
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for status in RequestStatus::iter().filter(|s| s.is_terminal()) {
            for action in ACTIONS {
                assert!(next_status(status, action).is_err(), "{status} / {action}");
            }
        }
    }

    #[test]
    fn every_transition_moves_forward() {
        for status in RequestStatus::iter() {
            for action in ACTIONS {
                if let Ok(to) = next_status(status, action) {
                    assert!(to.rank() > status.rank(), "{status} -> {to}");
                }
            }
        }
    }

    #[test]
    fn wrong_level_is_refused() {
        assert!(next_status(RequestStatus::Submitted, Action::Approve(ApprovalLevel::Second)).is_err());
        assert!(
            next_status(RequestStatus::PendingHrValidation, Action::Approve(ApprovalLevel::First))
                .is_err()
        );
    }

    #[test]
    fn cancel_only_before_validation() {
        assert_eq!(
            next_status(RequestStatus::Submitted, Action::Cancel),
            Ok(RequestStatus::Cancelled)
        );
        assert!(next_status(RequestStatus::PendingHrValidation, Action::Cancel).is_err());
    }

    #[test]
    fn reject_needs_the_current_stage_level() {
        assert_eq!(
            required_level(RequestStatus::PendingFollowUp, Action::Reject),
            Some(ApprovalLevel::First)
        );
        assert_eq!(
            required_level(RequestStatus::ValidatedAfterFollowUp, Action::Reject),
            Some(ApprovalLevel::Second)
        );
        assert_eq!(required_level(RequestStatus::Pending, Action::Cancel), None);
    }

    #[test]
    fn error_message_names_action_and_status() {
        let err = next_status(RequestStatus::Approved, Action::Reject).unwrap_err();
        assert_eq!(err.to_string(), "cannot reject a request that is approved");
    }
}
