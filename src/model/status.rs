use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Lifecycle of an overtime request.
///
/// The declaration order is the progression order: a request only ever moves
/// to a status with a strictly higher [`RequestStatus::rank`].
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum RequestStatus {
    /// Created, not yet submitted
    Pending,
    /// Waiting for the supervisor (level 1)
    Submitted,
    /// Supervisor asked for a follow-up; still level 1
    PendingFollowUp,
    /// Approved at level 1, waiting for HR / coordinator (level 2)
    PendingHrValidation,
    /// Approved at level 1 after a follow-up, waiting for level 2
    ValidatedAfterFollowUp,
    Approved,
    Rejected,
    Cancelled,
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Pending
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl RequestStatus {
    pub fn rank(self) -> u8 {
        match self {
            RequestStatus::Pending => 0,
            RequestStatus::Submitted => 1,
            RequestStatus::PendingFollowUp => 2,
            RequestStatus::PendingHrValidation => 3,
            RequestStatus::ValidatedAfterFollowUp => 4,
            RequestStatus::Approved | RequestStatus::Rejected | RequestStatus::Cancelled => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Approved | RequestStatus::Rejected | RequestStatus::Cancelled
        )
    }

    /// Fields (date, times, comment) may only change before any validation.
    pub fn is_editable(self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Submitted)
    }

    /// The validation level currently expected, if any.
    pub fn awaiting_level(self) -> Option<ApprovalLevel> {
        match self {
            RequestStatus::Submitted | RequestStatus::PendingFollowUp => Some(ApprovalLevel::First),
            RequestStatus::PendingHrValidation | RequestStatus::ValidatedAfterFollowUp => {
                Some(ApprovalLevel::Second)
            }
            _ => None,
        }
    }
}

/// N1 is the supervisor, N2 is HR / coordinator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ApprovalLevel {
    First = 1,
    Second = 2,
}

impl ApprovalLevel {
    pub fn from_number(level: u8) -> Option<Self> {
        match level {
            1 => Some(ApprovalLevel::First),
            2 => Some(ApprovalLevel::Second),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn wire_names_are_camel_case() {
        assert_eq!(RequestStatus::PendingHrValidation.as_ref(), "pendingHrValidation");
        assert_eq!(
            serde_json::to_string(&RequestStatus::ValidatedAfterFollowUp).unwrap(),
            "\"validatedAfterFollowUp\""
        );
        assert_eq!(
            "pendingFollowUp".parse::<RequestStatus>().unwrap(),
            RequestStatus::PendingFollowUp
        );
    }

    #[test]
    fn only_final_statuses_are_terminal() {
        let terminal: Vec<_> = RequestStatus::iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![
                RequestStatus::Approved,
                RequestStatus::Rejected,
                RequestStatus::Cancelled
            ]
        );
    }

    #[test]
    fn awaiting_level_matches_stage() {
        assert_eq!(RequestStatus::Pending.awaiting_level(), None);
        assert_eq!(
            RequestStatus::PendingFollowUp.awaiting_level(),
            Some(ApprovalLevel::First)
        );
        assert_eq!(
            RequestStatus::ValidatedAfterFollowUp.awaiting_level(),
            Some(ApprovalLevel::Second)
        );
        assert_eq!(RequestStatus::Rejected.awaiting_level(), None);
    }

    #[test]
    fn level_numbers() {
        assert_eq!(ApprovalLevel::from_number(2), Some(ApprovalLevel::Second));
        assert_eq!(ApprovalLevel::from_number(3), None);
        assert_eq!(ApprovalLevel::First.number(), 1);
    }
}
