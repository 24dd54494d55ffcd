use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Decision codes stored in `workflows.status`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    Assigned = 0,
    Approved = 1,
    Rejected = 2,
    FollowUp = 3,
    Cancelled = 4,
}

impl Decision {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Decision::Assigned),
            1 => Some(Decision::Approved),
            2 => Some(Decision::Rejected),
            3 => Some(Decision::FollowUp),
            4 => Some(Decision::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Workflow {
    pub id: u64,
    pub request_id: u64,
    /// Employee whose authority was used
    pub validator: u64,
    /// Employee who acted through a delegation, if any
    pub delegate: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub assign_date: NaiveDateTime,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub validation_date: Option<NaiveDateTime>,
    /// See [`Decision`]
    pub status: u8,
    pub comment: Option<String>,
}

pub const WORKFLOW_COLUMNS: &str =
    "id, request_id, validator, delegate, assign_date, validation_date, status, comment";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_codes_round_trip() {
        for d in [
            Decision::Assigned,
            Decision::Approved,
            Decision::Rejected,
            Decision::FollowUp,
            Decision::Cancelled,
        ] {
            assert_eq!(Decision::from_code(d.code()), Some(d));
        }
        assert_eq!(Decision::from_code(9), None);
    }
}
