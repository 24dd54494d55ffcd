use super::status::RequestStatus;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 12,
        "employee_id": 3,
        "request_date": "2026-02-10",
        "previous_start": "09:00:00",
        "previous_end": "17:00:00",
        "start_at": "17:00:00",
        "end_at": "20:30:00",
        "status": "submitted",
        "comment": "Clôture mensuelle",
        "created_by": 3,
        "validated_n1_at": null,
        "validated_n2_at": null,
        "created_at": "2026-02-09T10:00:00",
        "updated_at": "2026-02-09T10:00:00",
        "total_hours": 3.5
    })
)]
pub struct OvertimeRequest {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub request_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "time")]
    pub previous_start: Option<NaiveTime>,
    #[schema(value_type = Option<String>, format = "time")]
    pub previous_end: Option<NaiveTime>,
    #[schema(value_type = String, format = "time")]
    pub start_at: NaiveTime,
    #[schema(value_type = String, format = "time")]
    pub end_at: NaiveTime,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub comment: Option<String>,
    pub created_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub validated_n1_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub validated_n2_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
    /// Derived from `start_at`/`end_at`, not stored
    #[sqlx(skip)]
    pub total_hours: f64,
}

pub const REQUEST_COLUMNS: &str = "id, employee_id, request_date, previous_start, previous_end, \
    start_at, end_at, status, comment, created_by, validated_n1_at, validated_n2_at, created_at, updated_at";

impl OvertimeRequest {
    /// Fills the derived fields after loading from the database.
    pub fn computed(mut self) -> Self {
        self.total_hours = hours_between(self.start_at, self.end_at);
        self
    }

    /// The employee owning the request, or the one who filed it.
    pub fn is_owned_by(&self, employee_id: u64) -> bool {
        self.employee_id == employee_id || self.created_by == Some(employee_id)
    }
}

/// Hours between two times of the same day, rounded to two decimals.
/// Zero when `end` is not after `start`.
pub fn hours_between(start: NaiveTime, end: NaiveTime) -> f64 {
    let minutes = (end - start).num_minutes();
    if minutes <= 0 {
        return 0.0;
    }
    (minutes as f64 / 60.0 * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) fn sample(
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    start: (u32, u32),
    end: (u32, u32),
    status: RequestStatus,
) -> OvertimeRequest {
    let ts = date.and_hms_opt(8, 0, 0).unwrap();
    OvertimeRequest {
        id,
        employee_id,
        request_date: date,
        previous_start: None,
        previous_end: None,
        start_at: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_at: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        status,
        comment: None,
        created_by: Some(employee_id),
        validated_n1_at: None,
        validated_n2_at: None,
        created_at: ts,
        updated_at: ts,
        total_hours: 0.0,
    }
    .computed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn hours_are_computed_from_times() {
        assert_eq!(hours_between(t(17, 0), t(20, 30)), 3.5);
        assert_eq!(hours_between(t(18, 0), t(18, 20)), 0.33);
        assert_eq!(hours_between(t(20, 0), t(18, 0)), 0.0);
    }

    #[test]
    fn ownership_covers_creator() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut req = sample(1, 7, date, (17, 0), (19, 0), RequestStatus::Pending);
        assert_eq!(req.total_hours, 2.0);
        assert!(req.is_owned_by(7));
        req.created_by = Some(9);
        assert!(req.is_owned_by(9));
        assert!(!req.is_owned_by(3));
    }
}
