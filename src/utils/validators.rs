use crate::error::ApiError;
use chrono::{NaiveDate, NaiveTime};

/// Longest overtime slot accepted for a single request.
pub const MAX_OVERTIME_MINUTES: i64 = 12 * 60;

pub fn validate_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), ApiError> {
    if end <= start {
        return Err(ApiError::bad_request("End time must be after start time"));
    }
    Ok(())
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if end < start {
        return Err(ApiError::bad_request("End date must not be before start date"));
    }
    Ok(())
}

pub fn validate_request_date(date: NaiveDate, today: NaiveDate) -> Result<(), ApiError> {
    if date < today {
        return Err(ApiError::bad_request("Request date cannot be in the past"));
    }
    Ok(())
}

pub fn validate_working_hours(start: NaiveTime, end: NaiveTime) -> Result<(), ApiError> {
    validate_time_range(start, end)?;

    if (end - start).num_minutes() > MAX_OVERTIME_MINUTES {
        return Err(ApiError::bad_request("Overtime cannot exceed 12 hours"));
    }
    Ok(())
}

/// Previous schedule is optional but must come as a complete, valid pair.
pub fn validate_previous_schedule(
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<(), ApiError> {
    match (start, end) {
        (None, None) => Ok(()),
        (Some(s), Some(e)) => validate_time_range(s, e),
        _ => Err(ApiError::bad_request(
            "previous_start and previous_end must be given together",
        )),
    }
}

pub fn validate_employee_number(number: &str) -> Result<(), ApiError> {
    let len = number.trim().chars().count();
    if len < 3 {
        return Err(ApiError::bad_request("Employee number must have at least 3 characters"));
    }
    if len > 20 {
        return Err(ApiError::bad_request("Employee number must have at most 20 characters"));
    }
    Ok(())
}

pub fn validate_service_code(code: &str) -> Result<(), ApiError> {
    if code.len() < 2 || code.len() > 10 {
        return Err(ApiError::bad_request("Service code must have 2 to 10 characters"));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::bad_request("Service code may only contain letters and digits"));
    }
    Ok(())
}

pub fn validate_required(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(ApiError::bad_request(format!("{field} must not be empty")));
    }
    if len > max {
        return Err(ApiError::bad_request(format!("{field} must have at most {max} characters")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn time_range_must_be_increasing() {
        assert!(validate_time_range(t(17, 0), t(19, 0)).is_ok());
        assert!(validate_time_range(t(17, 0), t(17, 0)).is_err());
        assert!(validate_time_range(t(19, 0), t(17, 0)).is_err());
    }

    #[test]
    fn working_hours_are_capped_at_twelve() {
        assert!(validate_working_hours(t(6, 0), t(18, 0)).is_ok());
        assert!(validate_working_hours(t(6, 0), t(18, 1)).is_err());
    }

    #[test]
    fn past_dates_are_refused() {
        let today = d(2026, 5, 10);
        assert!(validate_request_date(today, today).is_ok());
        assert!(validate_request_date(d(2026, 5, 9), today).is_err());
    }

    #[test]
    fn date_range_allows_single_day() {
        assert!(validate_date_range(d(2026, 1, 1), d(2026, 1, 1)).is_ok());
        assert!(validate_date_range(d(2026, 1, 2), d(2026, 1, 1)).is_err());
    }

    #[test]
    fn previous_schedule_needs_both_ends() {
        assert!(validate_previous_schedule(None, None).is_ok());
        assert!(validate_previous_schedule(Some(t(9, 0)), Some(t(17, 0))).is_ok());
        assert!(validate_previous_schedule(Some(t(9, 0)), None).is_err());
    }

    #[test]
    fn identifiers_formats() {
        assert!(validate_employee_number("EMP001").is_ok());
        assert!(validate_employee_number("E1").is_err());
        assert!(validate_service_code("IT001").is_ok());
        assert!(validate_service_code("I").is_err());
        assert!(validate_service_code("IT-01").is_err());
        assert!(validate_service_code("ABCDEFGHIJK").is_err());
    }

    #[test]
    fn required_text() {
        assert!(validate_required("last_name", "Martin", 50).is_ok());
        assert!(validate_required("last_name", "   ", 50).is_err());
        assert!(validate_required("last_name", "abc", 2).is_err());
    }
}
