use super::authority::Authority;
use crate::model::request::OvertimeRequest;
use crate::model::status::{ApprovalLevel, RequestStatus};

/// Statuses waiting for a decision at `level`.
pub fn statuses_awaiting(level: ApprovalLevel) -> [RequestStatus; 2] {
    match level {
        ApprovalLevel::First => [RequestStatus::Submitted, RequestStatus::PendingFollowUp],
        ApprovalLevel::Second => [
            RequestStatus::PendingHrValidation,
            RequestStatus::ValidatedAfterFollowUp,
        ],
    }
}

/// Every status the authority could act on, in progression order.
pub fn actionable_statuses(authority: &Authority) -> Vec<RequestStatus> {
    [ApprovalLevel::First, ApprovalLevel::Second]
        .into_iter()
        .filter(|level| authority.covers(*level))
        .flat_map(statuses_awaiting)
        .collect()
}

pub fn is_actionable(request: &OvertimeRequest, authority: &Authority) -> bool {
    request
        .status
        .awaiting_level()
        .is_some_and(|level| authority.acting_for(level, request).is_some())
}

/// The subset of `requests` the authority can validate now, keeping input order.
pub fn project<'a>(requests: &'a [OvertimeRequest], authority: &Authority) -> Vec<&'a OvertimeRequest> {
    requests
        .iter()
        .filter(|r| is_actionable(r, authority))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::profile::Profile;
    use crate::model::request::sample;
    use chrono::NaiveDate;

    fn requests() -> Vec<OvertimeRequest> {
        let d = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        vec![
            sample(1, 5, d, (17, 0), (19, 0), RequestStatus::Pending),
            sample(2, 5, d, (17, 0), (19, 0), RequestStatus::Submitted),
            sample(3, 6, d, (17, 0), (19, 0), RequestStatus::PendingFollowUp),
            sample(4, 6, d, (17, 0), (19, 0), RequestStatus::PendingHrValidation),
            sample(5, 7, d, (17, 0), (19, 0), RequestStatus::ValidatedAfterFollowUp),
            sample(6, 7, d, (17, 0), (19, 0), RequestStatus::Approved),
            sample(7, 1, d, (17, 0), (19, 0), RequestStatus::Submitted),
        ]
    }

    fn ids(rs: Vec<&OvertimeRequest>) -> Vec<u64> {
        rs.into_iter().map(|r| r.id).collect()
    }

    #[test]
    fn supervisor_sees_level_one_queue() {
        let reqs = requests();
        let supervisor = Authority::own(1, Profile::Supervisor);
        // request 7 belongs to the supervisor
        assert_eq!(ids(project(&reqs, &supervisor)), vec![2, 3]);
    }

    #[test]
    fn coordinator_sees_hr_queue() {
        let reqs = requests();
        let coordinator = Authority::own(2, Profile::Coordinator);
        assert_eq!(ids(project(&reqs, &coordinator)), vec![4, 5]);
    }

    #[test]
    fn administrator_sees_both_levels() {
        let reqs = requests();
        let admin = Authority::own(3, Profile::Administrator);
        assert_eq!(ids(project(&reqs, &admin)), vec![2, 3, 4, 5, 7]);
        assert_eq!(actionable_statuses(&admin).len(), 4);
    }

    #[test]
    fn validator_sees_nothing_without_delegation() {
        let reqs = requests();
        let validator = Authority::own(5, Profile::Validator);
        assert!(project(&reqs, &validator).is_empty());

        let delegated = validator.with_delegations(vec![(2, Profile::Coordinator)]);
        assert_eq!(ids(project(&reqs, &delegated)), vec![4, 5]);
    }

    #[test]
    fn requests_filed_by_the_caller_are_not_actionable() {
        let reqs = requests();
        let mut filed = reqs.clone();
        // supervisor 1 filed request 2 on behalf of employee 5
        filed[1].created_by = Some(1);

        let supervisor = Authority::own(1, Profile::Supervisor);
        assert_eq!(ids(project(&filed, &supervisor)), vec![3]);

        let other = Authority::own(9, Profile::Supervisor);
        assert_eq!(ids(project(&filed, &other)), vec![2, 3, 7]);
    }
}
