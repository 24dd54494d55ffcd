use crate::approval::authority::Authority;
use crate::approval::projection::is_actionable;
use crate::error::ApiError;
use crate::model::employee::Employee;
use crate::model::request::OvertimeRequest;
use crate::model::service::{Service, subtree_ids};
use crate::model::status::RequestStatus;
use crate::utils::validators::validate_date_range;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use strum::IntoEnumIterator;
use utoipa::ToSchema;

pub const DEFAULT_TOP: usize = 10;
pub const MAX_TOP: usize = 100;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Inclusive period plus an optional service (with its sub-services).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub service_id: Option<u64>,
}

impl RequestFilter {
    pub fn new(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        service_id: Option<u64>,
    ) -> Result<Self, ApiError> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            validate_date_range(start, end)?;
        }
        Ok(Self {
            start_date,
            end_date,
            service_id,
        })
    }

    fn in_period(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|s| date >= s) && self.end_date.is_none_or(|e| date <= e)
    }

    /// Services in scope, `None` meaning all of them.
    fn scope(&self, services: &[Service]) -> Option<HashSet<u64>> {
        self.service_id
            .map(|root| subtree_ids(services, root).into_iter().collect())
    }

    /// Requests matching the filter, input order kept.
    pub fn apply<'a>(
        &self,
        requests: &'a [OvertimeRequest],
        employees: &[Employee],
        services: &[Service],
    ) -> Vec<&'a OvertimeRequest> {
        let scope = self.scope(services);
        let service_of: HashMap<u64, u64> = employees.iter().map(|e| (e.id, e.service_id)).collect();

        requests
            .iter()
            .filter(|r| self.in_period(r.request_date))
            .filter(|r| match &scope {
                None => true,
                Some(ids) => service_of
                    .get(&r.employee_id)
                    .is_some_and(|s| ids.contains(s)),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Summary {
    pub total_requests: usize,
    pub approved_requests: usize,
    /// Every request not yet approved, rejected or cancelled
    pub pending_requests: usize,
    pub rejected_requests: usize,
    pub cancelled_requests: usize,
    pub total_hours: f64,
    pub approved_hours: f64,
    /// Percentage of decided requests (approved or rejected) that were approved
    pub approval_rate: f64,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServiceStats {
    /// `None` groups requests whose employee or service is unknown
    pub service_id: Option<u64>,
    pub service_code: String,
    pub service_name: String,
    pub employee_count: usize,
    pub request_count: usize,
    pub total_hours: f64,
    pub approved_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmployeeStats {
    pub employee_id: u64,
    pub employee_number: String,
    pub full_name: String,
    pub service_id: u64,
    pub request_count: usize,
    pub total_hours: f64,
    pub approved_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Report {
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    pub service_id: Option<u64>,
    pub summary: Summary,
    pub by_service: Vec<ServiceStats>,
    pub top_employees: Vec<EmployeeStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: RequestStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dashboard {
    pub my_requests: usize,
    pub my_total_hours: f64,
    pub my_approved_hours: f64,
    /// One entry per status, zero counts included
    pub by_status: Vec<StatusCount>,
    /// Requests waiting for the caller's decision
    pub to_validate: usize,
}

pub fn summarize(requests: &[&OvertimeRequest], hourly_rate: f64) -> Summary {
    let mut s = Summary::default();

    for r in requests {
        s.total_requests += 1;
        s.total_hours += r.total_hours;
        match r.status {
            RequestStatus::Approved => {
                s.approved_requests += 1;
                s.approved_hours += r.total_hours;
            }
            RequestStatus::Rejected => s.rejected_requests += 1,
            RequestStatus::Cancelled => s.cancelled_requests += 1,
            _ => s.pending_requests += 1,
        }
    }

    let decided = s.approved_requests + s.rejected_requests;
    if decided > 0 {
        s.approval_rate = (s.approved_requests as f64 / decided as f64 * 1000.0).round() / 10.0;
    }
    s.estimated_cost = round2(s.approved_hours * hourly_rate);
    s.total_hours = round2(s.total_hours);
    s.approved_hours = round2(s.approved_hours);
    s
}

/// Breakdown by the employee's direct service, over the services in scope.
pub fn by_service(
    requests: &[&OvertimeRequest],
    employees: &[Employee],
    services: &[Service],
    filter: &RequestFilter,
) -> Vec<ServiceStats> {
    let scope = filter.scope(services);
    let in_scope = |id: u64| scope.as_ref().is_none_or(|ids| ids.contains(&id));

    let mut rows: Vec<ServiceStats> = services
        .iter()
        .filter(|s| in_scope(s.id))
        .map(|s| ServiceStats {
            service_id: Some(s.id),
            service_code: s.service_code.clone(),
            service_name: s.service_name.clone(),
            employee_count: employees
                .iter()
                .filter(|e| e.service_id == s.id && e.is_active)
                .count(),
            request_count: 0,
            total_hours: 0.0,
            approved_hours: 0.0,
        })
        .collect();

    let row_of: HashMap<u64, usize> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.service_id.map(|id| (id, i)))
        .collect();
    let service_of: HashMap<u64, u64> = employees.iter().map(|e| (e.id, e.service_id)).collect();

    let mut unassigned: Option<ServiceStats> = None;

    for r in requests {
        let row = match service_of.get(&r.employee_id).and_then(|s| row_of.get(s)) {
            Some(&i) => &mut rows[i],
            None => unassigned.get_or_insert_with(|| ServiceStats {
                service_id: None,
                service_code: String::new(),
                service_name: "Unassigned".to_string(),
                employee_count: 0,
                request_count: 0,
                total_hours: 0.0,
                approved_hours: 0.0,
            }),
        };
        row.request_count += 1;
        row.total_hours += r.total_hours;
        if r.status == RequestStatus::Approved {
            row.approved_hours += r.total_hours;
        }
    }

    rows.extend(unassigned);
    for row in &mut rows {
        row.total_hours = round2(row.total_hours);
        row.approved_hours = round2(row.approved_hours);
    }
    rows
}

/// Employees with at least one request, by total hours descending. Ties keep
/// the order of `employees`.
pub fn top_employees(requests: &[&OvertimeRequest], employees: &[Employee], top: usize) -> Vec<EmployeeStats> {
    let mut totals: HashMap<u64, (usize, f64, f64)> = HashMap::new();
    for r in requests {
        let entry = totals.entry(r.employee_id).or_default();
        entry.0 += 1;
        entry.1 += r.total_hours;
        if r.status == RequestStatus::Approved {
            entry.2 += r.total_hours;
        }
    }

    // ranked on the exact sums, rounded only for output
    let mut ranked: Vec<(&Employee, (usize, f64, f64))> = employees
        .iter()
        .filter_map(|e| totals.get(&e.id).map(|&t| (e, t)))
        .collect();
    ranked.sort_by(|(_, a), (_, b)| b.1.total_cmp(&a.1));
    ranked.truncate(top.min(MAX_TOP));

    ranked
        .into_iter()
        .map(|(e, (count, total, approved))| EmployeeStats {
            employee_id: e.id,
            employee_number: e.employee_number.clone(),
            full_name: e.full_name(),
            service_id: e.service_id,
            request_count: count,
            total_hours: round2(total),
            approved_hours: round2(approved),
        })
        .collect()
}

pub fn build_report(
    requests: &[OvertimeRequest],
    employees: &[Employee],
    services: &[Service],
    filter: &RequestFilter,
    hourly_rate: f64,
    top: usize,
) -> Report {
    let selected = filter.apply(requests, employees, services);

    Report {
        start_date: filter.start_date,
        end_date: filter.end_date,
        service_id: filter.service_id,
        summary: summarize(&selected, hourly_rate),
        by_service: by_service(&selected, employees, services, filter),
        top_employees: top_employees(&selected, employees, top),
    }
}

/// The caller's own figures and how many requests wait for them.
pub fn dashboard(requests: &[OvertimeRequest], authority: &Authority) -> Dashboard {
    let mine: Vec<&OvertimeRequest> = requests
        .iter()
        .filter(|r| r.is_owned_by(authority.employee_id))
        .collect();

    let by_status = RequestStatus::iter()
        .map(|status| StatusCount {
            status,
            count: mine.iter().filter(|r| r.status == status).count(),
        })
        .collect();

    Dashboard {
        my_requests: mine.len(),
        my_total_hours: round2(mine.iter().map(|r| r.total_hours).sum()),
        my_approved_hours: round2(
            mine.iter()
                .filter(|r| r.status == RequestStatus::Approved)
                .map(|r| r.total_hours)
                .sum(),
        ),
        by_status,
        to_validate: requests.iter().filter(|r| is_actionable(r, authority)).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::sample as employee;
    use crate::model::profile::Profile;
    use crate::model::request::sample as request;
    use crate::model::service::sample as service;
    use proptest::prelude::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn fixture() -> (Vec<OvertimeRequest>, Vec<Employee>, Vec<Service>) {
        // ROOT(1) ─ IT(2) ─ DEV(4); HR(3) has no parent
        let services = vec![
            service(1, "ROOT", None),
            service(2, "IT", Some(1)),
            service(3, "HR", None),
            service(4, "DEV", Some(2)),
        ];
        let employees = vec![employee(10, 2), employee(11, 4), employee(12, 3)];
        let requests = vec![
            request(1, 10, d(2), (17, 0), (19, 0), RequestStatus::Approved),
            request(2, 10, d(3), (17, 0), (18, 30), RequestStatus::Rejected),
            request(3, 11, d(4), (18, 0), (21, 0), RequestStatus::Approved),
            request(4, 11, d(20), (18, 0), (19, 0), RequestStatus::Submitted),
            request(5, 12, d(5), (17, 0), (20, 0), RequestStatus::Cancelled),
            request(6, 12, d(6), (17, 0), (17, 30), RequestStatus::Pending),
        ];
        (requests, employees, services)
    }

    #[test]
    fn summary_counts_and_rates() {
        let (requests, employees, services) = fixture();
        let filter = RequestFilter::default();
        let report = build_report(&requests, &employees, &services, &filter, 25.0, DEFAULT_TOP);

        let s = report.summary;
        assert_eq!(s.total_requests, 6);
        assert_eq!(s.approved_requests, 2);
        assert_eq!(s.rejected_requests, 1);
        assert_eq!(s.cancelled_requests, 1);
        assert_eq!(s.pending_requests, 2);
        assert_eq!(s.total_hours, 11.0);
        assert_eq!(s.approved_hours, 5.0);
        // 2 approved out of 3 decided
        assert_eq!(s.approval_rate, 66.7);
        assert_eq!(s.estimated_cost, 125.0);
    }

    #[test]
    fn approval_rate_is_zero_when_nothing_decided() {
        let (requests, _, _) = fixture();
        let undecided: Vec<&OvertimeRequest> = requests.iter().filter(|r| !r.status.is_terminal()).collect();
        assert_eq!(summarize(&undecided, 25.0).approval_rate, 0.0);
    }

    #[test]
    fn period_is_inclusive() {
        let (requests, employees, services) = fixture();
        let filter = RequestFilter::new(Some(d(3)), Some(d(5)), None).unwrap();
        let ids: Vec<u64> = filter.apply(&requests, &employees, &services).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 5]);
    }

    #[test]
    fn inverted_period_is_refused() {
        assert!(RequestFilter::new(Some(d(5)), Some(d(3)), None).is_err());
    }

    #[test]
    fn service_filter_includes_sub_services() {
        let (requests, employees, services) = fixture();
        let filter = RequestFilter::new(None, None, Some(2)).unwrap();
        let ids: Vec<u64> = filter.apply(&requests, &employees, &services).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let report = build_report(&requests, &employees, &services, &filter, 25.0, DEFAULT_TOP);
        let codes: Vec<&str> = report.by_service.iter().map(|s| s.service_code.as_str()).collect();
        assert_eq!(codes, vec!["IT", "DEV"]);
    }

    #[test]
    fn breakdown_uses_direct_service() {
        let (requests, employees, services) = fixture();
        let report = build_report(&requests, &employees, &services, &RequestFilter::default(), 25.0, 10);

        let it = report.by_service.iter().find(|s| s.service_code == "IT").unwrap();
        assert_eq!(it.request_count, 2);
        assert_eq!(it.total_hours, 3.5);
        assert_eq!(it.approved_hours, 2.0);
        assert_eq!(it.employee_count, 1);

        let root = report.by_service.iter().find(|s| s.service_code == "ROOT").unwrap();
        assert_eq!(root.request_count, 0);
    }

    #[test]
    fn requests_of_unknown_employees_are_grouped() {
        let (mut requests, employees, services) = fixture();
        requests.push(request(7, 99, d(7), (17, 0), (18, 0), RequestStatus::Pending));
        let rows = build_report(&requests, &employees, &services, &RequestFilter::default(), 25.0, 10).by_service;
        let last = rows.last().unwrap();
        assert_eq!(last.service_id, None);
        assert_eq!(last.total_hours, 1.0);
    }

    #[test]
    fn top_employees_sorted_and_truncated() {
        let (requests, employees, _) = fixture();
        let all: Vec<&OvertimeRequest> = requests.iter().collect();

        let top = top_employees(&all, &employees, 2);
        let ids: Vec<u64> = top.iter().map(|e| e.employee_id).collect();
        // 11: 4h, 10: 3.5h, 12: 3.5h (tie keeps employee order)
        assert_eq!(ids, vec![11, 10]);
        assert_eq!(top[0].approved_hours, 3.0);

        let three = top_employees(&all, &employees, 10);
        assert_eq!(three.iter().map(|e| e.employee_id).collect::<Vec<_>>(), vec![11, 10, 12]);
    }

    #[test]
    fn ranking_uses_unrounded_totals() {
        let employees = vec![employee(10, 2), employee(11, 2)];
        let mut a = request(1, 10, d(2), (17, 0), (18, 0), RequestStatus::Approved);
        let mut b = request(2, 11, d(2), (17, 0), (18, 0), RequestStatus::Approved);
        a.total_hours = 1.001;
        b.total_hours = 1.004;

        let top = top_employees(&[&a, &b], &employees, 10);
        assert_eq!(top.iter().map(|e| e.employee_id).collect::<Vec<_>>(), vec![11, 10]);
        assert_eq!(top[0].total_hours, 1.0);
        assert_eq!(top[1].total_hours, 1.0);
    }

    #[test]
    fn dashboard_counts_own_and_actionable() {
        let (requests, _, _) = fixture();
        let supervisor = Authority::own(12, Profile::Supervisor);
        let dash = dashboard(&requests, &supervisor);

        assert_eq!(dash.my_requests, 2);
        assert_eq!(dash.my_total_hours, 3.5);
        let pending = dash.by_status.iter().find(|c| c.status == RequestStatus::Pending).unwrap();
        assert_eq!(pending.count, 1);
        assert_eq!(dash.by_status.len(), 8);
        // request 4 is submitted by employee 11
        assert_eq!(dash.to_validate, 1);
    }

    fn arb_status() -> impl Strategy<Value = RequestStatus> {
        prop::sample::select(RequestStatus::iter().collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn per_service_hours_add_up_to_total(
            entries in prop::collection::vec(
                (0u64..6, 1u32..28, 6u32..12, 0u32..60, 1u32..10, arb_status()),
                0..60,
            )
        ) {
            let (_, employees, services) = fixture();
            // ids 10..=12 are known, the rest land in the unassigned row
            let requests: Vec<OvertimeRequest> = entries
                .iter()
                .enumerate()
                .map(|(i, &(emp, day, h, m, len, status))| {
                    request(i as u64, 10 + emp, d(day), (h, m), (h + len, m), status)
                })
                .collect();

            let report = build_report(&requests, &employees, &services, &RequestFilter::default(), 30.0, 10);

            let service_sum: f64 = report.by_service.iter().map(|s| s.total_hours).sum();
            let tolerance = 0.005 * (report.by_service.len() as f64 + 1.0);
            prop_assert!((service_sum - report.summary.total_hours).abs() <= tolerance);

            let counted: usize = report.by_service.iter().map(|s| s.request_count).sum();
            prop_assert_eq!(counted, report.summary.total_requests);

            let s = &report.summary;
            prop_assert_eq!(
                s.approved_requests + s.pending_requests + s.rejected_requests + s.cancelled_requests,
                s.total_requests
            );
        }
    }
}
