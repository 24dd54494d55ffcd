use crate::model::employee::Employee;
use crate::model::request::OvertimeRequest;
use crate::model::service::Service;
use std::collections::HashMap;
use std::fmt::Write;

pub const CSV_HEADER: &str = "date,employee,service,hours,comment,status";

/// Quotes a field when it holds a separator, a quote or a line break.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One line per request, in the given order, after [`CSV_HEADER`].
pub fn to_csv(requests: &[&OvertimeRequest], employees: &[Employee], services: &[Service]) -> String {
    let employee_by_id: HashMap<u64, &Employee> = employees.iter().map(|e| (e.id, e)).collect();
    let service_by_id: HashMap<u64, &Service> = services.iter().map(|s| (s.id, s)).collect();

    let mut out = String::with_capacity(64 * (requests.len() + 1));
    out.push_str(CSV_HEADER);
    out.push_str("\r\n");

    for r in requests {
        let employee = employee_by_id.get(&r.employee_id);
        let name = employee.map(|e| e.full_name()).unwrap_or_else(|| "N/A".to_string());
        let service = employee
            .and_then(|e| service_by_id.get(&e.service_id))
            .map(|s| s.service_name.as_str())
            .unwrap_or("N/A");

        // writing into a String cannot fail
        let _ = write!(
            out,
            "{},{},{},{:.2},{},{}\r\n",
            r.request_date,
            field(&name),
            field(service),
            r.total_hours,
            field(r.comment.as_deref().unwrap_or("")),
            r.status,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::sample as employee;
    use crate::model::request::sample as request;
    use crate::model::service::sample as service;
    use crate::model::status::RequestStatus;
    use chrono::NaiveDate;

    #[test]
    fn renders_header_and_rows() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut r = request(1, 10, date, (17, 0), (19, 30), RequestStatus::Approved);
        r.comment = Some("Inventaire, \"urgent\"".to_string());
        let orphan = request(2, 99, date, (18, 0), (19, 0), RequestStatus::Submitted);

        let csv = to_csv(&[&r, &orphan], &[employee(10, 2)], &[service(2, "IT", None)]);
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "2026-03-02,First10 Last10,Service IT,2.50,\"Inventaire, \"\"urgent\"\"\",approved"
        );
        assert_eq!(lines[2], "2026-03-02,N/A,N/A,1.00,,submitted");
        assert_eq!(lines[3], "");
    }
}
