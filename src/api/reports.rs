use crate::{
    api::{employees::all_employees, requests::all_requests, services::all_services},
    auth::auth::AuthUser,
    config::Config,
    error::ApiResult,
    model::profile::Profile,
    report::{
        aggregator::{DEFAULT_TOP, MAX_TOP, Report, RequestFilter, build_report},
        export::to_csv,
    },
    utils::resource_cache::ResourceCache,
};
use actix_web::{HttpResponse, http::header, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::IntoParams;

const REPORT_PROFILES: [Profile; 3] = [
    Profile::Administrator,
    Profile::Supervisor,
    Profile::Coordinator,
];

#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Inclusive start of the period
    #[param(value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive end of the period
    #[param(value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    /// Restrict to a service and its sub-services
    pub service_id: Option<u64>,
    /// Number of top employees, default 10, at most 100
    pub top: Option<usize>,
}

impl ReportQuery {
    fn filter(&self) -> ApiResult<RequestFilter> {
        RequestFilter::new(self.start_date, self.end_date, self.service_id)
    }
}

/// Overtime summary
#[utoipa::path(
    get,
    path = "/reports/summary",
    params(ReportQuery),
    responses(
        (status = 200, description = "Summary, per-service breakdown and top employees", body = Report),
        (status = 400, description = "End date before start date"),
        (status = 403, description = "Administrator, Supervisor or Coordinator only")
    ),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_any(&REPORT_PROFILES)?;
    let filter = query.filter()?;
    let top = query.top.unwrap_or(DEFAULT_TOP).clamp(1, MAX_TOP);

    let requests = all_requests(pool.get_ref(), cache.get_ref()).await?;
    let employees = all_employees(pool.get_ref(), cache.get_ref()).await?;
    let services = all_services(pool.get_ref(), cache.get_ref()).await?;

    let report = build_report(
        &requests,
        &employees,
        &services,
        &filter,
        config.overtime_hourly_rate,
        top,
    );
    Ok(HttpResponse::Ok().json(report))
}

/// CSV export of the filtered requests
#[utoipa::path(
    get,
    path = "/reports/export",
    params(ReportQuery),
    responses(
        (status = 200, description = "date,employee,service,hours,comment,status", content_type = "text/csv", body = String),
        (status = 400, description = "End date before start date"),
        (status = 403, description = "Administrator, Supervisor or Coordinator only")
    ),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
pub async fn export(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    query: web::Query<ReportQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_any(&REPORT_PROFILES)?;
    let filter = query.filter()?;

    let requests = all_requests(pool.get_ref(), cache.get_ref()).await?;
    let employees = all_employees(pool.get_ref(), cache.get_ref()).await?;
    let services = all_services(pool.get_ref(), cache.get_ref()).await?;

    let selected = filter.apply(&requests, &employees, &services);
    let body = to_csv(&selected, &employees, &services);

    let name = format!(
        "overtime-report-{}-{}.csv",
        query.start_date.map(|d| d.to_string()).unwrap_or_else(|| "all".into()),
        query.end_date.map(|d| d.to_string()).unwrap_or_else(|| "all".into()),
    );

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        ))
        .body(body))
}
