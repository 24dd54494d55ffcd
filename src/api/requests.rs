use crate::{
    api::{employees::all_employees, fetch_by_id, services::all_services},
    approval::{
        authority::{Acting, Authority},
        projection::project,
        transition::{Action, next_status, required_level},
    },
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::{
        employee::{EMPLOYEE_COLUMNS, Employee},
        profile::Profile,
        request::{OvertimeRequest, REQUEST_COLUMNS},
        status::{ApprovalLevel, RequestStatus},
        workflow::{Decision, WORKFLOW_COLUMNS, Workflow},
    },
    report::aggregator::RequestFilter,
    utils::{
        resource_cache::ResourceCache,
        sql_update::double_option,
        validators::{validate_previous_schedule, validate_request_date, validate_working_hours},
    },
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRequest {
    /// Defaults to the caller's employee; only managers file for someone else
    #[schema(example = 3)]
    pub employee_id: Option<u64>,
    #[schema(example = "2026-02-10", format = "date", value_type = String)]
    pub request_date: NaiveDate,
    #[schema(example = "09:00:00", format = "time", value_type = Option<String>)]
    pub previous_start: Option<NaiveTime>,
    #[schema(example = "17:00:00", format = "time", value_type = Option<String>)]
    pub previous_end: Option<NaiveTime>,
    #[schema(example = "17:00:00", format = "time", value_type = String)]
    pub start_at: NaiveTime,
    #[schema(example = "20:30:00", format = "time", value_type = String)]
    pub end_at: NaiveTime,
    pub comment: Option<String>,
}

/// Editable fields. The status only changes through the transition endpoints.
/// An absent field is left as is; `null` clears the nullable ones.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateRequest {
    #[schema(format = "date", value_type = Option<String>)]
    pub request_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(format = "time", value_type = Option<String>, nullable = true)]
    pub previous_start: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(format = "time", value_type = Option<String>, nullable = true)]
    pub previous_end: Option<Option<NaiveTime>>,
    #[schema(format = "time", value_type = Option<String>)]
    pub start_at: Option<NaiveTime>,
    #[schema(format = "time", value_type = Option<String>)]
    pub end_at: Option<NaiveTime>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, nullable = true)]
    pub comment: Option<Option<String>>,
}

/// Editable fields of a request once an update is applied.
#[derive(Debug, PartialEq)]
struct EditedFields {
    request_date: NaiveDate,
    previous_start: Option<NaiveTime>,
    previous_end: Option<NaiveTime>,
    start_at: NaiveTime,
    end_at: NaiveTime,
    comment: Option<String>,
}

impl UpdateRequest {
    fn apply_to(self, current: &OvertimeRequest) -> EditedFields {
        EditedFields {
            request_date: self.request_date.unwrap_or(current.request_date),
            previous_start: self.previous_start.unwrap_or(current.previous_start),
            previous_end: self.previous_end.unwrap_or(current.previous_end),
            start_at: self.start_at.unwrap_or(current.start_at),
            end_at: self.end_at.unwrap_or(current.end_at),
            comment: self.comment.unwrap_or_else(|| current.comment.clone()),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CommentBody {
    #[schema(example = "Validé, merci")]
    pub comment: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
pub struct RequestQuery {
    pub status: Option<RequestStatus>,
    pub employee_id: Option<u64>,
    /// Includes the sub-services
    pub service_id: Option<u64>,
    /// Inclusive lower bound on `request_date`
    #[param(value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on `request_date`
    #[param(value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
}

pub(crate) async fn all_requests(
    pool: &MySqlPool,
    cache: &ResourceCache,
) -> ApiResult<Arc<Vec<OvertimeRequest>>> {
    cache
        .requests
        .get_or_load(|| async {
            let rows = sqlx::query_as::<_, OvertimeRequest>(&format!(
                "SELECT {REQUEST_COLUMNS} FROM requests ORDER BY request_date DESC, id DESC"
            ))
            .fetch_all(pool)
            .await?;
            Ok::<_, ApiError>(rows.into_iter().map(OvertimeRequest::computed).collect())
        })
        .await
}

async fn load_request(pool: &MySqlPool, id: u64) -> ApiResult<OvertimeRequest> {
    fetch_by_id::<OvertimeRequest>(pool, "requests", REQUEST_COLUMNS, id)
        .await?
        .map(OvertimeRequest::computed)
        .ok_or_else(|| ApiError::not_found("Request not found"))
}

async fn invalidate_requests(cache: &ResourceCache) {
    cache.requests.invalidate().await;
    cache.workflows.invalidate().await;
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// List requests
#[utoipa::path(
    get,
    path = "/requests",
    params(RequestQuery),
    responses(
        (status = 200, description = "Requests, most recent first", body = [OvertimeRequest]),
        (status = 400, description = "Invalid date range")
    ),
    tag = "Requests",
    security(("bearer_auth" = []))
)]
pub async fn list_requests(
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    query: web::Query<RequestQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let requests = all_requests(pool.get_ref(), cache.get_ref()).await?;

    let filter = RequestFilter::new(query.start_date, query.end_date, query.service_id)?;
    let scoped = if filter.service_id.is_some() {
        let services = all_services(pool.get_ref(), cache.get_ref()).await?;
        let employees = all_employees(pool.get_ref(), cache.get_ref()).await?;
        filter.apply(&requests, &employees, &services)
    } else {
        filter.apply(&requests, &[], &[])
    };

    let filtered: Vec<&OvertimeRequest> = scoped
        .into_iter()
        .filter(|r| query.status.is_none_or(|s| r.status == s))
        .filter(|r| query.employee_id.is_none_or(|e| r.employee_id == e))
        .collect();

    Ok(HttpResponse::Ok().json(filtered))
}

/// Caller's own requests
#[utoipa::path(
    get,
    path = "/requests/my-requests",
    responses((status = 200, description = "Requests owned or filed by the caller", body = [OvertimeRequest])),
    tag = "Requests",
    security(("bearer_auth" = []))
)]
pub async fn my_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
) -> ApiResult<HttpResponse> {
    let requests = all_requests(pool.get_ref(), cache.get_ref()).await?;
    let mine: Vec<&OvertimeRequest> = requests
        .iter()
        .filter(|r| r.is_owned_by(auth.employee_id))
        .collect();
    Ok(HttpResponse::Ok().json(mine))
}

/// Requests waiting for the caller's decision
#[utoipa::path(
    get,
    path = "/requests/pending",
    responses((status = 200, description = "Requests the caller can validate now", body = [OvertimeRequest])),
    tag = "Requests",
    security(("bearer_auth" = []))
)]
pub async fn pending_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
) -> ApiResult<HttpResponse> {
    let authority = Authority::load(pool.get_ref(), &auth, today()).await?;
    let requests = all_requests(pool.get_ref(), cache.get_ref()).await?;
    Ok(HttpResponse::Ok().json(project(&requests, &authority)))
}

/// Get request by ID
#[utoipa::path(
    get,
    path = "/requests/{id}",
    params(("id" = u64, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request found", body = OvertimeRequest),
        (status = 404, description = "Request not found")
    ),
    tag = "Requests",
    security(("bearer_auth" = []))
)]
pub async fn get_request(pool: web::Data<MySqlPool>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let request = load_request(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Create request
///
/// New requests start as `pending` and go to the supervisor once submitted.
#[utoipa::path(
    post,
    path = "/requests",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created", body = OvertimeRequest),
        (status = 400, description = "Invalid date or times, or unknown employee"),
        (status = 403, description = "Filing for another employee requires Administrator or Supervisor")
    ),
    tag = "Requests",
    security(("bearer_auth" = []))
)]
pub async fn create_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    payload: web::Json<CreateRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();

    let employee_id = payload.employee_id.unwrap_or(auth.employee_id);
    if employee_id != auth.employee_id {
        auth.require_manager()?;
    }

    validate_request_date(payload.request_date, today())?;
    validate_working_hours(payload.start_at, payload.end_at)?;
    validate_previous_schedule(payload.previous_start, payload.previous_end)?;

    let employee: Employee = fetch_by_id(pool.get_ref(), "employees", EMPLOYEE_COLUMNS, employee_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Employee does not exist"))?;
    if !employee.is_active {
        return Err(ApiError::bad_request("Employee is not active"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO requests
            (employee_id, request_date, previous_start, previous_end, start_at, end_at,
             status, comment, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.request_date)
    .bind(payload.previous_start)
    .bind(payload.previous_end)
    .bind(payload.start_at)
    .bind(payload.end_at)
    .bind(RequestStatus::Pending.as_ref())
    .bind(&payload.comment)
    .bind(auth.employee_id)
    .execute(pool.get_ref())
    .await?;

    invalidate_requests(cache.get_ref()).await;
    info!(
        request_id = result.last_insert_id(),
        employee_id,
        by = %auth.username,
        "Overtime request created"
    );

    let request = load_request(pool.get_ref(), result.last_insert_id()).await?;
    Ok(HttpResponse::Created().json(request))
}

/// Update request
#[utoipa::path(
    put,
    path = "/requests/{id}",
    params(("id" = u64, Path, description = "Request ID")),
    request_body = UpdateRequest,
    responses(
        (status = 200, description = "Request updated", body = OvertimeRequest),
        (status = 400, description = "Invalid date or times, or unknown field such as status"),
        (status = 403, description = "Neither the owner nor a manager"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already in validation or closed")
    ),
    tag = "Requests",
    security(("bearer_auth" = []))
)]
pub async fn update_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
    payload: web::Json<UpdateRequest>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let payload = payload.into_inner();
    let current = load_request(pool.get_ref(), id).await?;

    if !current.is_owned_by(auth.employee_id) && !auth.is_manager() {
        return Err(ApiError::forbidden("You are not allowed to modify this request"));
    }
    if !current.status.is_editable() {
        return Err(ApiError::conflict(format!(
            "A request that is {} can no longer be modified",
            current.status
        )));
    }

    let edited = payload.apply_to(&current);
    if edited.request_date != current.request_date {
        validate_request_date(edited.request_date, today())?;
    }
    validate_working_hours(edited.start_at, edited.end_at)?;
    validate_previous_schedule(edited.previous_start, edited.previous_end)?;

    let result = sqlx::query(
        r#"
        UPDATE requests
        SET request_date = ?, previous_start = ?, previous_end = ?,
            start_at = ?, end_at = ?, comment = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(edited.request_date)
    .bind(edited.previous_start)
    .bind(edited.previous_end)
    .bind(edited.start_at)
    .bind(edited.end_at)
    .bind(&edited.comment)
    .bind(id)
    .bind(current.status.as_ref())
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Request was modified concurrently, reload and retry"));
    }

    invalidate_requests(cache.get_ref()).await;
    let request = load_request(pool.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Delete request
#[utoipa::path(
    delete,
    path = "/requests/{id}",
    params(("id" = u64, Path, description = "Request ID")),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 403, description = "Neither the owner nor an Administrator"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Only pending requests can be deleted")
    ),
    tag = "Requests",
    security(("bearer_auth" = []))
)]
pub async fn delete_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let current = load_request(pool.get_ref(), id).await?;

    if !current.is_owned_by(auth.employee_id) && auth.profile != Profile::Administrator {
        return Err(ApiError::forbidden("You are not allowed to delete this request"));
    }

    let result = sqlx::query("DELETE FROM requests WHERE id = ? AND status = ?")
        .bind(id)
        .bind(RequestStatus::Pending.as_ref())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Only pending requests can be deleted"));
    }

    invalidate_requests(cache.get_ref()).await;
    info!(request_id = id, by = %auth.username, "Overtime request deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Resolves who performs `action` on `request`, or why the caller may not.
async fn resolve_actor(
    pool: &MySqlPool,
    auth: &AuthUser,
    request: &OvertimeRequest,
    action: Action,
) -> ApiResult<Acting> {
    if action.is_owner_action() {
        if request.is_owned_by(auth.employee_id) || auth.profile == Profile::Administrator {
            return Ok(Acting {
                validator: auth.employee_id,
                delegate: None,
            });
        }
        return Err(ApiError::forbidden(format!(
            "Only the owner of the request or an Administrator can {action} it"
        )));
    }

    let level = required_level(request.status, action).ok_or(ApiError::Internal)?;

    if request.is_owned_by(auth.employee_id) {
        return Err(ApiError::forbidden("You cannot validate a request you own or filed"));
    }

    let authority = Authority::load(pool, auth, today()).await?;
    authority
        .acting_for(level, request)
        .ok_or_else(|| {
            ApiError::forbidden(format!(
                "Level {} validation is not within your authority",
                level.number()
            ))
        })
}

/// Applies one state-machine step with a compare-and-set update and records
/// the decision in the workflow history, atomically.
async fn apply_action(
    auth: &AuthUser,
    pool: &MySqlPool,
    cache: &ResourceCache,
    id: u64,
    action: Action,
    comment: Option<String>,
) -> ApiResult<OvertimeRequest> {
    let request = load_request(pool, id).await?;

    let to = next_status(request.status, action).map_err(|e| ApiError::conflict(e.to_string()))?;
    let acting = resolve_actor(pool, auth, &request, action).await?;

    let stamp = match action {
        Action::Approve(ApprovalLevel::First) => ", validated_n1_at = UTC_TIMESTAMP()",
        Action::Approve(ApprovalLevel::Second) => ", validated_n2_at = UTC_TIMESTAMP()",
        _ => "",
    };

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(&format!(
        "UPDATE requests SET status = ?{stamp} WHERE id = ? AND status = ?"
    ))
    .bind(to.as_ref())
    .bind(id)
    .bind(request.status.as_ref())
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        warn!(request_id = id, from = %request.status, %action, "Lost transition race");
        return Err(ApiError::conflict(
            "Request was modified concurrently, reload and retry",
        ));
    }

    let now = Utc::now().naive_utc();
    let decision = action.decision();
    let validation_date = (decision != Decision::Assigned).then_some(now);

    sqlx::query(
        r#"
        INSERT INTO workflows
            (request_id, validator, delegate, assign_date, validation_date, status, comment)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(acting.validator)
    .bind(acting.delegate)
    .bind(now)
    .bind(validation_date)
    .bind(decision.code())
    .bind(comment.filter(|c| !c.trim().is_empty()))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    invalidate_requests(cache).await;

    info!(
        request_id = id,
        from = %request.status,
        to = %to,
        validator = acting.validator,
        delegate = ?acting.delegate,
        by = %auth.username,
        "Request status changed"
    );

    load_request(pool, id).await
}

fn comment_of(body: Option<web::Json<CommentBody>>) -> Option<String> {
    body.and_then(|b| b.into_inner().comment)
}

/// Submit a pending request for validation
#[utoipa::path(
    post,
    path = "/requests/{id}/submit",
    params(("id" = u64, Path, description = "Request ID")),
    request_body(content = CommentBody, description = "Optional comment"),
    responses(
        (status = 200, description = "Request submitted", body = OvertimeRequest),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Request is not pending")
    ),
    tag = "Approval",
    security(("bearer_auth" = []))
)]
pub async fn submit_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
    body: Option<web::Json<CommentBody>>,
) -> ApiResult<HttpResponse> {
    let request = apply_action(
        &auth,
        pool.get_ref(),
        cache.get_ref(),
        path.into_inner(),
        Action::Submit,
        comment_of(body),
    )
    .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Approve at level 1 (supervisor) or level 2 (HR / coordinator)
#[utoipa::path(
    post,
    path = "/requests/{id}/approve/{level}",
    params(
        ("id" = u64, Path, description = "Request ID"),
        ("level" = u8, Path, description = "Validation level, 1 or 2")
    ),
    request_body(content = CommentBody, description = "Optional comment"),
    responses(
        (status = 200, description = "Request approved at that level", body = OvertimeRequest),
        (status = 400, description = "Unknown level"),
        (status = 403, description = "Own request, or level outside the caller's authority"),
        (status = 409, description = "Request is not waiting for that level, or was decided concurrently")
    ),
    tag = "Approval",
    security(("bearer_auth" = []))
)]
pub async fn approve_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<(u64, u8)>,
    body: Option<web::Json<CommentBody>>,
) -> ApiResult<HttpResponse> {
    let (id, level) = path.into_inner();
    let level = ApprovalLevel::from_number(level)
        .ok_or_else(|| ApiError::bad_request("Validation level must be 1 or 2"))?;

    let request = apply_action(
        &auth,
        pool.get_ref(),
        cache.get_ref(),
        id,
        Action::Approve(level),
        comment_of(body),
    )
    .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Ask for a follow-up before level-1 approval
#[utoipa::path(
    post,
    path = "/requests/{id}/follow-up",
    params(("id" = u64, Path, description = "Request ID")),
    request_body(content = CommentBody, description = "Optional comment"),
    responses(
        (status = 200, description = "Follow-up requested", body = OvertimeRequest),
        (status = 403, description = "Own request, or no level-1 authority"),
        (status = 409, description = "Request is not submitted")
    ),
    tag = "Approval",
    security(("bearer_auth" = []))
)]
pub async fn follow_up_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
    body: Option<web::Json<CommentBody>>,
) -> ApiResult<HttpResponse> {
    let request = apply_action(
        &auth,
        pool.get_ref(),
        cache.get_ref(),
        path.into_inner(),
        Action::FollowUp,
        comment_of(body),
    )
    .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Reject at the level the request is waiting for
#[utoipa::path(
    post,
    path = "/requests/{id}/reject",
    params(("id" = u64, Path, description = "Request ID")),
    request_body(content = CommentBody, description = "Optional comment"),
    responses(
        (status = 200, description = "Request rejected", body = OvertimeRequest),
        (status = 403, description = "Own request, or level outside the caller's authority"),
        (status = 409, description = "Request is not in validation, or was decided concurrently")
    ),
    tag = "Approval",
    security(("bearer_auth" = []))
)]
pub async fn reject_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
    body: Option<web::Json<CommentBody>>,
) -> ApiResult<HttpResponse> {
    let request = apply_action(
        &auth,
        pool.get_ref(),
        cache.get_ref(),
        path.into_inner(),
        Action::Reject,
        comment_of(body),
    )
    .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Withdraw a request before any validation
#[utoipa::path(
    post,
    path = "/requests/{id}/cancel",
    params(("id" = u64, Path, description = "Request ID")),
    request_body(content = CommentBody, description = "Optional comment"),
    responses(
        (status = 200, description = "Request cancelled", body = OvertimeRequest),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Request already validated at level 1 or closed")
    ),
    tag = "Approval",
    security(("bearer_auth" = []))
)]
pub async fn cancel_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
    body: Option<web::Json<CommentBody>>,
) -> ApiResult<HttpResponse> {
    let request = apply_action(
        &auth,
        pool.get_ref(),
        cache.get_ref(),
        path.into_inner(),
        Action::Cancel,
        comment_of(body),
    )
    .await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Validation history of a request
#[utoipa::path(
    get,
    path = "/requests/{id}/workflows",
    params(("id" = u64, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Decisions, oldest first", body = [Workflow]),
        (status = 404, description = "Request not found")
    ),
    tag = "Approval",
    security(("bearer_auth" = []))
)]
pub async fn request_workflows(pool: web::Data<MySqlPool>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    load_request(pool.get_ref(), id).await?;

    let history = sqlx::query_as::<_, Workflow>(&format!(
        "SELECT {WORKFLOW_COLUMNS} FROM workflows WHERE request_id = ? ORDER BY assign_date, id"
    ))
    .bind(id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::request::sample;

    fn current() -> OvertimeRequest {
        let d = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let mut request = sample(3, 5, d, (17, 0), (19, 0), RequestStatus::Pending);
        request.previous_start = NaiveTime::from_hms_opt(9, 0, 0);
        request.previous_end = NaiveTime::from_hms_opt(17, 0, 0);
        request.comment = Some("inventaire".to_string());
        request
    }

    #[test]
    fn absent_fields_keep_their_value() {
        let patch: UpdateRequest = serde_json::from_str(r#"{"end_at": "20:00:00"}"#).unwrap();
        let edited = patch.apply_to(&current());

        assert_eq!(edited.end_at, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
        assert_eq!(edited.previous_start, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(edited.comment.as_deref(), Some("inventaire"));
    }

    #[test]
    fn null_clears_optional_fields() {
        let patch: UpdateRequest = serde_json::from_str(
            r#"{"previous_start": null, "previous_end": null, "comment": null}"#,
        )
        .unwrap();
        let edited = patch.apply_to(&current());

        assert_eq!(edited.previous_start, None);
        assert_eq!(edited.previous_end, None);
        assert_eq!(edited.comment, None);
        assert_eq!(edited.start_at, current().start_at);
    }

    #[test]
    fn unchanged_fields_are_not_sent() {
        let patch = UpdateRequest {
            comment: Some(None),
            ..UpdateRequest::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body.get("comment"), Some(&serde_json::Value::Null));
        assert!(body.get("previous_start").is_none());
    }

    #[test]
    fn status_is_not_an_editable_field() {
        let parsed = serde_json::from_str::<UpdateRequest>(r#"{"status": "approved"}"#);
        assert!(parsed.is_err());
    }
}
