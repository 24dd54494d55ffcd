use crate::{
    api::fetch_by_id,
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::{
        employee::{EMPLOYEE_COLUMNS, Employee},
        request::{OvertimeRequest, REQUEST_COLUMNS},
        workflow::{Decision, WORKFLOW_COLUMNS, Workflow},
    },
    utils::resource_cache::ResourceCache,
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

/// Manual history entry; it does not change the request status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateWorkflow {
    #[schema(example = 12)]
    pub request_id: u64,
    #[schema(example = 2)]
    pub validator: u64,
    pub delegate: Option<u64>,
    /// Decision code: 0 assigned, 1 approved, 2 rejected, 3 follow-up, 4 cancelled
    #[schema(example = 0)]
    pub status: u8,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub validation_date: Option<NaiveDateTime>,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WorkflowQuery {
    pub request_id: Option<u64>,
}

pub(crate) async fn all_workflows(pool: &MySqlPool, cache: &ResourceCache) -> ApiResult<Arc<Vec<Workflow>>> {
    cache
        .workflows
        .get_or_load(|| async {
            sqlx::query_as::<_, Workflow>(&format!(
                "SELECT {WORKFLOW_COLUMNS} FROM workflows ORDER BY assign_date, id"
            ))
            .fetch_all(pool)
            .await
            .map_err(ApiError::from)
        })
        .await
}

/// List workflows
#[utoipa::path(
    get,
    path = "/workflows",
    params(WorkflowQuery),
    responses(
        (status = 200, description = "Workflow entries, oldest first", body = [Workflow]),
        (status = 403, description = "Administrator or Supervisor only")
    ),
    tag = "Workflows",
    security(("bearer_auth" = []))
)]
pub async fn list_workflows(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    query: web::Query<WorkflowQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_manager()?;

    let workflows = all_workflows(pool.get_ref(), cache.get_ref()).await?;
    let filtered: Vec<&Workflow> = workflows
        .iter()
        .filter(|w| query.request_id.is_none_or(|r| w.request_id == r))
        .collect();

    Ok(HttpResponse::Ok().json(filtered))
}

/// Create workflow entry
#[utoipa::path(
    post,
    path = "/workflows",
    request_body = CreateWorkflow,
    responses(
        (status = 201, description = "Workflow entry created", body = Workflow),
        (status = 400, description = "Unknown request, validator or decision code"),
        (status = 403, description = "Administrator or Supervisor only")
    ),
    tag = "Workflows",
    security(("bearer_auth" = []))
)]
pub async fn create_workflow(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    payload: web::Json<CreateWorkflow>,
) -> ApiResult<HttpResponse> {
    auth.require_manager()?;
    let payload = payload.into_inner();

    let decision = Decision::from_code(payload.status)
        .ok_or_else(|| ApiError::bad_request("Unknown decision code"))?;

    fetch_by_id::<OvertimeRequest>(pool.get_ref(), "requests", REQUEST_COLUMNS, payload.request_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Request does not exist"))?;

    for employee_id in std::iter::once(payload.validator).chain(payload.delegate) {
        fetch_by_id::<Employee>(pool.get_ref(), "employees", EMPLOYEE_COLUMNS, employee_id)
            .await?
            .ok_or_else(|| ApiError::bad_request("Validator does not exist"))?;
    }

    let result = sqlx::query(
        r#"
        INSERT INTO workflows
            (request_id, validator, delegate, assign_date, validation_date, status, comment)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.request_id)
    .bind(payload.validator)
    .bind(payload.delegate)
    .bind(Utc::now().naive_utc())
    .bind(payload.validation_date)
    .bind(decision.code())
    .bind(&payload.comment)
    .execute(pool.get_ref())
    .await?;

    cache.workflows.invalidate().await;
    info!(request_id = payload.request_id, ?decision, by = %auth.username, "Workflow entry added");

    let workflow: Workflow = fetch_by_id(pool.get_ref(), "workflows", WORKFLOW_COLUMNS, result.last_insert_id())
        .await?
        .ok_or(ApiError::Internal)?;
    Ok(HttpResponse::Created().json(workflow))
}
