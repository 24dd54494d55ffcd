use crate::{
    api::{employees::all_employees, fetch_by_id},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::{
        delegation::{DELEGATION_COLUMNS, Delegation},
        profile::Profile,
    },
    utils::{resource_cache::ResourceCache, validators::validate_date_range},
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDelegation {
    #[schema(example = 2)]
    pub delegated_by: u64,
    #[schema(example = 5)]
    pub delegated_to: u64,
    #[schema(example = "2026-07-01", format = "date", value_type = String)]
    pub start_at: NaiveDate,
    #[schema(example = "2026-07-31", format = "date", value_type = String)]
    pub end_at: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DelegationQuery {
    /// Only delegations covering today
    pub active: Option<bool>,
}

pub(crate) async fn all_delegations(
    pool: &MySqlPool,
    cache: &ResourceCache,
) -> ApiResult<Arc<Vec<Delegation>>> {
    cache
        .delegations
        .get_or_load(|| async {
            sqlx::query_as::<_, Delegation>(&format!(
                "SELECT {DELEGATION_COLUMNS} FROM delegations ORDER BY start_at DESC, id DESC"
            ))
            .fetch_all(pool)
            .await
            .map_err(ApiError::from)
        })
        .await
}

/// List delegations
#[utoipa::path(
    get,
    path = "/delegations",
    params(DelegationQuery),
    responses((status = 200, description = "Delegations", body = [Delegation])),
    tag = "Delegations",
    security(("bearer_auth" = []))
)]
pub async fn list_delegations(
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    query: web::Query<DelegationQuery>,
) -> ApiResult<HttpResponse> {
    let delegations = all_delegations(pool.get_ref(), cache.get_ref()).await?;
    let today = Utc::now().date_naive();

    let filtered: Vec<&Delegation> = delegations
        .iter()
        .filter(|d| query.active.is_none_or(|a| d.is_active_on(today) == a))
        .collect();

    Ok(HttpResponse::Ok().json(filtered))
}

/// Create delegation
///
/// Supervisors can only hand over their own authority.
#[utoipa::path(
    post,
    path = "/delegations",
    request_body = CreateDelegation,
    responses(
        (status = 201, description = "Delegation created", body = Delegation),
        (status = 400, description = "Invalid period, unknown employee or delegation to self"),
        (status = 403, description = "Administrator or Supervisor only")
    ),
    tag = "Delegations",
    security(("bearer_auth" = []))
)]
pub async fn create_delegation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    payload: web::Json<CreateDelegation>,
) -> ApiResult<HttpResponse> {
    auth.require_manager()?;
    let payload = payload.into_inner();

    validate_date_range(payload.start_at, payload.end_at)?;

    if payload.delegated_by == payload.delegated_to {
        return Err(ApiError::bad_request("An employee cannot delegate to themselves"));
    }
    if auth.profile != Profile::Administrator && payload.delegated_by != auth.employee_id {
        return Err(ApiError::forbidden("Supervisors can only delegate their own authority"));
    }

    let employees = all_employees(pool.get_ref(), cache.get_ref()).await?;
    let known = |id: u64| employees.iter().any(|e| e.id == id);
    if !known(payload.delegated_by) || !known(payload.delegated_to) {
        return Err(ApiError::bad_request("One or more employees do not exist"));
    }

    let result = sqlx::query(
        "INSERT INTO delegations (delegated_by, delegated_to, start_at, end_at) VALUES (?, ?, ?, ?)",
    )
    .bind(payload.delegated_by)
    .bind(payload.delegated_to)
    .bind(payload.start_at)
    .bind(payload.end_at)
    .execute(pool.get_ref())
    .await?;

    cache.delegations.invalidate().await;
    info!(
        delegated_by = payload.delegated_by,
        delegated_to = payload.delegated_to,
        start = %payload.start_at,
        end = %payload.end_at,
        by = %auth.username,
        "Delegation created"
    );

    let delegation: Delegation =
        fetch_by_id(pool.get_ref(), "delegations", DELEGATION_COLUMNS, result.last_insert_id())
            .await?
            .ok_or(ApiError::Internal)?;
    Ok(HttpResponse::Created().json(delegation))
}

/// Delete delegation
#[utoipa::path(
    delete,
    path = "/delegations/{id}",
    params(("id" = u64, Path, description = "Delegation ID")),
    responses(
        (status = 204, description = "Delegation removed"),
        (status = 403, description = "Administrator, or the supervisor who delegated"),
        (status = 404, description = "Delegation not found")
    ),
    tag = "Delegations",
    security(("bearer_auth" = []))
)]
pub async fn delete_delegation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require_manager()?;
    let id = path.into_inner();

    let delegation: Delegation = fetch_by_id(pool.get_ref(), "delegations", DELEGATION_COLUMNS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Delegation not found"))?;

    if auth.profile != Profile::Administrator && delegation.delegated_by != auth.employee_id {
        return Err(ApiError::forbidden("Supervisors can only revoke their own delegations"));
    }

    sqlx::query("DELETE FROM delegations WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    cache.delegations.invalidate().await;
    info!(delegation_id = id, by = %auth.username, "Delegation removed");
    Ok(HttpResponse::NoContent().finish())
}
