use crate::{
    api::fetch_by_id,
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::service::{SERVICE_COLUMNS, Service, creates_cycle},
    utils::{
        resource_cache::ResourceCache,
        sql_update::{UpdateBuilder, double_option, execute_update},
        validators::{validate_required, validate_service_code},
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateService {
    #[schema(example = "IT001")]
    pub service_code: String,
    #[schema(example = "Service Informatique")]
    pub service_name: String,
    pub parent_service_id: Option<u64>,
    pub description: Option<String>,
    #[schema(example = "Jean Dupont")]
    pub manager: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateService {
    pub service_code: Option<String>,
    pub service_name: Option<String>,
    /// `null` detaches the service from its parent
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u64>, nullable = true)]
    pub parent_service_id: Option<Option<u64>>,
    pub description: Option<String>,
    pub manager: Option<String>,
}

pub(crate) async fn all_services(pool: &MySqlPool, cache: &ResourceCache) -> ApiResult<Arc<Vec<Service>>> {
    cache
        .services
        .get_or_load(|| async {
            sqlx::query_as::<_, Service>(&format!(
                "SELECT {SERVICE_COLUMNS} FROM services ORDER BY service_name"
            ))
            .fetch_all(pool)
            .await
            .map_err(ApiError::from)
        })
        .await
}

fn validate_manager(manager: Option<&str>) -> ApiResult<()> {
    match manager {
        Some(m) if m.chars().count() > 100 => {
            Err(ApiError::bad_request("manager must have at most 100 characters"))
        }
        _ => Ok(()),
    }
}

/// List services
#[utoipa::path(
    get,
    path = "/services",
    responses(
        (status = 200, description = "All services", body = [Service]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Services",
    security(("bearer_auth" = []))
)]
pub async fn list_services(
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
) -> ApiResult<HttpResponse> {
    let services = all_services(pool.get_ref(), cache.get_ref()).await?;
    Ok(HttpResponse::Ok().json(services.as_slice()))
}

/// Get service by ID
#[utoipa::path(
    get,
    path = "/services/{id}",
    params(("id" = u64, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service found", body = Service),
        (status = 404, description = "Service not found")
    ),
    tag = "Services",
    security(("bearer_auth" = []))
)]
pub async fn get_service(pool: web::Data<MySqlPool>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let service: Service = fetch_by_id(pool.get_ref(), "services", SERVICE_COLUMNS, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    Ok(HttpResponse::Ok().json(service))
}

/// Create service
#[utoipa::path(
    post,
    path = "/services",
    request_body = CreateService,
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 400, description = "Invalid code, name or parent"),
        (status = 403, description = "Administrator or Supervisor only"),
        (status = 409, description = "Service code already used")
    ),
    tag = "Services",
    security(("bearer_auth" = []))
)]
pub async fn create_service(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    payload: web::Json<CreateService>,
) -> ApiResult<HttpResponse> {
    auth.require_manager()?;
    let payload = payload.into_inner();

    let code = payload.service_code.trim();
    validate_service_code(code)?;
    validate_required("service_name", &payload.service_name, 100)?;
    validate_manager(payload.manager.as_deref())?;

    if let Some(parent) = payload.parent_service_id {
        let services = all_services(pool.get_ref(), cache.get_ref()).await?;
        if !services.iter().any(|s| s.id == parent) {
            return Err(ApiError::bad_request("Parent service does not exist"));
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO services (service_code, service_name, parent_service_id, description, manager)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(code)
    .bind(payload.service_name.trim())
    .bind(payload.parent_service_id)
    .bind(&payload.description)
    .bind(&payload.manager)
    .execute(pool.get_ref())
    .await?;

    cache.services.invalidate().await;
    info!(service_code = code, by = %auth.username, "Service created");

    let service: Service = fetch_by_id(pool.get_ref(), "services", SERVICE_COLUMNS, result.last_insert_id())
        .await?
        .ok_or(ApiError::Internal)?;
    Ok(HttpResponse::Created().json(service))
}

/// Update service
#[utoipa::path(
    put,
    path = "/services/{id}",
    params(("id" = u64, Path, description = "Service ID")),
    request_body = UpdateService,
    responses(
        (status = 200, description = "Service updated", body = Service),
        (status = 400, description = "Invalid field, unknown parent or cycle"),
        (status = 404, description = "Service not found")
    ),
    tag = "Services",
    security(("bearer_auth" = []))
)]
pub async fn update_service(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
    payload: web::Json<UpdateService>,
) -> ApiResult<HttpResponse> {
    auth.require_manager()?;
    let id = path.into_inner();
    let payload = payload.into_inner();

    fetch_by_id::<Service>(pool.get_ref(), "services", SERVICE_COLUMNS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;

    let code = payload.service_code.as_deref().map(str::trim);
    if let Some(code) = code {
        validate_service_code(code)?;
    }
    if let Some(name) = &payload.service_name {
        validate_required("service_name", name, 100)?;
    }
    validate_manager(payload.manager.as_deref())?;

    if let Some(Some(parent)) = payload.parent_service_id {
        let services = all_services(pool.get_ref(), cache.get_ref()).await?;
        if !services.iter().any(|s| s.id == parent) {
            return Err(ApiError::bad_request("Parent service does not exist"));
        }
        if creates_cycle(&services, id, parent) {
            return Err(ApiError::bad_request("A service cannot be placed under itself or one of its sub-services"));
        }
    }

    let mut builder = UpdateBuilder::new("services")
        .set_opt("service_code", code)
        .set_opt("service_name", payload.service_name.as_deref().map(str::trim))
        .set_opt("description", payload.description)
        .set_opt("manager", payload.manager);
    if let Some(parent) = payload.parent_service_id {
        builder = builder.set("parent_service_id", parent);
    }

    let update = builder
        .build(id)
        .ok_or_else(|| ApiError::bad_request("No fields provided for update"))?;
    execute_update(pool.get_ref(), update).await?;
    cache.services.invalidate().await;

    let service: Service = fetch_by_id(pool.get_ref(), "services", SERVICE_COLUMNS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    Ok(HttpResponse::Ok().json(service))
}

/// Delete service
#[utoipa::path(
    delete,
    path = "/services/{id}",
    params(("id" = u64, Path, description = "Service ID")),
    responses(
        (status = 204, description = "Service deleted"),
        (status = 403, description = "Administrator only"),
        (status = 404, description = "Service not found"),
        (status = 409, description = "Service still has sub-services or employees")
    ),
    tag = "Services",
    security(("bearer_auth" = []))
)]
pub async fn delete_service(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Service not found"));
    }

    cache.services.invalidate().await;
    info!(service_id = id, by = %auth.username, "Service deleted");
    Ok(HttpResponse::NoContent().finish())
}
