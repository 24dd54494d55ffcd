use crate::{
    api::{fetch_by_id, services::all_services},
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::employee::{ContractType, EMPLOYEE_COLUMNS, Employee},
    utils::{
        resource_cache::ResourceCache,
        sql_update::{UpdateBuilder, execute_update},
        validators::{validate_employee_number, validate_required},
    },
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP001")]
    pub employee_number: String,
    #[schema(example = "Martin")]
    pub last_name: String,
    #[schema(example = "Marie")]
    pub first_name: String,
    #[schema(example = 2)]
    pub service_id: u64,
    #[serde(default)]
    pub contract_type: ContractType,
    #[schema(example = "marie.martin@ghs.com")]
    pub contact: Option<String>,
    pub position: Option<String>,
    #[schema(example = "1985-05-15", format = "date", value_type = Option<String>)]
    pub birthdate: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub employee_number: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub service_id: Option<u64>,
    pub contract_type: Option<ContractType>,
    pub contact: Option<String>,
    pub position: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub birthdate: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Only employees of this service
    pub service_id: Option<u64>,
    /// Only active (`true`) or inactive (`false`) employees
    pub active: Option<bool>,
}

pub(crate) async fn all_employees(pool: &MySqlPool, cache: &ResourceCache) -> ApiResult<Arc<Vec<Employee>>> {
    cache
        .employees
        .get_or_load(|| async {
            sqlx::query_as::<_, Employee>(&format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY last_name, first_name"
            ))
            .fetch_all(pool)
            .await
            .map_err(ApiError::from)
        })
        .await
}

async fn ensure_service_exists(pool: &MySqlPool, cache: &ResourceCache, service_id: u64) -> ApiResult<()> {
    let services = all_services(pool, cache).await?;
    if services.iter().any(|s| s.id == service_id) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Service does not exist"))
    }
}

/// List employees
#[utoipa::path(
    get,
    path = "/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employees", body = [Employee]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    query: web::Query<EmployeeQuery>,
) -> ApiResult<HttpResponse> {
    let employees = all_employees(pool.get_ref(), cache.get_ref()).await?;

    let filtered: Vec<&Employee> = employees
        .iter()
        .filter(|e| query.service_id.is_none_or(|s| e.service_id == s))
        .filter(|e| query.active.is_none_or(|a| e.is_active == a))
        .collect();

    Ok(HttpResponse::Ok().json(filtered))
}

/// Get employee by ID
#[utoipa::path(
    get,
    path = "/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(pool: web::Data<MySqlPool>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let employee: Employee = fetch_by_id(pool.get_ref(), "employees", EMPLOYEE_COLUMNS, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Create employee
#[utoipa::path(
    post,
    path = "/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid field or unknown service"),
        (status = 403, description = "Administrator or Supervisor only"),
        (status = 409, description = "Employee number already used")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult<HttpResponse> {
    auth.require_manager()?;
    let payload = payload.into_inner();

    let number = payload.employee_number.trim();
    validate_employee_number(number)?;
    validate_required("last_name", &payload.last_name, 50)?;
    validate_required("first_name", &payload.first_name, 50)?;
    ensure_service_exists(pool.get_ref(), cache.get_ref(), payload.service_id).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO employees
            (employee_number, last_name, first_name, service_id, contract_type,
             contact, position, birthdate, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(number)
    .bind(payload.last_name.trim())
    .bind(payload.first_name.trim())
    .bind(payload.service_id)
    .bind(payload.contract_type.as_ref())
    .bind(&payload.contact)
    .bind(&payload.position)
    .bind(payload.birthdate)
    .bind(payload.is_active.unwrap_or(true))
    .execute(pool.get_ref())
    .await?;

    cache.employees.invalidate().await;
    info!(employee_number = number, by = %auth.username, "Employee created");

    let employee: Employee =
        fetch_by_id(pool.get_ref(), "employees", EMPLOYEE_COLUMNS, result.last_insert_id())
            .await?
            .ok_or(ApiError::Internal)?;
    Ok(HttpResponse::Created().json(employee))
}

/// Update employee
#[utoipa::path(
    put,
    path = "/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid field or unknown service"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> ApiResult<HttpResponse> {
    auth.require_manager()?;
    let id = path.into_inner();
    let payload = payload.into_inner();

    fetch_by_id::<Employee>(pool.get_ref(), "employees", EMPLOYEE_COLUMNS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let number = payload.employee_number.as_deref().map(str::trim);
    if let Some(number) = number {
        validate_employee_number(number)?;
    }
    if let Some(last_name) = &payload.last_name {
        validate_required("last_name", last_name, 50)?;
    }
    if let Some(first_name) = &payload.first_name {
        validate_required("first_name", first_name, 50)?;
    }
    if let Some(service_id) = payload.service_id {
        ensure_service_exists(pool.get_ref(), cache.get_ref(), service_id).await?;
    }

    let update = UpdateBuilder::new("employees")
        .set_opt("employee_number", number)
        .set_opt("last_name", payload.last_name.as_deref().map(str::trim))
        .set_opt("first_name", payload.first_name.as_deref().map(str::trim))
        .set_opt("service_id", payload.service_id)
        .set_opt("contract_type", payload.contract_type.map(|c| c.as_ref().to_string()))
        .set_opt("contact", payload.contact)
        .set_opt("position", payload.position)
        .set_opt("birthdate", payload.birthdate)
        .set_opt("is_active", payload.is_active)
        .build(id)
        .ok_or_else(|| ApiError::bad_request("No fields provided for update"))?;

    execute_update(pool.get_ref(), update).await?;
    cache.employees.invalidate().await;

    let employee: Employee = fetch_by_id(pool.get_ref(), "employees", EMPLOYEE_COLUMNS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Delete employee
#[utoipa::path(
    delete,
    path = "/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 403, description = "Administrator only"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee still referenced by an account, request or delegation")
    ),
    tag = "Employees",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    cache.employees.invalidate().await;
    info!(employee_id = id, by = %auth.username, "Employee deleted");
    Ok(HttpResponse::NoContent().finish())
}
