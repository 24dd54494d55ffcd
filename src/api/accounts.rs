use crate::{
    api::fetch_by_id,
    auth::{auth::AuthUser, password::hash_password},
    error::{ApiError, ApiResult},
    model::{
        account::{ACCOUNT_COLUMNS, Account},
        employee::{EMPLOYEE_COLUMNS, Employee},
        profile::Profile,
    },
    utils::{
        sql_update::{UpdateBuilder, execute_update},
        username_index::UsernameIndex,
        validators::validate_required,
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAccount {
    #[schema(example = 3)]
    pub employee_id: u64,
    #[schema(example = "mmartin")]
    pub username: String,
    #[schema(example = "changeme", format = "password")]
    pub password: String,
    #[serde(default)]
    pub profile: Profile,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAccount {
    pub username: Option<String>,
    #[schema(format = "password")]
    pub password: Option<String>,
    pub profile: Option<Profile>,
    pub is_active: Option<bool>,
}

fn hash(password: &str) -> ApiResult<String> {
    hash_password(password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::Internal
    })
}

async fn ensure_username_free(
    pool: &MySqlPool,
    index: &UsernameIndex,
    username: &str,
) -> ApiResult<()> {
    if index.is_taken(pool, username).await? {
        return Err(ApiError::conflict("Username already taken"));
    }
    Ok(())
}

/// List accounts
#[utoipa::path(
    get,
    path = "/accounts",
    responses(
        (status = 200, description = "All accounts", body = [Account]),
        (status = 403, description = "Administrator only")
    ),
    tag = "Accounts",
    security(("bearer_auth" = []))
)]
pub async fn list_accounts(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    auth.require_admin()?;

    let accounts = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY username"
    ))
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(accounts))
}

/// Get account by ID
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    params(("id" = u64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account found", body = Account),
        (status = 403, description = "Administrator only"),
        (status = 404, description = "Account not found")
    ),
    tag = "Accounts",
    security(("bearer_auth" = []))
)]
pub async fn get_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;

    let account: Account = fetch_by_id(pool.get_ref(), "accounts", ACCOUNT_COLUMNS, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    Ok(HttpResponse::Ok().json(account))
}

/// Create account
#[utoipa::path(
    post,
    path = "/accounts",
    request_body = CreateAccount,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid field or unknown employee"),
        (status = 403, description = "Administrator only"),
        (status = 409, description = "Username taken or employee already has an account")
    ),
    tag = "Accounts",
    security(("bearer_auth" = []))
)]
pub async fn create_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    index: web::Data<UsernameIndex>,
    payload: web::Json<CreateAccount>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let payload = payload.into_inner();

    let username = payload.username.trim();
    validate_required("username", username, 50)?;
    validate_required("password", &payload.password, 255)?;

    fetch_by_id::<Employee>(pool.get_ref(), "employees", EMPLOYEE_COLUMNS, payload.employee_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Employee does not exist"))?;

    ensure_username_free(pool.get_ref(), index.get_ref(), username).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO accounts (employee_id, username, password, profile, is_active)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(username)
    .bind(hash(&payload.password)?)
    .bind(payload.profile.as_ref())
    .bind(payload.is_active.unwrap_or(true))
    .execute(pool.get_ref())
    .await?;

    index.mark_taken(username).await;
    info!(username, profile = %payload.profile, by = %auth.username, "Account created");

    let account: Account = fetch_by_id(pool.get_ref(), "accounts", ACCOUNT_COLUMNS, result.last_insert_id())
        .await?
        .ok_or(ApiError::Internal)?;
    Ok(HttpResponse::Created().json(account))
}

/// Update account
///
/// A new password is hashed before storage. Revoking access is done through
/// `is_active`; accounts are never deleted.
#[utoipa::path(
    put,
    path = "/accounts/{id}",
    params(("id" = u64, Path, description = "Account ID")),
    request_body = UpdateAccount,
    responses(
        (status = 200, description = "Account updated", body = Account),
        (status = 403, description = "Administrator only"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Username taken")
    ),
    tag = "Accounts",
    security(("bearer_auth" = []))
)]
pub async fn update_account(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    index: web::Data<UsernameIndex>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAccount>,
) -> ApiResult<HttpResponse> {
    auth.require_admin()?;
    let id = path.into_inner();
    let payload = payload.into_inner();

    let current: Account = fetch_by_id(pool.get_ref(), "accounts", ACCOUNT_COLUMNS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;

    // a case-only rename keeps the same name
    let rename = payload
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.eq_ignore_ascii_case(&current.username));

    if let Some(username) = rename {
        validate_required("username", username, 50)?;
        ensure_username_free(pool.get_ref(), index.get_ref(), username).await?;
    }

    let password = match payload.password.as_deref() {
        Some(p) => {
            validate_required("password", p, 255)?;
            Some(hash(p)?)
        }
        None => None,
    };

    if id == auth.account_id && payload.is_active == Some(false) {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    let update = UpdateBuilder::new("accounts")
        .set_opt("username", payload.username.as_deref().map(str::trim))
        .set_opt("password", password)
        .set_opt("profile", payload.profile.map(|p| p.as_ref().to_string()))
        .set_opt("is_active", payload.is_active)
        .build(id)
        .ok_or_else(|| ApiError::bad_request("No fields provided for update"))?;

    execute_update(pool.get_ref(), update).await?;

    if let Some(username) = rename {
        index.release(&current.username).await;
        index.mark_taken(username).await;
    }
    info!(account_id = id, by = %auth.username, "Account updated");

    let account: Account = fetch_by_id(pool.get_ref(), "accounts", ACCOUNT_COLUMNS, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))?;
    Ok(HttpResponse::Ok().json(account))
}
