use crate::{
    auth::{
        auth::AuthUser,
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::{ApiError, ApiResult},
    model::account::{ACCOUNT_COLUMNS, Account, AccountCredentials},
    models::{Claims, LoginForm, LoginResponse, SessionUser, TokenPair, TokenType},
};
use actix_web::{HttpRequest, HttpResponse, web};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn token_error(e: jsonwebtoken::errors::Error) -> ApiError {
    error!(error = %e, "Failed to sign token");
    ApiError::Internal
}

async fn store_refresh_token(pool: &MySqlPool, claims: &Claims) -> ApiResult<()> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (account_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(claims.account_id)
    .bind(&claims.jti)
    .bind(claims.exp as i64)
    .execute(pool)
    .await?;
    Ok(())
}

/// Password login (form-encoded, OAuth2 password style)
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials or inactive account")
    ),
    tag = "Authentication"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, form),
    fields(username = %form.username)
)]
pub async fn login(
    form: web::Form<LoginForm>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    info!("Login request received");

    if form.username.trim().is_empty() || form.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(ApiError::bad_request("Username or password required"));
    }

    debug!("Fetching account from database");

    let account = sqlx::query_as::<_, AccountCredentials>(
        r#"
        SELECT id, employee_id, username, password, profile, is_active
        FROM accounts
        WHERE username = ?
        "#,
    )
    .bind(form.username.trim())
    .fetch_optional(pool.get_ref())
    .await?;

    let account = match account {
        Some(a) => a,
        None => {
            info!("Invalid credentials: account not found");
            return Err(ApiError::unauthorized("Invalid username or password"));
        }
    };

    if let Err(e) = verify_password(&form.password, &account.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    if !account.is_active {
        info!(account_id = account.id, "Login refused: inactive account");
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let subject = TokenSubject {
        account_id: account.id,
        username: account.username.clone(),
        profile: account.profile,
        employee_id: account.employee_id,
    };

    let access_token =
        generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl).map_err(token_error)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl).map_err(token_error)?;

    debug!(account_id = account.id, jti = %refresh_claims.jti, "Storing refresh token");
    store_refresh_token(pool.get_ref(), &refresh_claims).await?;

    // non-fatal
    if let Err(e) = sqlx::query("UPDATE accounts SET last_login_at = UTC_TIMESTAMP() WHERE id = ?")
        .bind(account.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: config.access_token_ttl,
        refresh_token,
        user: SessionUser {
            id: account.id,
            username: account.username,
            profile: account.profile,
            employee_id: account.employee_id,
        },
    }))
}

/// Current account
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current account", body = Account),
        (status = 401, description = "Missing, invalid or expired token, or inactive account")
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
    ))
    .bind(auth.account_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

    if !account.is_active {
        return Err(ApiError::unauthorized("Inactive account"));
    }

    Ok(HttpResponse::Ok().json(account))
}

/// Rotates a refresh token: the presented one is revoked and a new pair issued.
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let token = bearer_token(&req).ok_or_else(|| ApiError::unauthorized("No token"))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::unauthorized("Refresh token required"));
    }

    // revoke only if still live; zero rows means unknown or already used
    let revoked = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE",
    )
    .bind(&claims.jti)
    .execute(pool.get_ref())
    .await?;

    if revoked.rows_affected() == 0 {
        return Err(ApiError::unauthorized("Refresh token revoked"));
    }

    // profile or activation may have changed since the token was issued
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
    ))
    .bind(claims.account_id)
    .fetch_optional(pool.get_ref())
    .await?
    .filter(|a| a.is_active)
    .ok_or_else(|| ApiError::unauthorized("Inactive account"))?;

    let subject = TokenSubject {
        profile: account.profile,
        ..TokenSubject::from(&claims)
    };

    let (new_refresh_token, new_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl).map_err(token_error)?;
    store_refresh_token(pool.get_ref(), &new_claims).await?;

    let access_token =
        generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl).map_err(token_error)?;

    Ok(HttpResponse::Ok().json(TokenPair {
        access_token,
        refresh_token: new_refresh_token,
    }))
}

/// Revokes the presented refresh token. Always 204.
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}
