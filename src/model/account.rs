use super::profile::Profile;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account as exposed over the API; the password hash never leaves the
/// database layer.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": 1,
        "username": "admin",
        "profile": "Administrator",
        "is_active": true,
        "last_login_at": "2026-01-02T09:15:00",
        "created_at": "2026-01-01T08:00:00",
        "updated_at": "2026-01-01T08:00:00"
    })
)]
pub struct Account {
    pub id: u64,
    pub employee_id: u64,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub profile: Profile,
    pub is_active: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_login_at: Option<NaiveDateTime>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

pub const ACCOUNT_COLUMNS: &str =
    "id, employee_id, username, profile, is_active, last_login_at, created_at, updated_at";

/// Row used by the login path only.
#[derive(sqlx::FromRow)]
pub struct AccountCredentials {
    pub id: u64,
    pub employee_id: u64,
    pub username: String,
    pub password: String,
    #[sqlx(try_from = "String")]
    pub profile: Profile,
    pub is_active: bool,
}
