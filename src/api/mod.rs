pub mod accounts;
pub mod dashboard;
pub mod delegations;
pub mod employees;
pub mod health;
pub mod reports;
pub mod requests;
pub mod services;
pub mod workflows;

use crate::error::ApiResult;
use sqlx::mysql::MySqlRow;
use sqlx::{FromRow, MySqlPool};

/// `SELECT <columns> FROM <table> WHERE id = ?`
pub(crate) async fn fetch_by_id<T>(
    pool: &MySqlPool,
    table: &str,
    columns: &str,
    id: u64,
) -> ApiResult<Option<T>>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let row = sqlx::query_as::<_, T>(&format!("SELECT {columns} FROM {table} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
