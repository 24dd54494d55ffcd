use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Delegation {
    pub id: u64,
    /// Employee handing over their validation authority
    pub delegated_by: u64,
    /// Employee receiving it
    pub delegated_to: u64,
    #[schema(value_type = String, format = "date")]
    pub start_at: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_at: NaiveDate,
}

impl Delegation {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_at <= day && day <= self.end_at
    }
}

pub const DELEGATION_COLUMNS: &str = "id, delegated_by, delegated_to, start_at, end_at";
