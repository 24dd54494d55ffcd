use crate::db::ping;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct Health {
    #[schema(example = "healthy")]
    pub status: &'static str,
    pub database: bool,
    #[schema(example = "2026-01-01T08:00:00Z")]
    pub timestamp: String,
    #[schema(example = "1.0.0")]
    pub version: &'static str,
}

/// Liveness and database check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = Health),
        (status = 503, description = "Database unreachable", body = Health)
    ),
    tag = "Health"
)]
pub async fn health(pool: web::Data<MySqlPool>) -> HttpResponse {
    let database = ping(pool.get_ref()).await;
    let body = Health {
        status: if database { "healthy" } else { "degraded" },
        database,
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    };

    if database {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
