use crate::{
    api::requests::all_requests,
    approval::authority::Authority,
    auth::auth::AuthUser,
    error::ApiResult,
    report::aggregator::{Dashboard, dashboard as build_dashboard},
    utils::resource_cache::ResourceCache,
};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::MySqlPool;

/// Personal dashboard
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Caller's request counts and validation queue size", body = Dashboard)),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<ResourceCache>,
) -> ApiResult<HttpResponse> {
    let authority = Authority::load(pool.get_ref(), &auth, Utc::now().date_naive()).await?;
    let requests = all_requests(pool.get_ref(), cache.get_ref()).await?;
    Ok(HttpResponse::Ok().json(build_dashboard(&requests, &authority)))
}
