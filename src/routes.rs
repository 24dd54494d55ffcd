use crate::{
    api::{
        accounts, dashboard, delegations, employees, health, reports, requests, services, workflows,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::rejected_input,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, UrlencodedError},
    middleware::from_fn,
    web,
};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let burst = requests_per_min.max(1);
    let per_ms = 60_000 / burst as u64;
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit: {requests_per_min}/min"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

/// Per-route limiters, built once so every worker shares the same quotas.
#[derive(Clone)]
pub struct RateLimiters {
    login: Limiter,
    refresh: Limiter,
    protected: Limiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            refresh: build_limiter(config.rate_refresh_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    let prefix = config.api_prefix.as_str();

    // extractor rejections use the same JSON body as handler errors
    cfg.app_data(web::JsonConfig::default().error_handler(rejected_input::<JsonPayloadError>))
        .app_data(web::QueryConfig::default().error_handler(rejected_input::<QueryPayloadError>))
        .app_data(web::PathConfig::default().error_handler(rejected_input::<PathError>))
        .app_data(web::FormConfig::default().error_handler(rejected_input::<UrlencodedError>));

    cfg.service(web::resource("/health").route(web::get().to(health::health)));

    // Public routes; /auth/me authenticates through its extractor
    cfg.service(
        web::scope(&format!("{prefix}/auth"))
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(limiters.refresh.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(limiters.protected.clone())
                    .route(web::get().to(handlers::me)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(limiters.protected.clone())
            .service(web::resource("/dashboard").route(web::get().to(dashboard::dashboard)))
            .service(
                web::scope("/services")
                    .service(
                        web::resource("")
                            .route(web::get().to(services::list_services))
                            .route(web::post().to(services::create_service)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(services::get_service))
                            .route(web::put().to(services::update_service))
                            .route(web::delete().to(services::delete_service)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::get().to(employees::list_employees))
                            .route(web::post().to(employees::create_employee)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employees::get_employee))
                            .route(web::put().to(employees::update_employee))
                            .route(web::delete().to(employees::delete_employee)),
                    ),
            )
            .service(
                web::scope("/accounts")
                    .service(
                        web::resource("")
                            .route(web::get().to(accounts::list_accounts))
                            .route(web::post().to(accounts::create_account)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(accounts::get_account))
                            .route(web::put().to(accounts::update_account)),
                    ),
            )
            .service(
                web::scope("/requests")
                    .service(
                        web::resource("")
                            .route(web::get().to(requests::list_requests))
                            .route(web::post().to(requests::create_request)),
                    )
                    // before /{id}
                    .service(web::resource("/my-requests").route(web::get().to(requests::my_requests)))
                    .service(web::resource("/pending").route(web::get().to(requests::pending_requests)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(requests::get_request))
                            .route(web::put().to(requests::update_request))
                            .route(web::delete().to(requests::delete_request)),
                    )
                    .service(web::resource("/{id}/submit").route(web::post().to(requests::submit_request)))
                    .service(
                        web::resource("/{id}/approve/{level}")
                            .route(web::post().to(requests::approve_request)),
                    )
                    .service(
                        web::resource("/{id}/follow-up").route(web::post().to(requests::follow_up_request)),
                    )
                    .service(web::resource("/{id}/reject").route(web::post().to(requests::reject_request)))
                    .service(web::resource("/{id}/cancel").route(web::post().to(requests::cancel_request)))
                    .service(
                        web::resource("/{id}/workflows").route(web::get().to(requests::request_workflows)),
                    ),
            )
            .service(
                web::scope("/delegations")
                    .service(
                        web::resource("")
                            .route(web::get().to(delegations::list_delegations))
                            .route(web::post().to(delegations::create_delegation)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(delegations::delete_delegation)),
                    ),
            )
            .service(
                web::scope("/workflows").service(
                    web::resource("")
                        .route(web::get().to(workflows::list_workflows))
                        .route(web::post().to(workflows::create_workflow)),
                ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("/summary").route(web::get().to(reports::summary)))
                    .service(web::resource("/export").route(web::get().to(reports::export))),
            ),
    );
}

// LOGIN (form)
//  ├─ access_token (ACCESS_TOKEN_TTL, 30 min)
//  └─ refresh_token (REFRESH_TOKEN_TTL, 7 days, stored by jti)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /auth/refresh with Bearer refresh_token
//       └─ old refresh token revoked, new pair returned
