use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use ghs::bootstrap::initialize_admin;
use ghs::config::Config;
use ghs::db::init_db;
use ghs::docs::ApiDoc;
use ghs::routes::{self, RateLimiters};
use ghs::utils::resource_cache::ResourceCache;
use ghs::utils::username_index::{UsernameIndex, WARMUP_BATCH_SIZE};
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        return Cors::permissive();
    }
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "ghs.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(addr = %config.server_addr, prefix = %config.api_prefix, "Server starting...");

    let pool = init_db(&config).await?;
    initialize_admin(&pool, &config).await?;

    let limiters = RateLimiters::from_config(&config)?;
    let cache = Data::new(ResourceCache::new());
    let usernames = Data::new(UsernameIndex::new());

    let warmup_pool = pool.clone();
    let warmup_index = usernames.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warmup_index.warmup(&warmup_pool, WARMUP_BATCH_SIZE).await {
            error!(error = %e, "Failed to warm up username index");
        }
    });

    let server_addr = config.server_addr.clone();
    let pool = Data::new(pool);
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(cors(&config.cors_origins))
            .service(
                // wildcard so the JS/CSS assets match
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(cache.clone())
            .app_data(usernames.clone())
            .configure(|cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
