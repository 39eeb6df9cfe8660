use actix_cors::Cors;
use actix_web::{App, HttpServer};
use chirp_service::config::StorageBackend;
use chirp_service::repository::{ChirpRepository, InMemoryChirpRepository, PgChirpRepository};
use chirp_service::AppState;
use db_pool::{create_pool, DbConfig};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn healthcheck() -> io::Result<()> {
    let port = std::env::var("CHIRP_PORT").unwrap_or_else(|_| "8090".to_string());
    let url = format!("http://127.0.0.1:{}/api/v1/health", port);
    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

async fn open_repository(
    backend: StorageBackend,
    run_migrations: bool,
) -> anyhow::Result<Arc<dyn ChirpRepository>> {
    match backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(InMemoryChirpRepository::new()))
        }
        StorageBackend::Postgres => {
            let db_cfg = DbConfig::from_env("chirp-service");
            db_cfg.log_config();
            let pool = create_pool(db_cfg).await?;

            if run_migrations {
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Database migrations applied");
            }
            Ok(Arc::new(PgChirpRepository::new(pool)))
        }
    }
}

/// Chirp Service
///
/// # Routes
///
/// - `/api/v1/cheeps/*` - public timeline, posting, cheep detail and comments
/// - `/api/v1/timeline` - the viewer's private timeline
/// - `/api/v1/authors/*` - registration, profiles, follow graph
/// - `/api/v1/me/*` - own profile, image, data export, forget me
/// - `/api/v1/health*`, `/metrics`
#[actix_web::main]
async fn main() -> io::Result<()> {
    // Container healthcheck: `chirp-service healthcheck`
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return healthcheck().await;
    }

    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match chirp_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting chirp-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(env = %config.app.env, storage = ?config.storage.backend, "Configuration loaded");

    let repo = open_repository(config.storage.backend, config.storage.run_migrations)
        .await
        .map_err(|e| {
            tracing::error!("Storage initialization failed: {:#}", e);
            io::Error::new(io::ErrorKind::Other, format!("storage init failed: {e}"))
        })?;

    let storage_name = match config.storage.backend {
        StorageBackend::Postgres => "postgres",
        StorageBackend::Memory => "memory",
    };
    let state = AppState::new(
        repo,
        storage_name,
        config.timeline.page_size,
        &config.auth.jwt_secret,
    );

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("HTTP server listening on {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let state = state.clone();
        App::new()
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .run()
    .await?;

    tracing::info!("chirp-service shut down");
    Ok(())
}
