//! hearth-api - HTTP API server for the hearth photo library

mod auth;
mod bootstrap;
mod error;
mod handlers;
mod maintenance;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use hearth_core::{defaults::SESSION_PURGE_INTERVAL_SECS, AdminBootstrap, AppConfig, StorageConfig};
use hearth_db::{Database, PgSessionRepository};
use hearth_jobs::{
    Mailer, NewPhotoEmailHandler, PasswordResetEmailHandler, VerificationEmailHandler,
    WorkerBuilder, WorkerConfig,
};
use hearth_store::{FilesystemBackend, ProbeCache, S3Backend, S3Config, StorageBackend};

use handlers::{
    albums::{
        add_photo_to_album, album_photos, create_album, delete_album, get_album, list_albums,
        remove_photo_from_album, update_album,
    },
    auth::{
        login, logout, me, register, request_password_reset, reset_password, verify_email,
    },
    photos::{
        delete_photo, get_photo, get_photo_image, set_photo_tags, update_photo, upload_photo,
    },
    tags::list_tags,
    users::{list_users, set_user_role},
};

/// How long a storage availability probe result is reused.
const PROBE_CACHE_TTL: Duration = Duration::from_secs(30);

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation when chasing a report like "the gallery jumped to the
/// top again".
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Global rate limiter for login attempts (direct quota, no keyed
/// bucketing; this is a small family server).
type LoginRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub storage: Arc<dyn StorageBackend>,
    /// Cached availability of the storage backend.
    pub storage_status: Arc<ProbeCache>,
    /// Login rate limiter (None if disabled).
    pub login_limiter: Option<Arc<LoginRateLimiter>>,
    /// Public base URL, used in email links.
    pub public_url: String,
}

/// Parse allowed origins from the comma-separated `ALLOWED_ORIGINS`
/// environment variable. Defaults to the public URL plus localhost.
fn parse_allowed_origins(public_url: &str) -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| format!("{},http://localhost:3000", public_url));

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

fn init_logging() {
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hearth_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        let mut layer = tracing_subscriber::fmt::layer();
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
    }
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = sqlx::query("SELECT 1").execute(&state.db.pool).await.is_ok();
    let storage_ok = state.storage_status.check(state.storage.as_ref()).await;
    health_body(database_ok, storage_ok)
}

/// Health payload and status code. Without the database nothing works,
/// so that alone makes the report 503; a missing object store only
/// degrades uploads and image serving.
fn health_body(database_ok: bool, storage_ok: bool) -> (StatusCode, Json<serde_json::Value>) {
    let status = match (database_ok, storage_ok) {
        (true, true) => "ok",
        (true, false) => "degraded",
        (false, _) => "unavailable",
    };
    let code = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(serde_json::json!({
            "status": status,
            "version": env!("CARGO_PKG_VERSION"),
            "database": database_ok,
            "storage": storage_ok,
        })),
    )
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;

    // Connect to database and run pending migrations
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    info!("Database connected, migrations complete");

    // Seed or promote the initial admin when ADMIN_* is configured
    if let Some(admin) = AdminBootstrap::from_env()? {
        bootstrap::ensure_admin(&db.users, &admin).await?;
    }

    // Expired-session sweeper
    tokio::spawn(maintenance::purge_sessions_periodically(
        Arc::new(PgSessionRepository::new(db.pool.clone())),
        Duration::from_secs(SESSION_PURGE_INTERVAL_SECS),
    ));

    // Initialize storage backend
    let storage: Arc<dyn StorageBackend> = match &config.storage {
        StorageConfig::Filesystem { base_path } => {
            let backend = FilesystemBackend::new(base_path);
            backend
                .validate()
                .await
                .map_err(|e| anyhow::anyhow!("storage validation failed: {}", e))?;
            info!(storage_backend = "filesystem", path = %base_path, "Storage initialized");
            Arc::new(backend)
        }
        StorageConfig::S3 {
            endpoint,
            region,
            bucket,
            access_key,
            secret_key,
        } => {
            let backend = S3Backend::new(S3Config {
                endpoint: endpoint.clone(),
                region: region.clone(),
                bucket: bucket.clone(),
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
            });
            if backend.probe().await {
                info!(storage_backend = "s3", bucket = %bucket, "Storage initialized");
            } else {
                // Listings degrade gracefully; uploads will fail until the
                // store comes back.
                warn!(
                    storage_backend = "s3",
                    bucket = %bucket,
                    "Object store unreachable at startup"
                );
            }
            Arc::new(backend)
        }
    };

    // Start the job worker if email delivery is configured
    let _worker_handle = match &config.smtp {
        Some(smtp) => {
            let mailer = Mailer::new(smtp)?;
            let worker = WorkerBuilder::new(db.clone())
                .with_config(WorkerConfig::from_env())
                .with_handler(VerificationEmailHandler::new(
                    mailer.clone(),
                    config.public_url.clone(),
                ))
                .with_handler(PasswordResetEmailHandler::new(
                    mailer.clone(),
                    config.public_url.clone(),
                ))
                .with_handler(NewPhotoEmailHandler::new(
                    db.clone(),
                    mailer,
                    config.public_url.clone(),
                ))
                .build();
            info!("Job worker started");
            Some(worker.start())
        }
        None => {
            warn!("SMTP not configured; email jobs will not be processed");
            None
        }
    };

    // Login rate limiter
    // LOGIN_RATE_LIMIT: attempts per minute (default: 10, 0 disables)
    let login_rate: u32 = std::env::var("LOGIN_RATE_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    let login_limiter = NonZeroU32::new(login_rate).map(|rate| {
        Arc::new(RateLimiter::direct(Quota::per_minute(rate)))
    });
    info!(
        login_rate_limit = login_rate,
        "Login rate limiting {}",
        if login_limiter.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );

    let state = AppState {
        db,
        storage,
        storage_status: Arc::new(ProbeCache::new(PROBE_CACHE_TTL)),
        login_limiter,
        public_url: config.public_url.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(parse_allowed_origins(&config.public_url))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/auth/verify", post(verify_email))
        .route("/api/auth/request-reset", post(request_password_reset))
        .route("/api/auth/reset", post(reset_password))
        // Albums
        .route("/api/albums", get(list_albums).post(create_album))
        .route(
            "/api/albums/:id",
            get(get_album).patch(update_album).delete(delete_album),
        )
        .route("/api/albums/:id/photos", get(album_photos))
        .route(
            "/api/albums/:id/photos/:photo_id",
            post(add_photo_to_album).delete(remove_photo_from_album),
        )
        // Photos
        .route("/api/photos", post(upload_photo))
        .route(
            "/api/photos/:id",
            get(get_photo).patch(update_photo).delete(delete_photo),
        )
        .route("/api/photos/:id/image", get(get_photo_image))
        .route("/api/photos/:id/tags", put(set_photo_tags))
        // Tags
        .route("/api/tags", get(list_tags))
        // Admin
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/:id/role", put(set_user_role))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .with_state(state);

    info!(bind_addr = %config.bind_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
