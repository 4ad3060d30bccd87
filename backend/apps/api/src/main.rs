//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use account::application::AccountConfig;
use account::domain::repository::{RefreshTokenStore, UserRepository};
use account::domain::value_object::{
    email::Email, user_name::UserName, user_password::RawPassword,
};
use account::{
    AccountAppState, InMemoryAccountRepository, LocalImageStore, PgAccountRepository,
    account_router,
};
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,account=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(load_config()?);
    tracing::info!(
        access_ttl_secs = config.access_token_ttl.num_seconds(),
        refresh_ttl_secs = config.refresh_token_ttl.num_seconds(),
        upload_dir = %config.upload_dir.display(),
        "Account configuration loaded"
    );

    let images = Arc::new(LocalImageStore::new(config.upload_dir.clone()));

    // Without DATABASE_URL everything lives in memory
    let account = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            build_account(Arc::new(PgAccountRepository::new(pool)), images, config).await?
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            build_account(Arc::new(InMemoryAccountRepository::new()), images, config).await?
        }
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .merge(account)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Account configuration from the environment. Debug builds fall back to a
/// random signing key; release builds require `JWT_SECRET` (base64).
fn load_config() -> anyhow::Result<AccountConfig> {
    let mut config = match env::var("JWT_SECRET") {
        Ok(secret_b64) => AccountConfig {
            jwt_secret: general_purpose::STANDARD.decode(secret_b64.trim())?,
            ..AccountConfig::default()
        },
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("JWT_SECRET not set, using a random development key");
            AccountConfig::development()
        }
        Err(_) => anyhow::bail!("JWT_SECRET must be set in production"),
    };

    if let Some(ttl) = env_ttl("JWT_ACCESS_TTL_SECS")? {
        config.access_token_ttl = ttl;
    }
    if let Some(ttl) = env_ttl("JWT_REFRESH_TTL_SECS")? {
        config.refresh_token_ttl = ttl;
    }
    if let Ok(pepper) = env::var("PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }
    if let Ok(dir) = env::var("UPLOAD_DIR") {
        config.upload_dir = PathBuf::from(dir);
    }

    config.validate()?;
    Ok(config)
}

fn env_ttl(key: &str) -> anyhow::Result<Option<chrono::Duration>> {
    let Ok(value) = env::var(key) else {
        return Ok(None);
    };
    let secs: i64 = value.trim().parse()?;
    chrono::Duration::try_seconds(secs)
        .map(Some)
        .ok_or_else(|| anyhow::anyhow!("{key} is out of range: {secs}"))
}

async fn build_account<R>(
    repo: Arc<R>,
    images: Arc<LocalImageStore>,
    config: Arc<AccountConfig>,
) -> anyhow::Result<Router>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
{
    let state = AccountAppState::new(repo, images, config);

    if let (Ok(email), Ok(password)) = (
        env::var("SEED_ADMIN_EMAIL"),
        env::var("SEED_ADMIN_PASSWORD"),
    ) {
        let created = state
            .users
            .ensure_admin(
                UserName::new("Admin")?,
                Email::new(&email)?,
                RawPassword::presented(password),
            )
            .await?;
        if !created {
            tracing::info!(email = %email, "Seed admin already exists");
        }
    }

    Ok(account_router(state))
}
