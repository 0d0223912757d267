use anyhow::Context;
use retailpro_auth::{
    build_router,
    config::{validate_production_config, AuthConfig, RefreshCookieConfig},
    db,
    repositories::{SqliteActivationRepository, SqliteUserRepository},
    services::{create_email_sender, AuthService, EmailSender},
    AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retailpro_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Signing key and hash cost are fixed for the life of the process
    let auth_config = AuthConfig::from_env().context("invalid auth configuration")?;
    validate_production_config(&auth_config).context("refusing to start")?;

    // Database connection
    let pool = db::create_pool().await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    // Initialize repositories
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let activation_repository = Arc::new(SqliteActivationRepository::new(pool.clone()));

    // Initialize services
    let email_sender: Arc<dyn EmailSender> = Arc::from(create_email_sender());
    let auth_service = Arc::new(
        AuthService::new(
            &auth_config,
            user_repository,
            activation_repository,
            email_sender,
        )
        .context("invalid hashing parameters")?,
    );

    let app_state = AppState {
        auth_service,
        refresh_cookie: RefreshCookieConfig::from_env(),
    };

    let app = build_router(app_state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", host, port))?;

    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
