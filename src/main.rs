//! ShelfCheck - Perishable-product expiry tracking for retail stores

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfcheck::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            MemoryRecordRepository, MemoryTemplateRepository, MemoryUserRepository,
            RecordRepository, SqlxRecordRepository, SqlxTemplateRepository, SqlxUserRepository,
            TemplateRepository, UserRepository,
        },
    },
    services::{RecordService, ReportDispatcher, StatusPolicy, TemplateService, UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfcheck=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ShelfCheck expiry tracking service...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Choose the persistence strategy. Without a database URL the service
    // runs fully in memory so a fresh checkout works with zero setup.
    let (record_repo, template_repo, user_repo): (
        Arc<dyn RecordRepository>,
        Arc<dyn TemplateRepository>,
        Arc<dyn UserRepository>,
    ) = if config.database.is_configured() {
        let url = config.database.url.as_deref().unwrap_or_default();
        let pool = db::create_pool(url).await?;
        db::migrations::run_migrations(&pool).await?;
        tracing::info!("Database connected and migrated: {}", url);
        (
            Arc::new(SqlxRecordRepository::new(pool.clone())),
            Arc::new(SqlxTemplateRepository::new(pool.clone())),
            Arc::new(SqlxUserRepository::new(pool)),
        )
    } else {
        tracing::warn!("No database configured, using in-memory store (data is not persisted)");
        (
            MemoryRecordRepository::boxed(),
            MemoryTemplateRepository::boxed(),
            MemoryUserRepository::boxed(),
        )
    };

    // Report dispatch: mock path unless SMTP is configured
    let dispatcher = ReportDispatcher::from_config(&config.email)?;
    if dispatcher.is_live() {
        tracing::info!("Email dispatch enabled via SMTP");
    } else {
        tracing::warn!("No SMTP provider configured, report sends run in test mode");
    }

    // Build application state
    let state = AppState {
        record_service: Arc::new(RecordService::new(record_repo, template_repo.clone())),
        template_service: Arc::new(TemplateService::new(template_repo)),
        user_service: Arc::new(UserService::new(user_repo)),
        dispatcher: Arc::new(dispatcher),
        sessions: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
        policy: StatusPolicy::from(&config.policy),
        finalize_empty: config.policy.finalize_empty,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
