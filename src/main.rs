//! pomindex - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use pomindex::api::{self, AppState};
use pomindex::config::Config;
use pomindex::error::Result;
use pomindex::services::github_service::GithubService;
use pomindex::services::index_service::IndexService;
use pomindex::services::publish_service::PublishService;
use pomindex::services::staging_service::StagingService;
use pomindex::{db, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    telemetry::init_tracing(&config.log_level);
    tracing::info!("Starting pomindex");

    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations complete");

    let index = Arc::new(IndexService::new(db_pool.clone()));
    let github = Arc::new(GithubService::new(
        config.github_api_url.clone(),
        db_pool.clone(),
    )?);
    let publisher = PublishService::new(
        StagingService::new(&config.storage_path),
        index.clone(),
        github,
    );

    let state = Arc::new(AppState::new(config.clone(), publisher, index));

    let app = api::routes::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
