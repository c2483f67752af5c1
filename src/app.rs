use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::{api, auth, config::AppConfig, fetcher, middleware, repo};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sessions: auth::SessionManager,
    pub feed_client: Arc<fetcher::FeedClient>,
}

pub async fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let db_path = Path::new(&config.db.path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // foreign_keys must be set per connection or item cascade silently stops
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.db.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    repo::migrations::ensure_schema(&pool).await?;

    let feed_client = Arc::new(fetcher::FeedClient::new(&config.fetcher)?);
    fetcher::spawn(
        pool.clone(),
        config.fetcher.clone(),
        Arc::clone(&feed_client),
    );

    let sessions = auth::SessionManager::new(
        config.auth.password.clone(),
        Duration::from_secs(std::cmp::max(60_u64, config.auth.session_ttl_secs)),
    );

    let state = AppState {
        pool,
        sessions,
        feed_client,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let layers = ServiceBuilder::new()
        .layer(from_fn(middleware::assign_trace_id))
        .layer(cors);

    let reader_api = Router::new()
        .route(
            "/subscriptions",
            get(api::subscriptions::list).post(api::subscriptions::add),
        )
        .route(
            "/subscriptions/:url_hash",
            put(api::subscriptions::update).delete(api::subscriptions::remove),
        )
        .route(
            "/subscriptions/:url_hash/read/:page",
            get(api::items::read_page),
        )
        .route(
            "/subscriptions/:url_hash/unread/:page",
            get(api::items::unread_page),
        )
        .route("/items", put(api::items::update_read_flags))
        .route(
            "/refresh_subscription/:url_hash",
            post(api::subscriptions::refresh),
        )
        .route_layer(from_fn_with_state(state.clone(), auth::require_session))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(api::health::health_check))
        .route("/login", post(api::session::login))
        .route("/logout", post(api::session::logout))
        .merge(reader_api)
        .layer(layers)
        .with_state(state);

    Ok(router)
}
