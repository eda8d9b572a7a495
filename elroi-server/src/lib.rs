use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use elroi_shared::clients::db::{self, DbPool, PoolOptions};
use elroi_shared::clients::storage::PhotoStore;
use elroi_shared::errors::AppResult;
use elroi_shared::middleware::AuthState;

pub mod config;
pub mod migrations;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

use config::AppConfig;
use services::token_service;

/// Public path prefix under which uploaded photos are served.
pub const UPLOADS_PATH: &str = "/uploads";

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub photos: PhotoStore,
}

impl AuthState for AppState {
    fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }

    fn is_token_revoked(&self, token_id: Uuid) -> AppResult<bool> {
        let mut conn = db::get_conn(&self.db)?;
        token_service::is_revoked(&mut conn, token_id)
    }
}

/// Opens the database, applies the schema and prepares the upload directory.
pub async fn build_state(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let db = db::create_pool(
        &config.database_url,
        PoolOptions {
            max_size: config.db_pool_size,
            busy_timeout_ms: config.db_busy_timeout_ms,
        },
    )?;

    {
        let mut conn = db::get_conn(&db)?;
        migrations::run(&mut conn)?;
    }

    let photos = PhotoStore::new(&config.upload_dir, UPLOADS_PATH)
        .await
        .map_err(anyhow::Error::msg)?;

    Ok(Arc::new(AppState { db, config, photos }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let max_upload = state.config.max_upload_bytes;
    let uploads = ServeDir::new(state.photos.root());

    Router::new()
        .route("/", get(routes::index::index))
        .route("/health", get(routes::health::health_check))
        .route("/intro-videos", get(routes::auth::intro_videos))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/dashboard", get(routes::dashboard::dashboard))
        .route("/profile", get(routes::profile::get_own_profile).patch(routes::profile::update_profile))
        .route("/profile/photo", post(routes::photo::upload_photo)
            .layer(DefaultBodyLimit::max(max_upload)))
        .route("/profile/active", put(routes::profile::set_active))
        .route("/profile/:id", get(routes::profile::view_profile))
        .route("/like/:id", post(routes::likes::like_user).delete(routes::likes::unlike_user))
        .route("/matches", get(routes::matches::list_matches))
        .route("/messages", get(routes::messages::list_conversations))
        .route("/messages/unread-count", get(routes::messages::unread_count))
        .route("/messages/:id", get(routes::messages::conversation).post(routes::messages::send_message))
        .route("/search", get(routes::search::search_users))
        .nest_service(UPLOADS_PATH, uploads)
        .layer(axum::middleware::from_fn(elroi_shared::middleware::metrics_middleware))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
