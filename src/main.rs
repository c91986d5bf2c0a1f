mod aggregate;
mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod models;
mod pagination;
mod ratings;
mod reviews;
mod routes;
#[cfg(test)]
mod testutil;
mod viewer;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{catalog::Catalog, config::Config, ratings::RatingStore, reviews::ReviewStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub catalog: Catalog,
    pub ratings: RatingStore,
    pub reviews: ReviewStore,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let reviews = ReviewStore::new(db.clone(), config.max_review_depth);
        Self {
            config: Arc::new(config),
            catalog: Catalog::new(db.clone(), reviews.clone()),
            ratings: RatingStore::new(db.clone()),
            reviews,
            db,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/movies", get(routes::list_movies))
        .route("/movies/", get(routes::list_movies))
        .route("/movies/{id}", get(routes::get_movie))
        .route("/movies/{id}/", get(routes::get_movie))
        .route("/actors", get(routes::list_actors))
        .route("/actors/", get(routes::list_actors))
        .route("/actors/{id}", get(routes::get_actor))
        .route("/actors/{id}/", get(routes::get_actor))
        .route("/reviews", post(routes::create_review))
        .route("/reviews/", post(routes::create_review))
        .route("/ratings", post(routes::create_rating))
        .route("/ratings/", post(routes::create_rating))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,marquee=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;
    let addr = config.addr;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let state = Arc::new(AppState::new(db, config));

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
