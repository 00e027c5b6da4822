use std::{sync::Arc, time::Duration};

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{api, config::AppConfig, middleware::assign_trace_id, recommend::Settings, repo};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<Settings>,
}

pub async fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.db.url)
        .await?;

    repo::migrations::ensure_schema(&pool).await?;

    tracing::info!(
        peers = config.recommender.similar_peer_count,
        cache_capacity = config.recommender.profile_cache_capacity,
        "recommender configured"
    );

    let state = AppState {
        pool,
        settings: Arc::new(config.recommender.clone()),
    };

    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(assign_trace_id))
        .layer(cors);

    let catalog_api = Router::new()
        .route("/universities", get(api::catalog::universities))
        .route("/universities/:id/degrees", get(api::catalog::programs))
        .route(
            "/universities/:id/degrees/:program_id/elective-skills",
            get(api::electives::skills),
        )
        .route(
            "/universities/:id/degrees/electives",
            post(api::electives::suggest),
        )
        .route("/filters/degree-types", get(api::catalog::degree_types))
        .route("/filters/countries", get(api::catalog::countries))
        .route("/filters/languages", get(api::catalog::languages))
        .route("/metrics/:id", get(api::catalog::metrics));

    let recommend_api = Router::new()
        .route("/similar/:id", get(api::recommendations::similar))
        .route("/degrees/:id", post(api::recommendations::degrees))
        .route(
            "/courses/:id/:degree_name",
            get(api::recommendations::courses_for_degree),
        )
        .route(
            "/new_degree/:degree_name",
            get(api::recommendations::courses_for_new_degree),
        )
        .route("/personalized", post(api::recommendations::personalized));

    Router::new()
        .route("/healthz", get(api::health::health_check))
        .merge(catalog_api)
        .nest("/recommend", recommend_api)
        .layer(middleware)
        .with_state(state)
}
