use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{MetricsOut, ProgramOut, UniversityOut},
    service,
};

pub async fn universities(State(state): State<AppState>) -> AppResult<Json<Vec<UniversityOut>>> {
    Ok(Json(service::catalog::universities(&state.pool).await?))
}

pub async fn programs(
    State(state): State<AppState>,
    Path(university_id): Path<i64>,
) -> AppResult<Json<Vec<ProgramOut>>> {
    Ok(Json(service::catalog::programs(&state.pool, university_id).await?))
}

pub async fn degree_types(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(service::catalog::degree_types(&state.pool).await?))
}

pub async fn countries(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(service::catalog::countries(&state.pool).await?))
}

pub async fn languages(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(service::catalog::languages(&state.pool).await?))
}

pub async fn metrics(
    State(state): State<AppState>,
    Path(university_id): Path<i64>,
) -> AppResult<Json<MetricsOut>> {
    Ok(Json(service::catalog::metrics(&state.pool, university_id).await?))
}
