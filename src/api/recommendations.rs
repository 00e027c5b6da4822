use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{CourseQuery, DegreeSuggestionsResp, DegreeWeightsPayload, TopNQuery},
    recommend::{
        CourseRecommendations, DegreeSuggestion, PersonalizedOutcome, Preferences, SimilarEntity,
    },
    service,
};

pub async fn similar(
    State(state): State<AppState>,
    Path(university_id): Path<i64>,
    Query(query): Query<TopNQuery>,
) -> AppResult<Json<Vec<SimilarEntity>>> {
    let similar = service::recommendations::similar(
        &state.pool,
        Arc::clone(&state.settings),
        university_id,
        query.top_n,
    )
    .await?;
    Ok(Json(similar))
}

pub async fn degrees(
    State(state): State<AppState>,
    Path(university_id): Path<i64>,
    Query(query): Query<TopNQuery>,
    payload: Option<Json<DegreeWeightsPayload>>,
) -> AppResult<Json<DegreeSuggestionsResp<DegreeSuggestion>>> {
    let weights = payload.map(|Json(p)| p.weights).unwrap_or_default();
    let suggestions = service::recommendations::degrees(
        &state.pool,
        Arc::clone(&state.settings),
        university_id,
        query.top_n,
        weights,
    )
    .await?;
    Ok(Json(DegreeSuggestionsResp {
        university_id,
        suggestions,
    }))
}

pub async fn courses_for_degree(
    State(state): State<AppState>,
    Path((university_id, degree_name)): Path<(i64, String)>,
    Query(query): Query<CourseQuery>,
) -> AppResult<Json<CourseRecommendations>> {
    let recommendations = service::recommendations::courses_for_degree(
        &state.pool,
        Arc::clone(&state.settings),
        university_id,
        degree_name,
        query.top_n_courses,
    )
    .await?;
    Ok(Json(recommendations))
}

pub async fn courses_for_new_degree(
    State(state): State<AppState>,
    Path(degree_name): Path<String>,
    Query(query): Query<CourseQuery>,
) -> AppResult<Json<CourseRecommendations>> {
    let recommendations = service::recommendations::courses_for_new_degree(
        &state.pool,
        Arc::clone(&state.settings),
        degree_name,
        query.top_n_courses,
    )
    .await?;
    Ok(Json(recommendations))
}

pub async fn personalized(
    State(state): State<AppState>,
    Json(preferences): Json<Preferences>,
) -> AppResult<Json<PersonalizedOutcome>> {
    let outcome = service::recommendations::personalized(
        &state.pool,
        Arc::clone(&state.settings),
        preferences,
    )
    .await?;
    Ok(Json(outcome))
}
