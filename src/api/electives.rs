use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{ElectiveQuery, ElectiveRequest, SkillOut},
    recommend::ElectiveOutcome,
    service,
};

pub async fn suggest(
    State(state): State<AppState>,
    Path(university_id): Path<i64>,
    Query(query): Query<ElectiveQuery>,
    Json(request): Json<ElectiveRequest>,
) -> AppResult<Json<ElectiveOutcome>> {
    let outcome = service::recommendations::electives(
        &state.pool,
        Arc::clone(&state.settings),
        university_id,
        request,
        query.min_overlap_ratio,
    )
    .await?;
    Ok(Json(outcome))
}

pub async fn skills(
    State(state): State<AppState>,
    Path((university_id, program_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<SkillOut>>> {
    let skills = service::recommendations::elective_skills(
        &state.pool,
        Arc::clone(&state.settings),
        university_id,
        program_id,
    )
    .await?;
    Ok(Json(skills))
}
