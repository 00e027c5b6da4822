//! Runs the recommender against a fresh catalog snapshot.
//!
//! The snapshot is loaded asynchronously; ranking is CPU-bound and runs on the
//! blocking pool.

use std::{collections::HashMap, sync::Arc};

use sqlx::PgPool;

use crate::{
    catalog::{Catalog, EntityId},
    error::{AppError, AppResult},
    model::{ElectiveRequest, SkillOut},
    recommend::{
        CourseRecommendations, DegreeSuggestion, ElectiveOutcome, PersonalizedOutcome,
        Preferences, Recommender, Settings, SimilarEntity,
    },
    repo,
};

const MAX_TOP_N: usize = 100;

fn bounded(top_n: usize) -> usize {
    top_n.clamp(1, MAX_TOP_N)
}

async fn with_engine<T, F>(pool: &PgPool, settings: Arc<Settings>, job: F) -> AppResult<T>
where
    F: FnOnce(&Recommender<'_, Catalog>) -> T + Send + 'static,
    T: Send + 'static,
{
    let catalog = repo::catalog::load_snapshot(pool).await?;
    tracing::debug!(universities = catalog.len(), "snapshot ready");

    let output = tokio::task::spawn_blocking(move || {
        let engine = Recommender::new(&catalog, &settings);
        job(&engine)
    })
    .await?;

    Ok(output)
}

pub async fn similar(
    pool: &PgPool,
    settings: Arc<Settings>,
    university_id: EntityId,
    top_n: usize,
) -> AppResult<Vec<SimilarEntity>> {
    let top_n = bounded(top_n);
    with_engine(pool, settings, move |engine| engine.find_similar(university_id, top_n)).await
}

pub async fn degrees(
    pool: &PgPool,
    settings: Arc<Settings>,
    university_id: EntityId,
    top_n: usize,
    weights: HashMap<String, f64>,
) -> AppResult<Vec<DegreeSuggestion>> {
    let top_n = bounded(top_n);
    let suggestions = with_engine(pool, settings, move |engine| {
        engine.suggest_degrees(university_id, top_n, &weights)
    })
    .await??;

    tracing::info!(university_id, returned = suggestions.len(), "degree suggestions served");
    Ok(suggestions)
}

pub async fn courses_for_degree(
    pool: &PgPool,
    settings: Arc<Settings>,
    university_id: EntityId,
    degree_name: String,
    top_n: usize,
) -> AppResult<CourseRecommendations> {
    let top_n = bounded(top_n);
    with_engine(pool, settings, move |engine| {
        engine.recommend_courses_for_degree_name(university_id, &degree_name, top_n)
    })
    .await
}

pub async fn courses_for_new_degree(
    pool: &PgPool,
    settings: Arc<Settings>,
    degree_name: String,
    top_n: usize,
) -> AppResult<CourseRecommendations> {
    if degree_name.trim().is_empty() {
        return Err(AppError::BadRequest("degree name must not be empty".to_string()));
    }
    let top_n = bounded(top_n);
    with_engine(pool, settings, move |engine| {
        engine.recommend_courses_for_new_degree(&degree_name, top_n)
    })
    .await
}

pub async fn electives(
    pool: &PgPool,
    settings: Arc<Settings>,
    university_id: EntityId,
    request: ElectiveRequest,
    min_overlap_ratio: f64,
) -> AppResult<ElectiveOutcome> {
    if !(0.0..=1.0).contains(&min_overlap_ratio) {
        return Err(AppError::BadRequest(
            "min_overlap_ratio must be between 0 and 1".to_string(),
        ));
    }
    let top_n = request.top_n.min(MAX_TOP_N);
    with_engine(pool, settings, move |engine| {
        engine.suggest_electives(
            university_id,
            request.program_id,
            &request.target_skills,
            top_n,
            min_overlap_ratio,
        )
    })
    .await
}

pub async fn elective_skills(
    pool: &PgPool,
    settings: Arc<Settings>,
    university_id: EntityId,
    program_id: EntityId,
) -> AppResult<Vec<SkillOut>> {
    let skills = with_engine(pool, settings, move |engine| {
        engine.elective_skills(university_id, program_id)
    })
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "program {program_id} not found for university {university_id}"
        ))
    })?;

    Ok(skills
        .into_iter()
        .map(|skill| SkillOut {
            skill_id: skill.id,
            skill_name: skill.name,
            taxonomy_id: skill.taxonomy_id,
            level: skill.level,
        })
        .collect())
}

pub async fn personalized(
    pool: &PgPool,
    settings: Arc<Settings>,
    mut preferences: Preferences,
) -> AppResult<PersonalizedOutcome> {
    preferences.top_n = bounded(preferences.top_n);
    with_engine(pool, settings, move |engine| engine.suggest_programs(&preferences)).await
}
