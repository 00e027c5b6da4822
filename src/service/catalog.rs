use std::collections::BTreeSet;

use sqlx::PgPool;

use crate::{
    catalog::TitleField,
    error::{AppError, AppResult},
    model::{MetricsOut, ProgramOut, UniversityOut},
    repo,
    util::title::parse_titles,
};

pub async fn universities(pool: &PgPool) -> AppResult<Vec<UniversityOut>> {
    let rows = repo::universities::list_universities(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| UniversityOut {
            university_id: row.id,
            university_name: row.name,
            country: row.country,
        })
        .collect())
}

async fn require_university(pool: &PgPool, id: i64) -> AppResult<()> {
    if repo::universities::university_exists(pool, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("university {id} not found")))
    }
}

pub async fn programs(pool: &PgPool, university_id: i64) -> AppResult<Vec<ProgramOut>> {
    require_university(pool, university_id).await?;
    let rows = repo::universities::list_programs(pool, university_id).await?;
    tracing::debug!(university_id, programs = rows.len(), "programs listed");

    Ok(rows
        .into_iter()
        .map(|row| ProgramOut {
            program_id: row.id,
            degree_type: row.degree_type,
            degree_titles: parse_titles(&TitleField::from_json(row.degree_titles)),
            language: row.language,
            duration_semesters: row.duration_semesters,
            total_ects: row.total_ects,
        })
        .collect())
}

pub async fn degree_types(pool: &PgPool) -> AppResult<Vec<String>> {
    Ok(repo::universities::distinct_degree_types(pool).await?)
}

pub async fn countries(pool: &PgPool) -> AppResult<Vec<String>> {
    Ok(repo::universities::distinct_countries(pool).await?)
}

pub async fn languages(pool: &PgPool) -> AppResult<Vec<String>> {
    let fields = repo::universities::language_fields(pool).await?;
    Ok(split_languages(&fields))
}

/// Distinct, sorted languages from comma-separated fields.
fn split_languages(fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .flat_map(|field| field.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub async fn metrics(pool: &PgPool, university_id: i64) -> AppResult<MetricsOut> {
    require_university(pool, university_id).await?;
    let row = repo::universities::metrics(pool, university_id).await?;
    Ok(MetricsOut {
        university_id,
        total_programs: row.total_programs,
        recognized_skills: row.recognized_skills,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn languages_are_split_and_deduplicated() {
        let fields = vec![
            "Greek, English".to_string(),
            "English".to_string(),
            " ,French".to_string(),
        ];
        assert_eq!(split_languages(&fields), vec!["English", "French", "Greek"]);
    }
}
