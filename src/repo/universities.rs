use serde_json::Value;
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
pub struct UniversityRow {
    pub id: i64,
    pub name: String,
    pub country: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProgramRow {
    pub id: i64,
    pub degree_type: String,
    pub degree_titles: Option<Value>,
    pub language: Option<String>,
    pub duration_semesters: Option<String>,
    pub total_ects: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MetricsRow {
    pub total_programs: i64,
    pub recognized_skills: i64,
}

pub async fn list_universities(pool: &PgPool) -> Result<Vec<UniversityRow>, sqlx::Error> {
    sqlx::query_as::<_, UniversityRow>(
        r#"
        SELECT id, name, country
        FROM academic.universities
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn university_exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (SELECT 1 FROM academic.universities WHERE id = $1)
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn list_programs(pool: &PgPool, university_id: i64) -> Result<Vec<ProgramRow>, sqlx::Error> {
    sqlx::query_as::<_, ProgramRow>(
        r#"
        SELECT id,
               degree_type,
               degree_titles,
               language,
               duration_semesters,
               total_ects
        FROM academic.degree_programs
        WHERE university_id = $1
        ORDER BY id
        "#,
    )
    .bind(university_id)
    .fetch_all(pool)
    .await
}

pub async fn distinct_degree_types(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT degree_type
        FROM academic.degree_programs
        ORDER BY degree_type
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn distinct_countries(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT country
        FROM academic.universities
        WHERE country <> ''
        ORDER BY country
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Raw language fields of programs and courses; a field may list several.
pub async fn language_fields(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT language FROM academic.degree_programs WHERE language IS NOT NULL
        UNION
        SELECT language FROM academic.courses WHERE language IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn metrics(pool: &PgPool, university_id: i64) -> Result<MetricsRow, sqlx::Error> {
    sqlx::query_as::<_, MetricsRow>(
        r#"
        SELECT
          (SELECT COUNT(*) FROM academic.degree_programs WHERE university_id = $1) AS total_programs,
          (SELECT COUNT(DISTINCT cs.skill_id)
             FROM academic.course_skills cs
             JOIN academic.courses c ON c.id = cs.course_id
            WHERE c.university_id = $1) AS recognized_skills
        "#,
    )
    .bind(university_id)
    .fetch_one(pool)
    .await
}
