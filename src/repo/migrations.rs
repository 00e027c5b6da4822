use sqlx::{Executor, PgPool};
use tracing::info;

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    tx.execute(
        r#"
        CREATE SCHEMA IF NOT EXISTS academic;
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS academic.universities (
          id                   BIGSERIAL PRIMARY KEY,
          name                 TEXT NOT NULL,
          country              TEXT NOT NULL,
          created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          CONSTRAINT uq_university UNIQUE (name, country)
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS academic.degree_programs (
          id                   BIGSERIAL PRIMARY KEY,
          university_id        BIGINT NOT NULL REFERENCES academic.universities(id) ON DELETE CASCADE,
          degree_type          TEXT NOT NULL CHECK (degree_type IN ('BSc', 'MSc', 'PhD', 'Other')),
          degree_titles        JSONB,
          language             TEXT,
          duration_semesters   TEXT,
          total_ects           TEXT,
          created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS academic.courses (
          id                   BIGSERIAL PRIMARY KEY,
          university_id        BIGINT NOT NULL REFERENCES academic.universities(id) ON DELETE CASCADE,
          program_id           BIGINT REFERENCES academic.degree_programs(id) ON DELETE SET NULL,
          lesson_name          TEXT NOT NULL,
          language             TEXT,
          mand_opt_list        JSONB,
          description          TEXT,
          objectives           TEXT,
          learning_outcomes    TEXT,
          course_content       TEXT,
          created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS academic.skills (
          id                   BIGSERIAL PRIMARY KEY,
          skill_name           TEXT NOT NULL,
          skill_url            TEXT,
          esco_id              TEXT,
          esco_level           TEXT,
          created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          CONSTRAINT uq_skill UNIQUE (skill_name, skill_url)
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS academic.course_skills (
          course_id            BIGINT NOT NULL REFERENCES academic.courses(id) ON DELETE CASCADE,
          skill_id             BIGINT NOT NULL REFERENCES academic.skills(id) ON DELETE CASCADE,
          categories           JSONB NOT NULL DEFAULT '[]'::jsonb,
          PRIMARY KEY (course_id, skill_id)
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_degree_programs_university ON academic.degree_programs(university_id);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_courses_university ON academic.courses(university_id);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_courses_program ON academic.courses(program_id);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_course_skills_skill ON academic.course_skills(skill_id);
        "#,
    )
    .await?;

    tx.commit().await?;
    info!("academic schema ensured");

    Ok(())
}
