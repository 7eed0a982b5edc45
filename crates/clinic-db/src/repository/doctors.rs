//! Doctor repository.
//!
//! Every read joins the creating user so listings can embed `{ id, name }`.

use clinic_common::models::{Doctor, NewDoctor};
use sqlx::{Any, AnyPool, Executor};
use uuid::Uuid;

use super::now_text;

const SELECT_DOCTOR: &str = r#"
    SELECT d.id, d.company_id, d.user_id, d.name, d.specialty, d.email,
           d.status, d.image, d.created_at, d.updated_at,
           u.name AS creator_name
    FROM doctors d
    LEFT JOIN users u ON u.id = d.user_id
"#;

#[derive(sqlx::FromRow)]
struct ImageRow {
    image: String,
}

// ============================================================
// Create
// ============================================================

/// Insert a doctor owned by `company_id` and created by `user_id`.
///
/// A duplicate email surfaces as a unique-violation database error.
pub async fn create_doctor(
    pool: &AnyPool,
    id: Uuid,
    company_id: Uuid,
    user_id: Uuid,
    doctor: &NewDoctor,
    image: Option<&str>,
) -> Result<Doctor, sqlx::Error> {
    let now = now_text();
    sqlx::query(
        r#"
        INSERT INTO doctors (
            id, company_id, user_id, name, specialty,
            email, status, image, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(id.to_string())
    .bind(company_id.to_string())
    .bind(user_id.to_string())
    .bind(&doctor.name)
    .bind(&doctor.specialty)
    .bind(&doctor.email)
    .bind(doctor.status.as_str())
    .bind(image)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

// ============================================================
// Read
// ============================================================

/// Doctors of one company, oldest first.
pub async fn list_for_company(pool: &AnyPool, company_id: Uuid) -> Result<Vec<Doctor>, sqlx::Error> {
    sqlx::query_as::<_, Doctor>(&format!(
        "{SELECT_DOCTOR} WHERE d.company_id = $1 ORDER BY d.created_at, d.id"
    ))
    .bind(company_id.to_string())
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &AnyPool, id: Uuid) -> Result<Option<Doctor>, sqlx::Error> {
    sqlx::query_as::<_, Doctor>(&format!("{SELECT_DOCTOR} WHERE d.id = $1"))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

/// Find a doctor only if it belongs to `company_id`.
pub async fn find_in_company(
    pool: &AnyPool,
    id: Uuid,
    company_id: Uuid,
) -> Result<Option<Doctor>, sqlx::Error> {
    sqlx::query_as::<_, Doctor>(&format!(
        "{SELECT_DOCTOR} WHERE d.id = $1 AND d.company_id = $2"
    ))
    .bind(id.to_string())
    .bind(company_id.to_string())
    .fetch_optional(pool)
    .await
}

/// Image URLs of every doctor in a company, for cascade cleanup.
pub async fn list_images_for_company(
    pool: &AnyPool,
    company_id: Uuid,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ImageRow>(
        "SELECT image FROM doctors WHERE company_id = $1 AND image IS NOT NULL",
    )
    .bind(company_id.to_string())
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.image).collect())
}

// ============================================================
// Delete
// ============================================================

pub async fn delete_doctor<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Any>,
{
    let result = sqlx::query("DELETE FROM doctors WHERE id = $1")
        .bind(id.to_string())
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every doctor of a company. Returns how many were removed.
pub async fn delete_for_company<'e, E>(executor: E, company_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Any>,
{
    let result = sqlx::query("DELETE FROM doctors WHERE company_id = $1")
        .bind(company_id.to_string())
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
