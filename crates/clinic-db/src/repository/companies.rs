//! Company repository.

use clinic_common::models::{Company, NewCompany};
use sqlx::{Any, AnyPool, Executor};
use uuid::Uuid;

use super::now_text;

// ============================================================
// Create
// ============================================================

/// Insert a company. `image` is the already-resolved public URL, if any.
pub async fn create_company(
    pool: &AnyPool,
    id: Uuid,
    company: &NewCompany,
    image: Option<&str>,
) -> Result<Company, sqlx::Error> {
    let now = now_text();
    sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO companies (id, name, phone, address, email, image, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(&company.name)
    .bind(&company.phone)
    .bind(&company.address)
    .bind(&company.email)
    .bind(image)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await
}

// ============================================================
// Read
// ============================================================

/// All companies, oldest first.
pub async fn list_companies(pool: &AnyPool) -> Result<Vec<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY created_at, id")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &AnyPool, id: Uuid) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

// ============================================================
// Delete
// ============================================================

/// Delete the company row only. Dependents must already be gone.
pub async fn delete_company<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Any>,
{
    let result = sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id.to_string())
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
