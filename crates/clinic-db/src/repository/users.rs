//! User repository: provisioning and the company cascade.

use clinic_common::models::User;
use sqlx::{Any, AnyPool, Executor};
use uuid::Uuid;

use super::now_text;

pub async fn create_user(
    pool: &AnyPool,
    id: Uuid,
    company_id: Uuid,
    name: &str,
    email: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, company_id, name, email, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(id.to_string())
    .bind(company_id.to_string())
    .bind(name)
    .bind(email)
    .bind(now_text())
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &AnyPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

/// Delete every user of a company. Returns how many were removed.
pub async fn delete_for_company<'e, E>(executor: E, company_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Any>,
{
    let result = sqlx::query("DELETE FROM users WHERE company_id = $1")
        .bind(company_id.to_string())
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
