//! Manual `sqlx::FromRow<'_, sqlx::any::AnyRow>` implementations for the
//! clinic models.
//!
//! `sqlx::AnyPool` only decodes primitive types natively (i64, f64, bool,
//! String, bytes). UUID and timestamp columns are stored as text and parsed
//! here, which keeps one schema working on both PostgreSQL and SQLite.

use chrono::{DateTime, Utc};
use sqlx::{any::AnyRow, FromRow, Row};
use uuid::Uuid;

use crate::models::{Company, Doctor, DoctorStatus, User, UserSummary};

// ── Internal helpers ──────────────────────────────────────────────────────────

fn uuid(row: &AnyRow, col: &str) -> Result<Uuid, sqlx::Error> {
    let s: String = row.try_get(col)?;
    Uuid::parse_str(&s).map_err(|e| sqlx::Error::Decode(Box::new(e) as _))
}

fn dt(row: &AnyRow, col: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let s: String = row.try_get(col)?;
    parse_dt(&s).map_err(sqlx::Error::Decode)
}

fn parse_dt(
    s: &str,
) -> Result<DateTime<Utc>, Box<dyn std::error::Error + Send + Sync + 'static>> {
    // Rows written by this service are RFC 3339
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Ok(d.with_timezone(&Utc));
    }
    // SQLite CURRENT_TIMESTAMP format: "2024-01-15 10:30:00"
    if let Ok(d) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(d.and_utc());
    }
    if let Ok(d) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(d.and_utc());
    }
    Err(format!("cannot parse timestamp '{s}'").into())
}

// ── Company ───────────────────────────────────────────────────────────────────

impl<'r> FromRow<'r, AnyRow> for Company {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: uuid(row, "id")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            email: row.try_get("email")?,
            image: row.try_get("image")?,
            created_at: dt(row, "created_at")?,
            updated_at: dt(row, "updated_at")?,
        })
    }
}

// ── Doctor ────────────────────────────────────────────────────────────────────

/// Expects the `creator_name` column produced by the doctor repository's
/// `LEFT JOIN users`.
impl<'r> FromRow<'r, AnyRow> for Doctor {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = DoctorStatus::parse(&status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown doctor status: {status}").into())
        })?;

        let user_id = uuid(row, "user_id")?;
        let creator_name: Option<String> = row.try_get("creator_name")?;

        Ok(Self {
            id: uuid(row, "id")?,
            name: row.try_get("name")?,
            specialty: row.try_get("specialty")?,
            email: row.try_get("email")?,
            status,
            image: row.try_get("image")?,
            company_id: uuid(row, "company_id")?,
            user_id,
            user: creator_name.map(|name| UserSummary { id: user_id, name }),
            created_at: dt(row, "created_at")?,
            updated_at: dt(row, "updated_at")?,
        })
    }
}

// ── User ──────────────────────────────────────────────────────────────────────

impl<'r> FromRow<'r, AnyRow> for User {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: uuid(row, "id")?,
            company_id: uuid(row, "company_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            created_at: dt(row, "created_at")?,
        })
    }
}
