//! Company routes: list, create with optional image, delete with cascade.
//!
//! GET    /companies        List all companies
//! POST   /companies        Create a company (multipart/form-data)
//! DELETE /companies/{id}   Delete a company, its image, users, and doctors

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use clinic_common::{
    error::{ClinicError, ClinicResult},
    models::{Company, CreateCompanyForm, NewCompany},
    ids,
    validation::collect_errors,
};
use clinic_db::repository::{companies, doctors, users};
use serde::Serialize;

use crate::{
    attachment::{self, ResourceKind, SubmittedForm},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/companies", get(list_companies).post(create_company))
        .route("/companies/{id}", delete(delete_company))
}

// ============================================================
// Response types
// ============================================================

#[derive(Serialize)]
struct CompanyList {
    companies: Vec<Company>,
}

#[derive(Serialize)]
struct CompanyCreated {
    message: &'static str,
    company: Company,
}

#[derive(Serialize)]
struct CompanyDeleted {
    message: &'static str,
}

// ============================================================
// GET /companies
// ============================================================

async fn list_companies(State(state): State<Arc<AppState>>) -> ClinicResult<Json<CompanyList>> {
    let companies = companies::list_companies(&state.db.pool).await?;
    Ok(Json(CompanyList { companies }))
}

// ============================================================
// POST /companies
// ============================================================

/// Form fields: `name`, `phone`, `address`, `email`, optional `image` file.
async fn create_company(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ClinicResult<(StatusCode, Json<CompanyCreated>)> {
    let mut submitted = SubmittedForm::read(multipart).await?;
    let form = CreateCompanyForm {
        name: submitted.take("name"),
        phone: submitted.take("phone"),
        address: submitted.take("address"),
        email: submitted.take("email"),
    };

    let mut errors = collect_errors(&form);
    let image = submitted
        .image
        .take()
        .and_then(|upload| upload.validate(state.config.limits.max_image_bytes, &mut errors));
    errors.into_result()?;

    let new_company = NewCompany::from(form);
    let storage = state.storage.as_ref();

    let stored = attachment::store_optional(storage, ResourceKind::Company, image).await?;
    let id = ids::generate_id();
    let inserted = companies::create_company(
        &state.db.pool,
        id,
        &new_company,
        stored.as_ref().map(|s| s.url.as_str()),
    )
    .await
    .map_err(ClinicError::from);
    let company = attachment::settle(storage, stored.as_ref(), inserted).await?;

    tracing::info!(company_id = %company.id, has_image = company.image.is_some(), "Company created");

    Ok((
        StatusCode::CREATED,
        Json(CompanyCreated {
            message: "Company created successfully",
            company,
        }),
    ))
}

// ============================================================
// DELETE /companies/{id}
// ============================================================

async fn delete_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ClinicResult<Json<CompanyDeleted>> {
    let id = super::parse_id(&id, "Company")?;
    let pool = &state.db.pool;
    let storage = state.storage.as_ref();

    let company = companies::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ClinicError::not_found("Company"))?;

    // Objects go first; the rows stay until every object is gone.
    let mut keys: Vec<String> = company
        .image
        .as_deref()
        .and_then(|url| attachment::image_key(storage, ResourceKind::Company, url))
        .into_iter()
        .collect();
    for url in doctors::list_images_for_company(pool, id).await? {
        keys.extend(attachment::image_key(storage, ResourceKind::Doctor, &url));
    }
    attachment::remove_objects(storage, &keys, state.config.storage.delete_attempts).await?;

    let mut tx = pool.begin().await?;
    let removed_doctors = doctors::delete_for_company(&mut *tx, id).await?;
    let removed_users = users::delete_for_company(&mut *tx, id).await?;
    companies::delete_company(&mut *tx, id).await?;
    tx.commit().await?;

    tracing::info!(
        company_id = %id,
        removed_users,
        removed_doctors,
        removed_images = keys.len(),
        "Company deleted"
    );

    Ok(Json(CompanyDeleted {
        message: "Company and its users deleted successfully",
    }))
}
