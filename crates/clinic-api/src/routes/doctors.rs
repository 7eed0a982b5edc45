//! Doctor routes: scoped to the caller's company.
//!
//! GET    /doctors        List doctors of the caller's company
//! POST   /doctors        Create a doctor (multipart/form-data)
//! DELETE /doctors/{id}   Delete a doctor and its image

use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use clinic_common::{
    error::{ClinicError, ClinicResult},
    models::{CreateDoctorForm, Doctor},
    ids,
    validation::{collect_errors, FieldErrors},
};
use clinic_db::repository::doctors;
use serde::Serialize;

use crate::{
    attachment::{self, ResourceKind, SubmittedForm},
    middleware::AuthContext,
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route("/doctors/{id}", delete(delete_doctor))
}

// ============================================================
// Response types
// ============================================================

#[derive(Serialize)]
struct DoctorList {
    doctors: Vec<Doctor>,
    status: &'static str,
}

#[derive(Serialize)]
struct DoctorCreated {
    message: &'static str,
    doctor: Doctor,
}

#[derive(Serialize)]
struct DoctorDeleted {
    message: &'static str,
    status: u16,
}

// ============================================================
// GET /doctors
// ============================================================

async fn list_doctors(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> ClinicResult<Json<DoctorList>> {
    let doctors = doctors::list_for_company(&state.db.pool, auth.company_id).await?;
    Ok(Json(DoctorList {
        doctors,
        status: "success",
    }))
}

// ============================================================
// POST /doctors
// ============================================================

/// Form fields: `name`, `speciatly` (or `specialty`), `email`, `status`,
/// optional `image` file. Company and creator come from the token.
async fn create_doctor(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ClinicResult<(StatusCode, Json<DoctorCreated>)> {
    let mut submitted = SubmittedForm::read(multipart).await?;
    let specialty = submitted.take("speciatly");
    let form = CreateDoctorForm {
        name: submitted.take("name"),
        specialty: specialty.or_else(|| submitted.take("specialty")),
        email: submitted.take("email"),
        status: submitted.take("status"),
    };

    let mut errors = collect_errors(&form);
    if form.status.is_some() && form.parsed_status().is_none() {
        errors.add("status", "The selected status is invalid.");
    }
    let image = submitted
        .image
        .take()
        .and_then(|upload| upload.validate(state.config.limits.max_image_bytes, &mut errors));
    errors.into_result()?;

    let new_doctor = form.into_new().ok_or_else(|| ClinicError::Validation {
        errors: FieldErrors::single("status", "The selected status is invalid."),
    })?;
    let storage = state.storage.as_ref();

    let stored = attachment::store_optional(storage, ResourceKind::Doctor, image).await?;
    let id = ids::generate_id();
    let inserted = doctors::create_doctor(
        &state.db.pool,
        id,
        auth.company_id,
        auth.user_id,
        &new_doctor,
        stored.as_ref().map(|s| s.url.as_str()),
    )
    .await
    .map_err(insert_error);
    let doctor = attachment::settle(storage, stored.as_ref(), inserted).await?;

    tracing::info!(
        doctor_id = %doctor.id,
        company_id = %doctor.company_id,
        has_image = doctor.image.is_some(),
        "Doctor created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DoctorCreated {
            message: "Doctor created successfully",
            doctor,
        }),
    ))
}

/// The unique index on `email` is the only uniqueness check; report it like
/// any other field error.
fn insert_error(e: sqlx::Error) -> ClinicError {
    let duplicate = e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if duplicate {
        ClinicError::Validation {
            errors: FieldErrors::single("email", "The email has already been taken."),
        }
    } else {
        ClinicError::Database(e)
    }
}

// ============================================================
// DELETE /doctors/{id}
// ============================================================

async fn delete_doctor(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ClinicResult<Json<DoctorDeleted>> {
    let id = super::parse_id(&id, "Doctor")?;
    let storage = state.storage.as_ref();

    // Doctors of other companies are indistinguishable from missing ones.
    let doctor = doctors::find_in_company(&state.db.pool, id, auth.company_id)
        .await?
        .ok_or_else(|| ClinicError::not_found("Doctor"))?;

    let keys: Vec<String> = doctor
        .image
        .as_deref()
        .and_then(|url| attachment::image_key(storage, ResourceKind::Doctor, url))
        .into_iter()
        .collect();
    attachment::remove_objects(storage, &keys, state.config.storage.delete_attempts).await?;

    doctors::delete_doctor(&state.db.pool, id).await?;

    tracing::info!(doctor_id = %id, company_id = %auth.company_id, "Doctor deleted");

    Ok(Json(DoctorDeleted {
        message: "Doctor deleted successfully",
        status: StatusCode::OK.as_u16(),
    }))
}
