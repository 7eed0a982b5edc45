mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use clinic_db::repository::doctors;
use common::{token_for, FailingDeletes, Multipart, TestApp, FILES_BASE, PNG};

fn doctor_form(email: &str) -> Multipart {
    Multipart::new()
        .text("name", "Dr. Ada Lovelace")
        .text("speciatly", "Cardiology")
        .text("email", email)
        .text("status", "available")
}

#[tokio::test]
async fn create_attaches_caller_company_and_creator() {
    let app = TestApp::spawn().await;
    let (company_id, user_id, token) = app.caller("Home").await;

    let (status, body) = app
        .post_form("/api/v1/doctors", &token, doctor_form("ada@home.test"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Doctor created successfully");
    let doctor = &body["doctor"];
    assert_eq!(doctor["speciatly"], "Cardiology");
    assert_eq!(doctor["status"], "available");
    assert_eq!(doctor["company_id"], company_id.to_string());
    assert_eq!(doctor["user_id"], user_id.to_string());
    assert_eq!(doctor["user"]["name"], "Alice");
    assert!(doctor["image"].is_null());
}

#[tokio::test]
async fn create_accepts_corrected_specialty_spelling() {
    let app = TestApp::spawn().await;
    let (_, _, token) = app.caller("Home").await;

    let form = Multipart::new()
        .text("name", "Dr. Grace")
        .text("specialty", "Neurology")
        .text("email", "grace@home.test")
        .text("status", "on leave");
    let (status, body) = app.post_form("/api/v1/doctors", &token, form).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["doctor"]["speciatly"], "Neurology");
    assert_eq!(body["doctor"]["status"], "on leave");
}

#[tokio::test]
async fn create_with_image_stores_url_under_doctors() {
    let app = TestApp::spawn().await;
    let (_, _, token) = app.caller("Home").await;

    let form = doctor_form("ada@home.test").file("image", "portrait", "image/png", PNG);
    let (status, body) = app.post_form("/api/v1/doctors", &token, form).await;

    assert_eq!(status, StatusCode::CREATED);
    let url = body["doctor"]["image"].as_str().expect("image url");
    assert!(url.starts_with(&format!("{FILES_BASE}/doctors/doctor_")), "{url}");
    assert!(url.ends_with(".png"), "{url}");
    assert_eq!(app.fetch_image(url).await, StatusCode::OK);
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, _, token) = app.caller("Home").await;

    let form = Multipart::new()
        .text("name", "Dr. Who")
        .text("speciatly", "Time")
        .text("email", "who@home.test")
        .text("status", "retired");
    let (status, body) = app.post_form("/api/v1/doctors", &token, form).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["status"][0], "The selected status is invalid.");
}

#[tokio::test]
async fn disallowed_image_type_is_rejected_and_nothing_is_stored() {
    let app = TestApp::spawn().await;
    let (company_id, _, token) = app.caller("Home").await;

    let webp = b"RIFF\0\0\0\0WEBPVP8 \0\0\0\0";
    let form = doctor_form("ada@home.test").file("image", "pic.webp", "image/webp", webp);
    let (status, body) = app.post_form("/api/v1/doctors", &token, form).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"]["image"][0],
        "The image field must be a file of type: jpeg, png, jpg, gif."
    );
    assert!(app.stored_keys().is_empty());
    assert!(doctors::list_for_company(&app.db.pool, company_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_email_is_a_field_error_and_the_upload_is_removed() {
    let app = TestApp::spawn().await;
    let (_, _, token) = app.caller("Home").await;

    let (status, _) = app
        .post_form("/api/v1/doctors", &token, doctor_form("ada@home.test"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let form = doctor_form("ada@home.test").file("image", "dup.png", "image/png", PNG);
    let (status, body) = app.post_form("/api/v1/doctors", &token, form).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
    assert!(app.stored_keys().is_empty());
}

#[tokio::test]
async fn list_is_scoped_to_the_callers_company() {
    let app = TestApp::spawn().await;
    let (home, home_user, token) = app.caller("Home").await;
    let other = app.seed_company("Other", None).await;
    let other_user = app.seed_user(other.id, "Dave").await;

    app.seed_doctor(home, home_user, "mine@home.test", None).await;
    app.seed_doctor(other.id, other_user, "theirs@other.test", None)
        .await;

    let (status, body) = app.get("/api/v1/doctors", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let listed = body["doctors"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["email"], "mine@home.test");
    assert_eq!(listed[0]["user"]["id"], home_user.to_string());
}

#[tokio::test]
async fn delete_removes_record_and_image() {
    let app = TestApp::spawn().await;
    let (company_id, user_id, token) = app.caller("Home").await;
    let url = app.seed_object("doctors/doctor_target.png").await;
    let id = app
        .seed_doctor(company_id, user_id, "target@home.test", Some(&url))
        .await;

    let path = format!("/api/v1/doctors/{id}");
    let (status, body) = app.delete(&path, &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Doctor deleted successfully");
    assert_eq!(body["status"], 200);
    assert!(doctors::find_by_id(&app.db.pool, id).await.unwrap().is_none());
    assert_eq!(app.fetch_image(&url).await, StatusCode::NOT_FOUND);

    let (status, body) = app.delete(&path, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Doctor not found");
}

#[tokio::test]
async fn doctors_of_other_companies_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let (_, _, token) = app.caller("Home").await;
    let other = app.seed_company("Other", None).await;
    let other_user = app.seed_user(other.id, "Erin").await;
    let id = app
        .seed_doctor(other.id, other_user, "erin@other.test", None)
        .await;

    let (status, _) = app.delete(&format!("/api/v1/doctors/{id}"), &token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(doctors::find_by_id(&app.db.pool, id).await.unwrap().is_some());
}

#[tokio::test]
async fn storage_failure_on_delete_keeps_the_doctor() {
    let app = TestApp::spawn_with(|local| Arc::new(FailingDeletes(local))).await;
    let (company_id, user_id, token) = app.caller("Home").await;
    let url = app.seed_object("doctors/doctor_stuck.png").await;
    let id = app
        .seed_doctor(company_id, user_id, "stuck@home.test", Some(&url))
        .await;

    let (status, body) = app.delete(&format!("/api/v1/doctors/{id}"), &token).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["message"],
        "The file storage service could not complete the request"
    );
    assert!(doctors::find_by_id(&app.db.pool, id).await.unwrap().is_some());
    assert_eq!(app.fetch_image(&url).await, StatusCode::OK);
}

#[tokio::test]
async fn token_naming_another_company_is_rejected() {
    let app = TestApp::spawn().await;
    let (home, home_user, _) = app.caller("Home").await;
    let other = app.seed_company("Other", None).await;

    let forged = token_for(home_user, other.id);
    let (status, body) = app
        .post_form("/api/v1/doctors", &forged, doctor_form("ada@other.test"))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
    assert!(doctors::list_for_company(&app.db.pool, other.id).await.unwrap().is_empty());
    assert!(doctors::list_for_company(&app.db.pool, home).await.unwrap().is_empty());

    let (status, _) = app.get("/api/v1/doctors", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_unknown_user_is_rejected() {
    let app = TestApp::spawn().await;
    let (home, _, _) = app.caller("Home").await;

    let ghost = token_for(uuid::Uuid::now_v7(), home);
    let (status, body) = app
        .post_form("/api/v1/doctors", &ghost, doctor_form("ghost@home.test"))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
    assert!(doctors::list_for_company(&app.db.pool, home).await.unwrap().is_empty());
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
