// libs/doctor-cell/tests/integration_test.rs

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::router::{api_routes, availability_routes, patient_doctor_routes};
use doctor_cell::DOCTOR_SELECT;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

async fn mount_session_user(server: &MockServer, user: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user.row()])))
        .mount(server)
        .await;
}

fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn token_for(user: &TestUser, config: &AppConfig) -> String {
    JwtTestUtils::create_test_token(user, &config.session_secret, Some(1))
}

fn api_app(config: Arc<AppConfig>) -> Router {
    Router::new().nest("/api/doctors", api_routes(config))
}

#[tokio::test]
async fn doctor_reads_schedule_with_defaults() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let doctor = TestUser::doctor("house@hospital.com");
    mount_session_user(&server, &doctor).await;

    let row = MockStoreResponses::doctor_with_availability(
        5,
        &doctor,
        1,
        "Cardiology",
        Some(r#"{"Monday": "9am-5pm"}"#),
    );
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;

    let app = Router::new().nest("/doctor", availability_routes(config.clone()));
    let response = app
        .oneshot(request("GET", "/doctor/availability", &token_for(&doctor, &config), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["availability"]["Monday"], "9am-5pm");
    assert_eq!(json["availability"]["Sunday"], "Not Available");
}

#[tokio::test]
async fn doctor_saves_schedule() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let doctor = TestUser::doctor("house@hospital.com");
    mount_session_user(&server, &doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("user_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor(5, &doctor, 1, "Cardiology")
        ])))
        .mount(&server)
        .await;

    let saved = r#"{"Monday":"8-12","Tuesday":"Not Available","Wednesday":"Not Available","Thursday":"Not Available","Friday":"Not Available","Saturday":"Not Available","Sunday":"Not Available"}"#;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.5"))
        .and(query_param("select", DOCTOR_SELECT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor_with_availability(5, &doctor, 1, "Cardiology", Some(saved))
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let app = Router::new().nest("/doctor", availability_routes(config.clone()));
    let response = app
        .oneshot(request(
            "POST",
            "/doctor/availability",
            &token_for(&doctor, &config),
            Some(json!({ "monday": " 8-12 " })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Your availability has been updated.");
    assert_eq!(json["availability"]["Monday"], "8-12");
}

#[tokio::test]
async fn patient_cannot_edit_availability() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@hospital.com");
    mount_session_user(&server, &patient).await;

    let app = Router::new().nest("/doctor", availability_routes(config.clone()));
    let response = app
        .oneshot(request("GET", "/doctor/availability", &token_for(&patient, &config), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "This page is for doctors only.");
}

#[tokio::test]
async fn patient_browses_active_doctors_by_department_and_query() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@hospital.com");
    mount_session_user(&server, &patient).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::department(1, "Cardiology"),
            MockStoreResponses::department(2, "Neurology")
        ])))
        .mount(&server)
        .await;

    let house = TestUser::doctor("house@hospital.com").named("Gregory House");
    let wilson = TestUser::doctor("wilson@hospital.com").named("James Wilson");
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("user.is_active", "eq.true"))
        .and(query_param("department_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor(5, &house, 1, "Cardiology"),
            MockStoreResponses::doctor(6, &wilson, 1, "Cardiology")
        ])))
        .mount(&server)
        .await;

    let app = Router::new().nest("/patient", patient_doctor_routes(config.clone()));
    let response = app
        .oneshot(request(
            "GET",
            "/patient/view_doctors?dept_id=1&q=HOUSE",
            &token_for(&patient, &config),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["doctors"][0]["name"], "Gregory House");
    assert_eq!(json["doctors"][0]["availability"]["Monday"], "Not set");
    assert_eq!(json["selected_department"], 1);
    assert_eq!(json["departments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn api_lists_only_active_doctors() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@hospital.com");
    mount_session_user(&server, &patient).await;

    let house = TestUser::doctor("house@hospital.com").named("Gregory House");
    let gone = TestUser::doctor("gone@hospital.com").named("Gone Doc");
    let mut gone_row = MockStoreResponses::doctor(2, &gone, 1, "Cardiology");
    gone_row["user"]["is_active"] = json!(false);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("user.is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor(1, &house, 4, "Diagnostics"),
            gone_row
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = api_app(config.clone())
        .oneshot(request("GET", "/api/doctors", &token_for(&patient, &config), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "doctors": [{
                "id": 1,
                "name": "Gregory House",
                "email": "house@hospital.com",
                "department": "Diagnostics"
            }]
        })
    );
}

#[tokio::test]
async fn api_create_requires_admin() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let doctor = TestUser::doctor("house@hospital.com");
    mount_session_user(&server, &doctor).await;

    let response = api_app(config.clone())
        .oneshot(request(
            "POST",
            "/api/doctors",
            &token_for(&doctor, &config),
            Some(json!({"email": "a@b.com", "password": "password1", "name": "Ann", "department_id": 1})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Forbidden. Admin access required.");
}

#[tokio::test]
async fn api_create_reports_missing_fields() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let admin = TestUser::admin("admin@hospital.com");
    mount_session_user(&server, &admin).await;

    let response = api_app(config.clone())
        .oneshot(request(
            "POST",
            "/api/doctors",
            &token_for(&admin, &config),
            Some(json!({"email": "a@b.com", "name": "Ann"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Missing required fields: email, password, name, department_id"
    );
}

#[tokio::test]
async fn api_create_rejects_existing_email() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let admin = TestUser::admin("admin@hospital.com");
    mount_session_user(&server, &admin).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/departments"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::department(1, "Cardiology")
        ])))
        .mount(&server)
        .await;

    let existing = TestUser::patient("taken@hospital.com");
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.taken@hospital.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([existing.row()])))
        .mount(&server)
        .await;

    let response = api_app(config.clone())
        .oneshot(request(
            "POST",
            "/api/doctors",
            &token_for(&admin, &config),
            Some(json!({
                "email": "taken@hospital.com",
                "password": "password1",
                "name": "Ann Perkins",
                "department_id": 1
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Email already exists");
}

#[tokio::test]
async fn api_create_inserts_user_then_doctor() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let admin = TestUser::admin("admin@hospital.com");
    mount_session_user(&server, &admin).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::department(1, "Cardiology")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.ann@hospital.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let created = TestUser::doctor("ann@hospital.com").named("Ann Perkins");
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({"email": "ann@hospital.com", "role": "doctor"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([created.row()])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/doctors"))
        .and(body_partial_json(json!({"user_id": created.id, "department_id": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::doctor(9, &created, 1, "Cardiology")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = api_app(config.clone())
        .oneshot(request(
            "POST",
            "/api/doctors",
            &token_for(&admin, &config),
            Some(json!({
                "email": "Ann@Hospital.com",
                "password": "password1",
                "name": "Ann Perkins",
                "department_id": 1
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Doctor created successfully");
    assert_eq!(json["doctor"]["id"], 9);
    assert_eq!(json["doctor"]["email"], "ann@hospital.com");
}

#[tokio::test]
async fn api_get_hides_inactive_doctor() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@hospital.com");
    mount_session_user(&server, &patient).await;

    let doctor = TestUser::doctor("gone@hospital.com");
    let mut row = MockStoreResponses::doctor(7, &doctor, 1, "Cardiology");
    row["user"]["is_active"] = json!(false);
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = api_app(config.clone());
    let token = token_for(&patient, &config);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/doctors/7", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Doctor not found or is inactive.");

    let response = app
        .oneshot(request("GET", "/api/doctors/8", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_update_rejects_email_of_another_user() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let admin = TestUser::admin("admin@hospital.com");
    mount_session_user(&server, &admin).await;

    let doctor = TestUser::doctor("house@hospital.com");
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor(5, &doctor, 1, "Cardiology")
        ])))
        .mount(&server)
        .await;

    let other = TestUser::doctor("wilson@hospital.com");
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.wilson@hospital.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([other.row()])))
        .mount(&server)
        .await;

    let response = api_app(config.clone())
        .oneshot(request(
            "PUT",
            "/api/doctors/5",
            &token_for(&admin, &config),
            Some(json!({ "email": "wilson@hospital.com" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Email already in use by another user.");
}

#[tokio::test]
async fn api_delete_deactivates_account() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let admin = TestUser::admin("admin@hospital.com");
    mount_session_user(&server, &admin).await;

    let doctor = TestUser::doctor("house@hospital.com");
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor(5, &doctor, 1, "Cardiology")
        ])))
        .mount(&server)
        .await;
    mount_session_user(&server, &doctor).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", doctor.id)))
        .and(body_partial_json(json!({ "is_active": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor.row_with_status(false)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = api_app(config.clone())
        .oneshot(request("DELETE", "/api/doctors/5", &token_for(&admin, &config), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
