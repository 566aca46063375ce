// libs/patient-cell/tests/profile_test.rs

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Local, NaiveDate};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::patient_profile_routes;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

async fn mount_patient(server: &MockServer, user: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user.row()])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::patient(3, user)
        ])))
        .mount(server)
        .await;
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn patient_reads_own_profile() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let patient = TestUser::patient("jane@mail.com").named("Jane Doe");
    mount_patient(&server, &patient).await;

    let token = JwtTestUtils::create_test_token(&patient, &config.session_secret, Some(1));
    let app = Router::new().nest("/patient", patient_profile_routes(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/patient/profile")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["patient"]["name"], "Jane Doe");
    assert_eq!(json["patient"]["contact_phone"], "555-0100");
    assert_eq!(json["patient"]["dob"], "1990-05-17");
}

#[tokio::test]
async fn patient_updates_phone_and_birth_date() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let patient = TestUser::patient("jane@mail.com");
    mount_patient(&server, &patient).await;

    let mut updated = MockStoreResponses::patient(3, &patient);
    updated["contact_phone"] = json!("555-0199");
    updated["dob"] = json!("1985-01-02");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", "eq.3"))
        .and(body_json(json!({"contact_phone": "555-0199", "dob": "1985-01-02"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .expect(1)
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&patient, &config.session_secret, Some(1));
    let app = Router::new().nest("/patient", patient_profile_routes(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/patient/profile")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"contact_phone": " 555-0199 ", "dob": "1985-01-02"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["message"], "Your profile has been updated.");
    assert_eq!(json["patient"]["contact_phone"], "555-0199");
}

#[tokio::test]
async fn future_birth_date_is_a_validation_error() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let patient = TestUser::patient("jane@mail.com");
    mount_patient(&server, &patient).await;

    let token = JwtTestUtils::create_test_token(&patient, &config.session_secret, Some(1));
    let app = Router::new().nest("/patient", patient_profile_routes(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/patient/profile")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(json!({"dob": "2999-01-01"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Date of birth cannot be in the future.");
}

#[tokio::test]
async fn birth_date_of_today_is_accepted() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let patient = TestUser::patient("newborn@mail.com");
    mount_patient(&server, &patient).await;

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let mut updated = MockStoreResponses::patient(3, &patient);
    updated["dob"] = json!(today);
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .and(body_json(json!({"dob": today})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .expect(1)
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&patient, &config.session_secret, Some(1));
    let app = Router::new().nest("/patient", patient_profile_routes(config));

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/patient/profile")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(json!({"dob": today}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn profile_age_uses_the_local_date() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let patient = TestUser::patient("jane@mail.com");
    mount_patient(&server, &patient).await;

    let token = JwtTestUtils::create_test_token(&patient, &config.session_secret, Some(1));
    let app = Router::new().nest("/patient", patient_profile_routes(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/patient/profile")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let dob = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();
    let expected = Local::now().date_naive().years_since(dob);
    assert_eq!(read_json(response).await["age"], json!(expected));
}

#[tokio::test]
async fn doctors_cannot_open_patient_profile() {
    let server = MockServer::start().await;
    let config = TestConfig::with_store(&server.uri()).to_arc();
    let doctor = TestUser::doctor("house@hospital.com");
    mount_patient(&server, &doctor).await;

    let token = JwtTestUtils::create_test_token(&doctor, &config.session_secret, Some(1));
    let app = Router::new().nest("/patient", patient_profile_routes(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/patient/profile")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json(response).await["error"], "This page is for patients only.");
}
