use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

use crate::jwt::issue_token;
use crate::password::hash_password;

static NEXT_ID: AtomicI64 = AtomicI64::new(1000);

fn next_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub struct TestConfig {
    pub session_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            session_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_role_key: "test-service-role-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_store(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
            session_secret: self.session_secret.clone(),
            session_ttl_hours: 12,
            remember_me_ttl_days: 30,
            bind_addr: "127.0.0.1:0".to_string(),
            admin_email: "admin@hospital.com".to_string(),
            admin_password: "admin123".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        let local = email.split('@').next().unwrap_or(email);
        Self {
            id: next_id(),
            email: email.to_string(),
            name: format!("Test {}", local),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            is_active: true,
        }
    }

    /// `users` row as the store returns it.
    pub fn row(&self) -> Value {
        self.row_with_status(true)
    }

    pub fn row_with_status(&self, active: bool) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "name": self.name,
            "role": self.role,
            "is_active": active,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$placeholder"
        })
    }

    pub fn row_with_password(&self, password: &str, active: bool) -> Value {
        let mut row = self.row_with_status(active);
        row["password_hash"] = json!(hash_password(password).expect("hashing succeeds"));
        row
    }

    /// Embedded form used inside doctor/patient/appointment selects.
    pub fn embedded(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "name": self.name,
            "role": self.role,
            "is_active": true
        })
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        issue_token(&user.to_user(), secret, Duration::hours(exp_hours.unwrap_or(24)))
            .expect("test secret is set")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn department(id: i64, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "description": format!("{} department", name)
        })
    }

    pub fn doctor(id: i64, user: &TestUser, department_id: i64, department_name: &str) -> Value {
        Self::doctor_with_availability(id, user, department_id, department_name, None)
    }

    pub fn doctor_with_availability(
        id: i64,
        user: &TestUser,
        department_id: i64,
        department_name: &str,
        availability: Option<&str>,
    ) -> Value {
        json!({
            "id": id,
            "user_id": user.id,
            "department_id": department_id,
            "availability": availability,
            "user": user.embedded(),
            "department": Self::department(department_id, department_name)
        })
    }

    pub fn patient(id: i64, user: &TestUser) -> Value {
        json!({
            "id": id,
            "user_id": user.id,
            "contact_phone": "555-0100",
            "dob": "1990-05-17",
            "user": user.embedded()
        })
    }

    pub fn appointment(
        id: i64,
        patient_id: i64,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": date.format("%Y-%m-%d").to_string(),
            "appointment_time": time.format("%H:%M:%S").to_string(),
            "status": status
        })
    }

    pub fn treatment(id: i64, appointment_id: i64, diagnosis: &str) -> Value {
        json!({
            "id": id,
            "appointment_id": appointment_id,
            "diagnosis": diagnosis,
            "prescription": "Rest and fluids",
            "notes": null
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
