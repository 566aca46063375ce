use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use doctor_cell::DepartmentService;
use shared_config::AppConfig;
use shared_database::{NewUser, SupabaseClient, UserStore};
use shared_models::auth::Role;
use shared_utils::password;

pub const DEFAULT_ADMIN_NAME: &str = "Admin User";

/// Departments created on a fresh install.
pub const SAMPLE_DEPARTMENTS: [(&str, &str); 4] = [
    ("Cardiology", "Heart and blood vessel issues."),
    ("Neurology", "Nervous system disorders."),
    ("Pediatrics", "Medical care for infants, children, and adolescents."),
    ("Orthopedics", "Musculoskeletal system issues."),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub admin_created: bool,
    pub departments_created: usize,
}

/// Creates the default admin and the sample departments. Safe to run repeatedly.
pub struct SeedService {
    users: UserStore,
    departments: DepartmentService,
    admin_email: String,
    admin_password: String,
}

impl SeedService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            users: UserStore::new(Arc::clone(&supabase)),
            departments: DepartmentService::with_client(supabase),
            admin_email: config.admin_email.clone(),
            admin_password: config.admin_password.clone(),
        }
    }

    pub async fn run(&self) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        if self.users.find_by_email(&self.admin_email).await?.is_none() {
            info!("Creating default admin user: {}", self.admin_email);
            let password_hash = password::hash_password(&self.admin_password)
                .map_err(|e| anyhow!("Password hashing failed: {}", e))?;
            self.users
                .insert(NewUser {
                    email: self.admin_email.clone(),
                    name: DEFAULT_ADMIN_NAME.to_string(),
                    role: Role::Admin,
                    password_hash,
                })
                .await?;
            report.admin_created = true;
        } else {
            info!("Admin user already exists.");
        }

        if self.departments.count_departments().await? == 0 {
            info!("Creating sample departments...");
            for (name, description) in SAMPLE_DEPARTMENTS {
                self.departments.create_department(name, Some(description)).await?;
                report.departments_created += 1;
            }
        } else {
            info!("Departments already exist.");
        }

        Ok(report)
    }
}
