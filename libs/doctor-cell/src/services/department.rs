use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::Department;

pub struct DepartmentService {
    supabase: Arc<SupabaseClient>,
}

impl DepartmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// All departments, alphabetically.
    pub async fn list_departments(&self) -> Result<Vec<Department>> {
        debug!("Listing departments");
        self.supabase.select("departments?order=name.asc").await
    }

    pub async fn get_department(&self, department_id: i64) -> Result<Option<Department>> {
        self.supabase
            .select_one(&format!("departments?id=eq.{}", department_id))
            .await
    }

    pub async fn count_departments(&self) -> Result<usize> {
        self.supabase.count("departments", None).await
    }

    pub async fn create_department(&self, name: &str, description: Option<&str>) -> Result<Department> {
        debug!("Creating department {}", name);
        self.supabase
            .insert(
                "departments",
                json!({
                    "name": name,
                    "description": description
                }),
            )
            .await
    }
}
