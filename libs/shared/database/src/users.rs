use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use shared_models::auth::{Role, UserRecord};

use crate::supabase::{encode, SupabaseClient};

/// Emails are stored trimmed and lower-cased so uniqueness checks agree with
/// what users type at login.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
}

pub struct UserStore {
    supabase: Arc<SupabaseClient>,
}

impl UserStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>> {
        debug!("Fetching user {}", user_id);
        self.supabase
            .select_one(&format!("users?id=eq.{}", user_id))
            .await
    }

    /// The user behind a session, or `None` once the account is gone or deactivated.
    pub async fn find_active_by_id(&self, user_id: i64) -> Result<Option<UserRecord>> {
        Ok(self.find_by_id(user_id).await?.filter(|record| record.is_active))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let email = normalize_email(email);
        debug!("Fetching user by email {}", email);
        self.supabase
            .select_one(&format!("users?email=eq.{}", encode(&email)))
            .await
    }

    /// True when `email` belongs to a user other than `exclude_user_id`.
    pub async fn email_in_use(&self, email: &str, exclude_user_id: Option<i64>) -> Result<bool> {
        Ok(match self.find_by_email(email).await? {
            Some(existing) => Some(existing.id) != exclude_user_id,
            None => false,
        })
    }

    pub async fn insert(&self, new_user: NewUser) -> Result<UserRecord> {
        let email = normalize_email(&new_user.email);
        debug!("Creating {} account for {}", new_user.role, email);

        self.supabase
            .insert(
                "users",
                json!({
                    "email": email,
                    "name": new_user.name.trim(),
                    "role": new_user.role,
                    "password_hash": new_user.password_hash,
                    "is_active": true
                }),
            )
            .await
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<UserRecord> {
        let mut changes = Map::new();
        if let Some(name) = name {
            changes.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(email) = email {
            changes.insert("email".to_string(), json!(normalize_email(email)));
        }

        if changes.is_empty() {
            return self
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| anyhow!("User {} not found", user_id));
        }

        self.update_one(user_id, Value::Object(changes)).await
    }

    pub async fn set_active(&self, user_id: i64, active: bool) -> Result<UserRecord> {
        debug!("Setting user {} active={}", user_id, active);
        self.update_one(user_id, json!({ "is_active": active })).await
    }

    pub async fn delete(&self, user_id: i64) -> Result<()> {
        debug!("Deleting user {}", user_id);
        self.supabase
            .delete(&format!("users?id=eq.{}", user_id))
            .await?;
        Ok(())
    }

    async fn update_one(&self, user_id: i64, changes: Value) -> Result<UserRecord> {
        let mut rows: Vec<UserRecord> = self
            .supabase
            .update(&format!("users?id=eq.{}", user_id), changes)
            .await?;

        if rows.is_empty() {
            return Err(anyhow!("User {} not found", user_id));
        }
        Ok(rows.swap_remove(0))
    }
}
