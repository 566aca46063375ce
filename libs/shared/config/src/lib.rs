use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;
pub const DEFAULT_REMEMBER_ME_TTL_DAYS: i64 = 30;
pub const SESSION_TTL_HOURS_RANGE: RangeInclusive<i64> = 1..=24 * 31;
pub const REMEMBER_ME_TTL_DAYS_RANGE: RangeInclusive<i64> = 1..=365;
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@hospital.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub remember_me_ttl_days: i64,
    pub bind_addr: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: required_var("SUPABASE_URL"),
            supabase_anon_key: required_var("SUPABASE_ANON_PUBLIC_KEY"),
            supabase_service_role_key: required_var("SUPABASE_SERVICE_ROLE_KEY"),
            session_secret: required_var("SESSION_SECRET"),
            session_ttl_hours: ranged_var(
                "SESSION_TTL_HOURS",
                DEFAULT_SESSION_TTL_HOURS,
                SESSION_TTL_HOURS_RANGE,
            ),
            remember_me_ttl_days: ranged_var(
                "REMEMBER_ME_TTL_DAYS",
                DEFAULT_REMEMBER_ME_TTL_DAYS,
                REMEMBER_ME_TTL_DAYS_RANGE,
            ),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
                warn!("ADMIN_PASSWORD not set, using the default seed password");
                DEFAULT_ADMIN_PASSWORD.to_string()
            }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_service_role_key.is_empty()
            && !self.session_secret.is_empty()
    }
}

fn required_var(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", name);
        String::new()
    })
}

fn parsed_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Like `parsed_var`, but values outside `range` also fall back to `default`.
fn ranged_var(name: &str, default: i64, range: RangeInclusive<i64>) -> i64 {
    let value = parsed_var(name, default);
    if range.contains(&value) {
        value
    } else {
        warn!(
            "{} = {} is outside {}..={}, using default {}",
            name,
            value,
            range.start(),
            range.end(),
            default
        );
        default
    }
}
