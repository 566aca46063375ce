use anyhow::{anyhow, Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Thin client for the PostgREST gateway in front of the hospital database.
///
/// Every call runs with the service role key; row-level authorization is done
/// by the role gates in front of the handlers, not by the database.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_role_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key).context("Invalid anon key header")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_key))
                .context("Invalid service key header")?,
        );

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                409 => anyhow!("Constraint violation: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// GET rows from `path` (table plus PostgREST query string).
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<Value> = self.request(Method::GET, &rest_path(path), None).await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    pub async fn select_one<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut rows = self.select::<T>(path).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }

    /// INSERT a single row and return its stored representation.
    pub async fn insert<T>(&self, table: &str, row: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let result: Vec<Value> = self
            .request_with_headers(Method::POST, &rest_path(table), Some(row), Some(representation()))
            .await?;

        let first = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Insert into {} returned no rows", table))?;
        Ok(serde_json::from_value(first)?)
    }

    /// PATCH the rows matched by `path` (table plus filters, e.g. `users?id=eq.4`).
    pub async fn update<T>(&self, path: &str, changes: Value) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = rest_path(path);
        let result: Vec<Value> = self
            .request_with_headers(Method::PATCH, &path, Some(changes), Some(representation()))
            .await?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    pub async fn delete(&self, path: &str) -> Result<usize> {
        let path = rest_path(path);
        let result: Vec<Value> = self
            .request_with_headers(Method::DELETE, &path, None, Some(representation()))
            .await?;
        Ok(result.len())
    }

    /// Number of rows in `table` matching the optional filter.
    pub async fn count(&self, table: &str, filter: Option<&str>) -> Result<usize> {
        let path = match filter {
            Some(filter) => format!("{}?select=id&{}", table, filter),
            None => format!("{}?select=id", table),
        };
        let rows: Vec<Value> = self.request(Method::GET, &rest_path(&path), None).await?;
        Ok(rows.len())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// Percent-encode a value for use inside a PostgREST filter.
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn rest_path(path: &str) -> String {
    format!("/rest/v1/{}", path)
}

fn representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Row {
        id: i64,
        name: String,
    }

    fn config(url: String) -> AppConfig {
        AppConfig {
            supabase_url: url,
            supabase_anon_key: "anon".to_string(),
            supabase_service_role_key: "service".to_string(),
            session_secret: "secret".to_string(),
            session_ttl_hours: 12,
            remember_me_ttl_days: 30,
            bind_addr: "127.0.0.1:0".to_string(),
            admin_email: "admin@hospital.com".to_string(),
            admin_password: "admin123".to_string(),
        }
    }

    #[tokio::test]
    async fn select_sends_keys_and_parses_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/departments"))
            .and(query_param("order", "name.asc"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer service"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Cardiology"},
                {"id": 2, "name": "Neurology"}
            ])))
            .mount(&server)
            .await;

        let client = SupabaseClient::new(&config(server.uri()));
        let rows: Vec<Row> = client.select("departments?order=name.asc").await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].name, "Neurology");
    }

    #[tokio::test]
    async fn insert_requests_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/departments"))
            .and(header("prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                {"id": 9, "name": "Oncology"}
            ])))
            .mount(&server)
            .await;

        let client = SupabaseClient::new(&config(server.uri()));
        let row: Row = client.insert("departments", json!({"name": "Oncology"})).await.unwrap();
        assert_eq!(row.id, 9);
    }

    #[tokio::test]
    async fn error_status_becomes_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/doctors"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = SupabaseClient::new(&config(server.uri()));
        let err = client.select::<Row>("doctors").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn count_selects_ids_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("select", "id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1}, {"id": 2}, {"id": 3}
            ])))
            .mount(&server)
            .await;

        let client = SupabaseClient::new(&config(server.uri()));
        assert_eq!(client.count("appointments", None).await.unwrap(), 3);
    }

    #[test]
    fn encode_escapes_plus_and_at() {
        assert_eq!(encode("a+b@x.com"), "a%2Bb%40x.com");
    }
}
