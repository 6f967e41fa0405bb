//! The API client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::dto::{CheckInData, CheckInMethod, CheckOutData, EmployeeData, QueryParams, TenantData, TimeRange, VisitorData};
use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://apim-sfam-core.azure-api.net/sfam/v1";

/// Supplies bearer tokens and reacts to rejected ones.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// `None` sends the request without an `Authorization` header.
    async fn access_token(&self) -> Option<String>;

    /// Called once for every 401 response, before the error is returned.
    async fn on_unauthorized(&self);
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token_source", &self.tokens.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: None,
        }
    }

    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send `req` with the bearer token attached and decode the JSON body.
    /// An empty body decodes as JSON `null`.
    async fn send<T: DeserializeOwned>(&self, mut req: RequestBuilder) -> Result<T, ApiError> {
        if let Some(tokens) = &self.tokens {
            if let Some(token) = tokens.access_token().await {
                req = req.bearer_auth(token);
            }
        }

        let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %resp.url(), "API rejected credentials; signing out");
            if let Some(tokens) = &self.tokens {
                tokens.on_unauthorized().await;
            }
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "API returned an error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Generic request against a path under the base URL.
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut req = self.http.request(method, self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        self.send(req).await
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.http.get(self.url(path))).await
    }

    async fn get_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Value, ApiError> {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.send(self.http.put(self.url(path)).json(body)).await
    }

    async fn list(&self, path: &str, params: Option<&QueryParams>) -> Result<Value, ApiError> {
        let mut req = self.http.get(self.url(path));
        if let Some(params) = params {
            req = req.query(params).query(&params.extra);
        }
        self.send(req).await
    }

    // Tenants

    pub async fn create_tenant(&self, data: &TenantData) -> Result<Value, ApiError> {
        self.post("/tenants", data).await
    }

    pub async fn get_tenant(&self, tenant_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/tenants/{tenant_id}")).await
    }

    pub async fn update_tenant(&self, tenant_id: &str, data: &TenantData) -> Result<Value, ApiError> {
        self.put(&format!("/tenants/{tenant_id}"), data).await
    }

    pub async fn list_tenants(&self) -> Result<Value, ApiError> {
        self.get("/tenants").await
    }

    // Visitors

    pub async fn register_visitor(&self, data: &VisitorData) -> Result<Value, ApiError> {
        self.post("/visitors", data).await
    }

    pub async fn list_visitors(&self, params: Option<&QueryParams>) -> Result<Value, ApiError> {
        self.list("/visitors", params).await
    }

    pub async fn get_visitor(&self, visitor_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/visitors/{visitor_id}")).await
    }

    pub async fn check_in_visitor(&self, visitor_id: &str, data: &CheckInData) -> Result<Value, ApiError> {
        self.post(&format!("/visitors/{visitor_id}/check-in"), data).await
    }

    pub async fn check_in_by_qr_code(&self, qr_code_data: &str, data: &CheckInData) -> Result<Value, ApiError> {
        let body = with_method(data, CheckInMethod::QrCode, "qrCodeData", qr_code_data)?;
        self.post("/visitors/check-in/qrcode", &body).await
    }

    pub async fn check_in_by_face(&self, face_image_base64: &str, data: &CheckInData) -> Result<Value, ApiError> {
        let body = with_method(data, CheckInMethod::FaceRecognition, "faceImageBase64", face_image_base64)?;
        self.post("/visitors/check-in/face-recognition", &body).await
    }

    pub async fn find_visitor_by_email(&self, email: &str) -> Result<Value, ApiError> {
        self.get_query("/visitors/lookup", &[("email", email)]).await
    }

    /// The body is omitted when `data` is `None`.
    pub async fn check_out_visitor(&self, visitor_id: &str, data: Option<&CheckOutData>) -> Result<Value, ApiError> {
        let path = format!("/visitors/{visitor_id}/check-out");
        match data {
            Some(data) => self.post(&path, data).await,
            None => self.send(self.http.post(self.url(&path))).await,
        }
    }

    // Employees

    pub async fn list_employees(&self, params: Option<&QueryParams>) -> Result<Value, ApiError> {
        self.list("/employees", params).await
    }

    pub async fn create_employee(&self, data: &EmployeeData) -> Result<Value, ApiError> {
        self.post("/employees", data).await
    }

    pub async fn update_employee(&self, employee_id: &str, data: &EmployeeData) -> Result<Value, ApiError> {
        self.put(&format!("/employees/{employee_id}"), data).await
    }

    pub async fn get_employee(&self, employee_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/employees/{employee_id}")).await
    }

    // Analytics

    pub async fn dashboard_stats(&self, tenant_id: &str) -> Result<Value, ApiError> {
        self.get_query("/analytics/dashboard", &[("tenantId", tenant_id)]).await
    }

    pub async fn visitor_stats(&self, tenant_id: &str, range: TimeRange) -> Result<Value, ApiError> {
        self.get_query("/analytics/visitors", &[("tenantId", tenant_id), ("timeRange", range.as_str())])
            .await
    }

    pub async fn employee_stats(&self, tenant_id: &str, range: TimeRange) -> Result<Value, ApiError> {
        self.get_query("/analytics/employees", &[("tenantId", tenant_id), ("timeRange", range.as_str())])
            .await
    }
}

/// Check-in body with an extra payload field; the method always matches the
/// endpoint.
fn with_method(data: &CheckInData, method: CheckInMethod, key: &str, value: &str) -> Result<Value, ApiError> {
    let mut body = serde_json::to_value(data).map_err(|e| ApiError::Decode(e.to_string()))?;
    if let Value::Object(map) = &mut body {
        map.insert(key.to_string(), Value::String(value.to_string()));
        map.insert("method".to_string(), json!(method));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn urls_join_without_double_slashes() {
        let client = ApiClient::new("http://localhost:9/sfam/v1/");
        assert_eq!(client.url("/visitors"), "http://localhost:9/sfam/v1/visitors");
        assert_eq!(client.url("tenants/t-1"), "http://localhost:9/sfam/v1/tenants/t-1");
    }

    #[test]
    fn qr_body_overrides_method() {
        let data = CheckInData::manual(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap());
        let body = with_method(&data, CheckInMethod::QrCode, "qrCodeData", "visitor-1").unwrap();
        assert_eq!(body["method"], json!("qr_code"));
        assert_eq!(body["qrCodeData"], json!("visitor-1"));
    }
}
