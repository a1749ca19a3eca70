use async_trait::async_trait;
use contracts::usecases::u101_apply_leave::{ApplyLeaveRequest, ApplyResponse, ForceApplyRequest};
use contracts::usecases::u102_capacity::{CapacityQuery, CapacityResponse, DriversResponse};
use contracts::usecases::u103_leave_notification::{ChatSendPayload, ScreenshotResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::shared::config::{normalize_api_base, ApiConfig};
use crate::shared::dates;

/// Ошибки транспорта (сеть, HTTP-статус, разбор JSON)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Операции бэкенда, нужные ядру
#[async_trait]
pub trait LeaveApi: Send + Sync {
    /// GET drivers
    async fn fetch_drivers(&self) -> Result<DriversResponse, ApiError>;

    /// GET capacity?from&to
    async fn fetch_capacity(&self, query: CapacityQuery) -> Result<CapacityResponse, ApiError>;

    /// POST apply
    async fn apply(&self, request: &ApplyLeaveRequest) -> Result<ApplyResponse, ApiError>;

    /// POST apply_force3
    async fn apply_force3(&self, request: &ForceApplyRequest) -> Result<ApplyResponse, ApiError>;

    /// GET calendar_screenshot?month
    async fn calendar_screenshot(&self, month: &str) -> Result<ScreenshotResponse, ApiError>;

    /// POST whatsapp_send
    async fn send_chat(&self, payload: &ChatSendPayload) -> Result<Value, ApiError>;
}

/// HTTP-клиент для API отпусков (JSON поверх аутентифицированного канала)
pub struct HttpLeaveApi {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpLeaveApi {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = normalize_api_base(&config.base, &config.origin)?;
        tracing::info!("Leave API base: {}", base_url);

        Ok(Self {
            client,
            base_url,
            auth_token: config
                .auth_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        resolve_endpoint(&self.base_url, endpoint)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.resolve_url(endpoint)?;
        tracing::debug!("GET {} {:?}", url, params);

        let request = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .query(params);
        let response = self
            .with_auth(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_response(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.resolve_url(endpoint)?;
        tracing::debug!("POST {}", url);

        let request = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(body);
        let response = self
            .with_auth(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_response(response).await
    }
}

#[async_trait]
impl LeaveApi for HttpLeaveApi {
    async fn fetch_drivers(&self) -> Result<DriversResponse, ApiError> {
        self.get("drivers", &[]).await
    }

    async fn fetch_capacity(&self, query: CapacityQuery) -> Result<CapacityResponse, ApiError> {
        let params = [("from", dates::iso(query.from)), ("to", dates::iso(query.to))];
        self.get("capacity", &params).await
    }

    async fn apply(&self, request: &ApplyLeaveRequest) -> Result<ApplyResponse, ApiError> {
        self.post("apply", request).await
    }

    async fn apply_force3(&self, request: &ForceApplyRequest) -> Result<ApplyResponse, ApiError> {
        self.post("apply_force3", request).await
    }

    async fn calendar_screenshot(&self, month: &str) -> Result<ScreenshotResponse, ApiError> {
        self.get("calendar_screenshot", &[("month", month.to_string())])
            .await
    }

    async fn send_chat(&self, payload: &ChatSendPayload) -> Result<Value, ApiError> {
        self.post("whatsapp_send", payload).await
    }
}

/// Endpoint relative to the base, which is treated as a directory
pub fn resolve_endpoint(base: &Url, endpoint: &str) -> Result<Url, ApiError> {
    let path = endpoint.strip_prefix('/').unwrap_or(endpoint);
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", endpoint, e)))
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    decode_body(status.as_u16(), status.is_success(), &text)
}

/// Разбор тела ответа
///
/// Empty or unparsable bodies decode as `{}`; non-2xx statuses surface the
/// body's `message` or "Request failed (<status>)".
pub fn decode_body<T: DeserializeOwned>(
    status: u16,
    success: bool,
    text: &str,
) -> Result<T, ApiError> {
    let data = if text.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_str::<Value>(text) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("Failed to parse JSON response: {}", e);
                Value::Object(Default::default())
            }
        }
    };

    if !success {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed ({})", status));
        return Err(ApiError::Status { status, message });
    }

    serde_json::from_value(data).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_endpoint_keeps_base_path() {
        let base = Url::parse("https://ops.example.com/atc/public").unwrap();
        assert_eq!(
            resolve_endpoint(&base, "/apply_force3").unwrap().as_str(),
            "https://ops.example.com/atc/public/apply_force3"
        );
        assert_eq!(
            resolve_endpoint(&base, "capacity").unwrap().as_str(),
            "https://ops.example.com/atc/public/capacity"
        );
    }

    #[test]
    fn test_empty_success_body_is_empty_object() {
        let response: ApplyResponse = decode_body(200, true, "").unwrap();
        assert!(!response.ok);
        assert!(response.applied_dates.is_empty());

        let ack: Value = decode_body(200, true, "not json").unwrap();
        assert_eq!(ack, serde_json::json!({}));
    }

    #[test]
    fn test_error_status_uses_server_message() {
        let err = decode_body::<Value>(403, false, r#"{"message":"Forbidden driver"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Forbidden driver");

        let err = decode_body::<Value>(502, false, "").unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Request failed (502)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_shape_is_parse_error() {
        let err = decode_body::<ApplyResponse>(200, true, "42").unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn test_null_errors_still_report_full() {
        let response: ApplyResponse =
            decode_body(200, true, r#"{"ok":false,"reason":"full","errors":null}"#).unwrap();
        assert!(response.is_capacity_conflict());
    }
}
