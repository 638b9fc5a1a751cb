// HTTP client for the front-desk REST backend
// Reads are retried with exponential backoff and jitter; reservation and
// cancellation calls are sent once, since they are not idempotent.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use parking_lot::Mutex;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, FrontDeskApi};
use crate::backend::{ErrorBody, Guest, ReservationReceipt, ReservationRequest, RoomStatus};
use crate::calendar::RoomId;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_ms: u64,
    pub retry_config: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            auth_token: None,
            request_timeout_ms: 10_000,
            retry_config: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Build a configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// - `FRONTDESK_BASE_URL`: backend root, e.g. `http://localhost:8080/api`
    /// - `FRONTDESK_TOKEN`: bearer token sent with every request
    /// - `FRONTDESK_TIMEOUT_MS`: per-request timeout
    /// - `FRONTDESK_MAX_RETRIES`: retries for read requests
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();

        let base_url = env::var("FRONTDESK_BASE_URL").unwrap_or(defaults.base_url);
        let auth_token = env::var("FRONTDESK_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        let request_timeout_ms = match env::var("FRONTDESK_TIMEOUT_MS") {
            Ok(raw) => raw.parse().map_err(|_| {
                ClientError::ConfigError(format!(
                    "FRONTDESK_TIMEOUT_MS must be a number, got {raw}"
                ))
            })?,
            Err(_) => defaults.request_timeout_ms,
        };
        let mut retry_config = defaults.retry_config;
        if let Ok(raw) = env::var("FRONTDESK_MAX_RETRIES") {
            retry_config.max_retries = raw.parse().map_err(|_| {
                ClientError::ConfigError(format!(
                    "FRONTDESK_MAX_RETRIES must be a number, got {raw}"
                ))
            })?;
        }

        let config = Self {
            base_url,
            auth_token,
            request_timeout_ms,
            retry_config,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "base URL must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 100,
            max_backoff_ms: 2000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_retried: usize,
    pub requests_timeout: usize,
}

pub struct HttpFrontDeskClient {
    config: ClientConfig,
    http: reqwest::Client,
    stats: Mutex<ClientStats>,
}

impl HttpFrontDeskClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            config,
            http,
            stats: Mutex::new(ClientStats::default()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    // Helper to calculate exponential backoff with jitter
    pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
        let base_backoff_ms = (config.initial_backoff_ms as f64
            * config.backoff_multiplier.powf(retry_attempt as f64))
        .min(config.max_backoff_ms as f64);

        let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
        let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

        Duration::from_millis(backoff_ms as u64)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.endpoint(path));
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Bytes, ApiError> {
        self.stats.lock().requests_sent += 1;

        let outcome = match builder.send().await {
            Ok(response) => {
                let status = response.status();
                match response.bytes().await {
                    Ok(body) if status.is_success() => Ok(body),
                    Ok(body) => Err(error_from_response(status.as_u16(), &body)),
                    Err(e) => Err(self.transport_error(e)),
                }
            }
            Err(e) => Err(self.transport_error(e)),
        };

        let mut stats = self.stats.lock();
        match &outcome {
            Ok(_) => stats.requests_succeeded += 1,
            Err(ApiError::Timeout(_)) => {
                stats.requests_failed += 1;
                stats.requests_timeout += 1;
            }
            Err(_) => stats.requests_failed += 1,
        }
        outcome
    }

    // Idempotent reads only.
    async fn execute_with_retry<F>(&self, make_request: F) -> Result<Bytes, ApiError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let retry_config = &self.config.retry_config;
        let mut attempt = 0;
        loop {
            match self.execute(make_request()).await {
                Err(error) if error.is_retryable() && attempt < retry_config.max_retries => {
                    let backoff = Self::calculate_backoff(attempt, retry_config);
                    warn!(%error, attempt, ?backoff, "retrying backend read");
                    self.stats.lock().requests_retried += 1;
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.config.request_timeout_ms)
        } else if error.is_decode() {
            ApiError::DecodeError(error.to_string())
        } else {
            ApiError::NetworkError(error.to_string())
        }
    }
}

pub fn error_from_response(status_code: u16, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message);
    ApiError::from_status(status_code, message)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::DecodeError(e.to_string()))
}

// A 404 from the guest lookup means the guest is not registered yet.
fn guest_from_lookup(outcome: Result<Bytes, ApiError>) -> Result<Option<Guest>, ApiError> {
    match outcome {
        Ok(body) => decode(&body).map(Some),
        Err(ApiError::NotFound(_)) => Ok(None),
        Err(error) => Err(error),
    }
}

// The backend may answer reservations with an empty body or plain text.
fn decode_receipt(body: &[u8]) -> ReservationReceipt {
    serde_json::from_slice(body).unwrap_or_default()
}

#[async_trait]
impl FrontDeskApi for HttpFrontDeskClient {
    async fn room_states(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RoomStatus>, ApiError> {
        let from = from.format(DATE_FORMAT).to_string();
        let to = to.format(DATE_FORMAT).to_string();
        let body = self
            .execute_with_retry(|| {
                self.request(Method::GET, "habitaciones/estado")
                    .query(&[("desde", from.as_str()), ("hasta", to.as_str())])
            })
            .await?;
        decode(&body)
    }

    async fn reserve(&self, request: &ReservationRequest) -> Result<ReservationReceipt, ApiError> {
        debug!(rooms = ?request.rooms, check_in = %request.check_in, "POST reservas");
        let body = self
            .execute(self.request(Method::POST, "reservas").json(request))
            .await?;
        Ok(decode_receipt(&body))
    }

    async fn occupy(&self, request: &ReservationRequest) -> Result<ReservationReceipt, ApiError> {
        debug!(rooms = ?request.rooms, check_in = %request.check_in, "POST reservas/ocupar");
        let body = self
            .execute(self.request(Method::POST, "reservas/ocupar").json(request))
            .await?;
        Ok(decode_receipt(&body))
    }

    async fn cancel_date(&self, room_id: RoomId, date: NaiveDate) -> Result<(), ApiError> {
        let date = date.format(DATE_FORMAT).to_string();
        let room_id = room_id.to_string();
        self.execute(
            self.request(Method::DELETE, "reservas/cancelar")
                .query(&[("idHabitacion", room_id.as_str()), ("fecha", date.as_str())]),
        )
        .await?;
        Ok(())
    }

    async fn find_guest_by_dni(&self, dni: &str) -> Result<Option<Guest>, ApiError> {
        let outcome = self
            .execute_with_retry(|| {
                self.request(Method::GET, "huespedes/buscar-por-dni")
                    .query(&[("dni", dni)])
            })
            .await;
        guest_from_lookup(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpFrontDeskClient {
        HttpFrontDeskClient::new(ClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = client("http://hotel.local/api/");
        assert_eq!(
            client.endpoint("/habitaciones/estado"),
            "http://hotel.local/api/habitaciones/estado"
        );
        assert_eq!(
            client.endpoint("reservas/ocupar"),
            "http://hotel.local/api/reservas/ocupar"
        );
    }

    #[test]
    fn test_config_validation() {
        let bad_url = ClientConfig {
            base_url: "hotel.local".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpFrontDeskClient::new(bad_url),
            Err(ClientError::ConfigError(_))
        ));

        let zero_timeout = ClientConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
        assert_eq!(
            ClientConfig::default().request_timeout(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let config = RetryConfig {
            max_retries: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 1000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        };

        for _ in 0..50 {
            let first = HttpFrontDeskClient::calculate_backoff(0, &config);
            assert!(first >= Duration::from_millis(95) && first <= Duration::from_millis(105));

            let third = HttpFrontDeskClient::calculate_backoff(2, &config);
            assert!(third >= Duration::from_millis(380) && third <= Duration::from_millis(420));

            let capped = HttpFrontDeskClient::calculate_backoff(10, &config);
            assert!(capped <= Duration::from_millis(1050));
        }
    }

    #[test]
    fn test_error_from_response_reads_backend_message() {
        let err = error_from_response(422, br#"{"mensaje":"Capacidad excedida"}"#);
        assert_eq!(err.message(), "Capacidad excedida");
        assert!(matches!(
            err,
            ApiError::ApiResponseError {
                status_code: 422,
                ..
            }
        ));

        let err = error_from_response(502, b"<html>Bad Gateway</html>");
        assert_eq!(err.message(), crate::api::GENERIC_CONNECTIVITY_MESSAGE);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_decode_receipt_is_lenient() {
        assert_eq!(decode_receipt(b""), ReservationReceipt::default());
        assert_eq!(decode_receipt(br#"{"id":42}"#).id, Some(42));
        assert!(decode::<Vec<RoomStatus>>(b"not json").is_err());
    }

    #[test]
    fn test_guest_lookup_maps_not_found_to_new_guest() {
        let missing =
            error_from_response(404, r#"{"mensaje":"Huésped no encontrado"}"#.as_bytes());
        assert_eq!(guest_from_lookup(Err(missing)), Ok(None));

        let body = Bytes::from_static(
            br#"{"id":5,"dni":"30111222","nombre":"Ana","apellido":"Paz"}"#,
        );
        let guest = guest_from_lookup(Ok(body)).unwrap().unwrap();
        assert_eq!(guest.id, Some(5));
        assert_eq!(guest.first_name, "Ana");

        let failure = error_from_response(503, b"");
        assert!(matches!(
            guest_from_lookup(Err(failure)),
            Err(ApiError::ApiResponseError {
                status_code: 503,
                ..
            })
        ));
    }

    // Nothing listens on port 9 locally, so the read fails fast and is retried.
    #[tokio::test]
    async fn test_unreachable_backend_counts_retries() {
        let client = HttpFrontDeskClient::new(ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 500,
            retry_config: RetryConfig {
                max_retries: 1,
                initial_backoff_ms: 1,
                max_backoff_ms: 5,
                backoff_multiplier: 1.0,
                jitter_factor: 0.0,
            },
            ..Default::default()
        })
        .unwrap();

        let from = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let outcome = client.room_states(from, from).await;
        assert!(outcome.is_err());

        let stats = client.stats();
        assert_eq!(stats.requests_sent, 2);
        assert_eq!(stats.requests_retried, 1);
        assert_eq!(stats.requests_failed, 2);
        assert_eq!(stats.requests_succeeded, 0);
    }
}
