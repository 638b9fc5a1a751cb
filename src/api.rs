// Front-desk backend contract

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::backend::{Guest, ReservationReceipt, ReservationRequest, RoomStatus};
use crate::calendar::RoomId;

pub const GENERIC_CONNECTIVITY_MESSAGE: &str =
    "Could not reach the front-desk backend, check the connection";

// Errors reported by the backend or the transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError {
        status_code: u16,
        message: String,
        is_retryable: bool,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl ApiError {
    // Map a non-2xx status to an error, using the backend message when there
    // is one.
    pub fn from_status(status_code: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_CONNECTIVITY_MESSAGE.to_string());

        if status_code == 404 {
            return ApiError::NotFound(message);
        }

        ApiError::ApiResponseError {
            status_code,
            message,
            is_retryable: status_code >= 500 || status_code == 429,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::NetworkError(_) | ApiError::Timeout(_) => true,
            ApiError::ApiResponseError { is_retryable, .. } => *is_retryable,
            ApiError::NotFound(_) | ApiError::DecodeError(_) => false,
        }
    }

    // Human-readable text for the operator.
    pub fn message(&self) -> &str {
        match self {
            ApiError::ApiResponseError { message, .. } | ApiError::NotFound(message) => message,
            ApiError::NetworkError(_) | ApiError::Timeout(_) | ApiError::DecodeError(_) => {
                GENERIC_CONNECTIVITY_MESSAGE
            }
        }
    }
}

// RESERVE creates tentative holds, OCCUPY creates active check-ins with a
// named roster per room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationMode {
    Reserve,
    Occupy,
}

#[async_trait]
pub trait FrontDeskApi: Send + Sync + 'static {
    // GET /habitaciones/estado, both ends inclusive
    async fn room_states(&self, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<RoomStatus>, ApiError>;

    // POST /reservas
    async fn reserve(&self, request: &ReservationRequest) -> Result<ReservationReceipt, ApiError>;

    // POST /reservas/ocupar
    async fn occupy(&self, request: &ReservationRequest) -> Result<ReservationReceipt, ApiError>;

    // DELETE /reservas/cancelar for a single night
    async fn cancel_date(&self, room_id: RoomId, date: NaiveDate) -> Result<(), ApiError>;

    // GET /huespedes/buscar-por-dni; Ok(None) when the guest does not exist yet
    async fn find_guest_by_dni(&self, dni: &str) -> Result<Option<Guest>, ApiError>;

    async fn create_range(
        &self,
        mode: ReservationMode,
        request: &ReservationRequest,
    ) -> Result<ReservationReceipt, ApiError> {
        match mode {
            ReservationMode::Reserve => self.reserve(request).await,
            ReservationMode::Occupy => self.occupy(request).await,
        }
    }
}

#[async_trait]
impl<T: FrontDeskApi + ?Sized> FrontDeskApi for Arc<T> {
    async fn room_states(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RoomStatus>, ApiError> {
        (**self).room_states(from, to).await
    }

    async fn reserve(&self, request: &ReservationRequest) -> Result<ReservationReceipt, ApiError> {
        (**self).reserve(request).await
    }

    async fn occupy(&self, request: &ReservationRequest) -> Result<ReservationReceipt, ApiError> {
        (**self).occupy(request).await
    }

    async fn cancel_date(&self, room_id: RoomId, date: NaiveDate) -> Result<(), ApiError> {
        (**self).cancel_date(room_id, date).await
    }

    async fn find_guest_by_dni(&self, dni: &str) -> Result<Option<Guest>, ApiError> {
        (**self).find_guest_by_dni(dni).await
    }
}
