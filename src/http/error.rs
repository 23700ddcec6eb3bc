//! Mapping of domain errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::aggregation::BillingError;
use crate::routing::RoutingError;

/// Every error either server returns to a client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("{0}")]
    BadRequest(String),

    #[error("no available instance of '{0}'")]
    ServiceUnavailable(String),

    #[error("upstream request failed")]
    BadGateway,

    #[error("upstream did not answer in time")]
    GatewayTimeout,
}

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Billing(BillingError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Billing(BillingError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Routing(RoutingError::NoRoute(_)) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }
        let body = ErrorBody {
            status: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
