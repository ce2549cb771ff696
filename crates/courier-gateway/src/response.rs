// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response envelope and error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use courier_core::CourierError;

/// `{ "status": bool, "msg": string, "data"?: any }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(msg: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            msg: msg.into(),
            data: Some(data),
        }
    }
}

/// A [`CourierError`] rendered as an error envelope with `data.code`.
#[derive(Debug)]
pub struct ApiError(pub CourierError);

impl From<CourierError> for ApiError {
    fn from(err: CourierError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn client_message(&self) -> String {
        match &self.0 {
            CourierError::Storage { .. }
            | CourierError::Cache { .. }
            | CourierError::Config(_)
            | CourierError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "request failed");
        }
        let body = json!({
            "status": false,
            "msg": self.client_message(),
            "data": { "code": self.0.code() },
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_missing_data() {
        let resp: ApiResponse<()> = ApiResponse {
            status: true,
            msg: "ok".into(),
            data: None,
        };
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json, json!({"status": true, "msg": "ok"}));
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = ApiError(CourierError::Storage {
            source: "disk I/O error at /var/lib".into(),
        });
        assert_eq!(err.client_message(), "Internal server error");
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn circuit_errors_are_service_unavailable() {
        let resp = ApiError(CourierError::CircuitOpen).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
