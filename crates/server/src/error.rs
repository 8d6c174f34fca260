//! Maps `docqa_core::Error` onto HTTP status codes at the API boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

pub struct ApiError(pub docqa_core::Error);

impl From<docqa_core::Error> for ApiError {
    fn from(err: docqa_core::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use docqa_core::Error::*;
        let status = match &self.0 {
            InvalidInput(_) | SchemaInvalid(_) => StatusCode::BAD_REQUEST,
            MixedCurrency { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ExternalTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ExternalUnavailable(_) => StatusCode::BAD_GATEWAY,
            StoreConflict(_) => StatusCode::CONFLICT,
            NotFound(_) => StatusCode::NOT_FOUND,
            ExtractionPartial(_) | Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
