//! Custom JSON extractor with gateway-shaped error responses
//!
//! Wraps Axum's `Json` extractor so that malformed request bodies come back
//! as `{"error": "..."}` with a useful status code instead of Axum's plain
//! text rejection.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// Rejection wrapper producing an `error`-field JSON body
pub struct GatewayJsonRejection(JsonRejection);

impl IntoResponse for GatewayJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            JsonRejection::JsonSyntaxError(_) => (StatusCode::BAD_REQUEST, self.0.body_text()),
            JsonRejection::JsonDataError(_) => (StatusCode::BAD_REQUEST, self.0.body_text()),
            JsonRejection::MissingJsonContentType(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content-Type must be application/json".to_string(),
            ),
            _ => (StatusCode::BAD_REQUEST, self.0.body_text()),
        };
        let body = Json(serde_json::json!({ "error": message }));
        (status, body).into_response()
    }
}

/// JSON extractor whose rejections match the gateway's error envelope
pub struct GatewayJson<T>(pub T);

impl<S, T> FromRequest<S> for GatewayJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = GatewayJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(GatewayJson(value)),
            Err(rejection) => Err(GatewayJsonRejection(rejection)),
        }
    }
}
