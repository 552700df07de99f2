//! Request extractors that report rejections in the API error shape

use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::error::AppError;

/// JSON request body; a body that fails to parse becomes `AppError::Validation`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        let field = match &rejection {
            JsonRejection::JsonDataError(_) => rejected_field(&message).map(String::from),
            _ => None,
        };

        AppError::validation(field.unwrap_or_else(|| "body".to_string()), message)
    }
}

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Field path serde reported for a data error, e.g. `sampled_on`
fn rejected_field(message: &str) -> Option<&str> {
    let (path, _) = message.strip_prefix(DATA_ERROR_PREFIX)?.split_once(": ")?;

    let is_path = path != "."
        && !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::IntoResponse,
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    use crate::services::sampling::CreateSamplingInput;

    async fn post_json(body: &'static str) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route(
            "/samplings",
            post(|AppJson(input): AppJson<CreateSamplingInput>| async move {
                input.fish_stock_id.to_string().into_response()
            }),
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/samplings")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[test]
    fn test_rejected_field() {
        assert_eq!(
            rejected_field(
                "Failed to deserialize the JSON body into the target type: sampled_on: input contains invalid characters at line 1 column 20"
            ),
            Some("sampled_on")
        );
        assert_eq!(
            rejected_field(
                "Failed to deserialize the JSON body into the target type: invalid type: string \"5\", expected i64"
            ),
            None
        );
        assert_eq!(rejected_field("Expected request with `Content-Type: application/json`"), None);
    }

    #[tokio::test]
    async fn test_unmatched_batch_shape_uses_error_body() {
        let (status, json) = post_json(
            r#"{
                "fish_stock_id": "6b1f2a57-0f9e-4a4e-9d55-3f1d2b0c8a10",
                "sampled_on": "2024-02-01",
                "batch_size": "5",
                "batch_weights": [420]
            }"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["field"], "body");
    }

    #[tokio::test]
    async fn test_syntax_error_uses_error_body() {
        let (status, json) = post_json(r#"{"fish_stock_id": "#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let (status, _) = post_json(
            r#"{
                "fish_stock_id": "6b1f2a57-0f9e-4a4e-9d55-3f1d2b0c8a10",
                "sampled_on": "2024-02-01",
                "fish_batches": "5:420"
            }"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
