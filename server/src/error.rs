use arcmap_shared::SelectionError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Handler error: a core error surfaced to the HTTP caller.
#[derive(Debug)]
pub struct ApiError(pub SelectionError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            SelectionError::InvalidColor(_) | SelectionError::InvalidDocument(_) => {
                StatusCode::BAD_REQUEST
            }
            SelectionError::CapacityExceeded { .. } => StatusCode::CONFLICT,
            SelectionError::UnknownRegion { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl From<SelectionError> for ApiError {
    fn from(err: SelectionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use arcmap_shared::{Category, Color};

    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (
                SelectionError::InvalidColor("#000001".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                SelectionError::InvalidDocument("missing `tiles` object".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                SelectionError::CapacityExceeded {
                    color: Color::new("#DC143C"),
                    max: 50,
                },
                StatusCode::CONFLICT,
            ),
            (
                SelectionError::UnknownRegion {
                    category: Category::Gate,
                    key: "gate99".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
