use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

/// Pagination envelope returned next to list results.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub page: i64,
    /// Total number of rows in the store.
    pub count: i64,
    /// Number of items in this page.
    pub size: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn data(data: T) -> Self {
        Self {
            message: None,
            data: Some(data),
            meta: None,
        }
    }

    pub fn paginated(data: T, meta: PageMeta) -> Self {
        Self {
            message: None,
            data: Some(data),
            meta: Some(meta),
        }
    }

    pub fn message(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            data: None,
            meta: None,
        }
    }
}

pub struct ApiSuccess<T>(pub T, pub StatusCode);

impl<T> IntoResponse for ApiSuccess<ApiResponse<T>>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let (response, status) = (self.0, self.1);
        (status, Json(response)).into_response()
    }
}
