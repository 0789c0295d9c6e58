use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub title: Option<String>,
    pub genre: Option<String>,
    /// Stored exactly as submitted.
    pub year: Option<String>,
    /// Path of the stored photo inside the upload directory.
    pub photo: Option<String>,
    /// Filename the client uploaded the photo under.
    pub photo_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

/// Values for a row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub id: Uuid,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub photo: String,
    pub photo_name: Option<String>,
}

/// An updated row together with the photo path it held before the update.
#[derive(Debug, Clone, FromRow)]
pub struct UpdatedMovie {
    #[sqlx(flatten)]
    pub movie: Movie,
    pub previous_photo: Option<String>,
}

/// Column changes for an update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    /// New photo path and client filename, replacing both columns together.
    pub photo: Option<(String, Option<String>)>,
}
