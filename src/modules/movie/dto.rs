use crate::common::error::AppError;
use crate::common::upload::StoredPhoto;
use crate::state::AppState;
use axum::{
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::{StatusCode, request::Parts},
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const MOVIE_NOT_FOUND: &str = "Movies not found";
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

const PHOTO_FIELD: &str = "photo";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Items per page.
    pub size: Option<i64>,
}

/// Normalised pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE),
            size: size.filter(|s| *s >= 1).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

impl<S> FromRequestParts<S> for PageRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PageQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        Ok(PageRequest::new(query.page, query.size))
    }
}

/// Movie id taken from the path. Anything that is not a UUID names no movie.
#[derive(Debug, Clone, Copy)]
pub struct MovieId(pub Uuid);

impl<S> FromRequestParts<S> for MovieId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| MovieId(id))
            .map_err(|_| AppError::NotFound(MOVIE_NOT_FOUND))
    }
}

/// Multipart body shared by create and update. Documentation only.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct MovieFormSchema {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub photo: Option<Vec<u8>>,
}

/// Text fields of a movie form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFields {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
}

/// A parsed movie form whose `photo` part, if any, is already on disk.
#[derive(Debug)]
pub struct MovieForm {
    pub fields: MovieFields,
    pub photo: Option<StoredPhoto>,
}

impl FromRequest<AppState> for MovieForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut form = MovieForm {
            fields: MovieFields::default(),
            photo: None,
        };

        if let Err(e) = read_fields(&mut multipart, state, &mut form).await {
            if let Some(photo) = form.photo.take() {
                state.photos.discard(&photo.path).await;
            }
            return Err(e);
        }

        Ok(form)
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    state: &AppState,
    form: &mut MovieForm,
) -> Result<(), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => form.fields.title = Some(field.text().await.map_err(multipart_error)?),
            "genre" => form.fields.genre = Some(field.text().await.map_err(multipart_error)?),
            "year" => form.fields.year = Some(field.text().await.map_err(multipart_error)?),
            PHOTO_FIELD => {
                // Browsers send an empty, unnamed part when no file was picked.
                if field.file_name().is_none_or(str::is_empty) {
                    continue;
                }
                if form.photo.is_some() {
                    return Err(AppError::Unprocessable(
                        "Only one photo may be uploaded".to_string(),
                    ));
                }

                let content_type = field.content_type().unwrap_or("");
                if !content_type.starts_with("image/") {
                    return Err(AppError::Unprocessable(
                        "Invalid content type: only image/* allowed".to_string(),
                    ));
                }

                let stored = state.photos.store(field).await.map_err(|e| {
                    match e.downcast_ref::<axum::extract::multipart::MultipartError>() {
                        Some(me) if me.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                            AppError::PayloadTooLarge(me.body_text())
                        }
                        Some(me) => AppError::BadRequest(me.body_text()),
                        None => AppError::internal("Failed to store photo")(e),
                    }
                })?;
                form.photo = Some(stored);
            }
            _ => {}
        }
    }

    Ok(())
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}
