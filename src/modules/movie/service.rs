use super::dto::{MOVIE_NOT_FOUND, MovieForm, PageRequest};
use super::model::{Movie, MovieChanges, NewMovie, UpdatedMovie};
use crate::common::error::{AppError, AppResult};
use crate::common::response::PageMeta;
use crate::state::AppState;
use anyhow::Result;
use tracing::info;
use uuid::Uuid;

pub const CREATE_FAILED: &str = "Failed create movie. Please try again";
pub const CREATE_ERROR: &str = "Failed create movie. Please Try Again";
pub const UPDATE_ERROR: &str = "Movie Failed Updated";
pub const UPDATED: &str = "Movie updated";
const LIST_ERROR: &str = "Failed to fetch movies";
const FETCH_ERROR: &str = "Failed to fetch movie";
const DELETE_ERROR: &str = "Failed to delete movie";

pub struct MovieService;

impl MovieService {
    pub async fn find_all_movies(state: &AppState, page: PageRequest) -> Result<Vec<Movie>> {
        state.movies.find_all(page.size, page.offset()).await
    }

    pub async fn count_movies(state: &AppState) -> Result<i64> {
        state.movies.count().await
    }

    pub async fn find_by_movie_id(state: &AppState, id: Uuid) -> Result<Option<Movie>> {
        state.movies.find_by_id(id).await
    }

    pub async fn list_movies(state: &AppState, page: PageRequest) -> AppResult<(Vec<Movie>, PageMeta)> {
        let movies = Self::find_all_movies(state, page)
            .await
            .map_err(AppError::internal(LIST_ERROR))?;
        let count = Self::count_movies(state)
            .await
            .map_err(AppError::internal(LIST_ERROR))?;

        let meta = PageMeta {
            page: page.page,
            count,
            size: movies.len(),
        };

        Ok((movies, meta))
    }

    pub async fn get_movie(state: &AppState, id: Uuid) -> AppResult<Movie> {
        Self::find_by_movie_id(state, id)
            .await
            .map_err(AppError::internal(FETCH_ERROR))?
            .ok_or(AppError::NotFound(MOVIE_NOT_FOUND))
    }

    pub async fn create_movie(state: &AppState, form: MovieForm) -> AppResult<Movie> {
        let Some(photo) = form.photo else {
            return Err(AppError::Unprocessable("Photo is required".to_string()));
        };

        let new_movie = NewMovie {
            id: Uuid::new_v4(),
            title: form.fields.title,
            genre: form.fields.genre,
            year: form.fields.year,
            photo: photo.path.clone(),
            photo_name: photo.original_name,
        };

        match state.movies.create(new_movie).await {
            Ok(Some(movie)) => {
                info!("Created movie {}", movie.id);
                Ok(movie)
            }
            Ok(None) => {
                state.photos.discard(&photo.path).await;
                Err(AppError::Unprocessable(CREATE_FAILED.to_string()))
            }
            Err(e) => {
                state.photos.discard(&photo.path).await;
                Err(AppError::internal(CREATE_ERROR)(e))
            }
        }
    }

    pub async fn update_movie(state: &AppState, id: Uuid, form: MovieForm) -> AppResult<Movie> {
        let new_photo = form.photo.as_ref().map(|p| p.path.clone());

        let result = Self::apply_update(state, id, form).await;

        match &result {
            Ok((_, Some(previous))) => state.photos.discard(previous).await,
            Err(_) => {
                if let Some(path) = &new_photo {
                    state.photos.discard(path).await;
                }
            }
            Ok((_, None)) => {}
        }

        result.map(|(movie, _)| movie)
    }

    /// Returns the updated movie and the photo path it no longer references.
    async fn apply_update(
        state: &AppState,
        id: Uuid,
        form: MovieForm,
    ) -> AppResult<(Movie, Option<String>)> {
        let replaces_photo = form.photo.is_some();
        let changes = MovieChanges {
            title: form.fields.title,
            genre: form.fields.genre,
            year: form.fields.year,
            photo: form.photo.map(|p| (p.path, p.original_name)),
        };

        let UpdatedMovie {
            movie,
            previous_photo,
        } = state
            .movies
            .update(id, changes)
            .await
            .map_err(AppError::internal(UPDATE_ERROR))?
            .ok_or(AppError::NotFound(MOVIE_NOT_FOUND))?;

        let replaced = if replaces_photo {
            previous_photo.filter(|old| movie.photo.as_ref() != Some(old))
        } else {
            None
        };

        info!("Updated movie {}", movie.id);
        Ok((movie, replaced))
    }

    /// Deletes the movie and returns the row as it was before deletion.
    pub async fn delete_movie(state: &AppState, id: Uuid) -> AppResult<Movie> {
        let movie = state
            .movies
            .delete(id)
            .await
            .map_err(AppError::internal(DELETE_ERROR))?
            .ok_or(AppError::NotFound(MOVIE_NOT_FOUND))?;

        info!("Deleted movie {}", movie.id);

        if let Some(photo) = &movie.photo {
            state.photos.discard(photo).await;
        }

        Ok(movie)
    }
}
