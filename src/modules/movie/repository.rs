use super::model::{Movie, MovieChanges, NewMovie, UpdatedMovie};
use crate::infrastructure::db::pool::DbPool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for the movie entity.
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<Movie>>;

    async fn count(&self) -> Result<i64>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>>;

    /// `None` when the store accepted the statement but produced no row.
    async fn create(&self, movie: NewMovie) -> Result<Option<Movie>>;

    /// `None` when no movie has this id. The previous photo path is read in the
    /// same statement as the write.
    async fn update(&self, id: Uuid, changes: MovieChanges) -> Result<Option<UpdatedMovie>>;

    /// Deletes and returns the removed row; `None` when no movie has this id.
    async fn delete(&self, id: Uuid) -> Result<Option<Movie>>;
}

const MOVIE_COLUMNS: &str = "id, title, genre, year, photo, photo_name, created_at, updated_at";
const RETURNED_COLUMNS: &str =
    "m.id, m.title, m.genre, m.year, m.photo, m.photo_name, m.created_at, m.updated_at";

pub struct PgMovieRepository {
    pool: DbPool,
}

impl PgMovieRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieRepository for PgMovieRepository {
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<Movie>> {
        let sql = format!(
            "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"
        );

        sqlx::query_as::<_, Movie>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch movies")
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count movies")
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1");

        sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch movie")
    }

    async fn create(&self, movie: NewMovie) -> Result<Option<Movie>> {
        let sql = format!(
            r#"
            INSERT INTO movies (id, title, genre, year, photo, photo_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MOVIE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Movie>(&sql)
            .bind(movie.id)
            .bind(movie.title)
            .bind(movie.genre)
            .bind(movie.year)
            .bind(movie.photo)
            .bind(movie.photo_name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to create movie")
    }

    async fn update(&self, id: Uuid, changes: MovieChanges) -> Result<Option<UpdatedMovie>> {
        let (photo, photo_name, replace_photo) = match changes.photo {
            Some((path, name)) => (Some(path), name, true),
            None => (None, None, false),
        };

        let sql = format!(
            r#"
            UPDATE movies AS m
            SET
                title = COALESCE($2, m.title),
                genre = COALESCE($3, m.genre),
                year = COALESCE($4, m.year),
                photo = CASE WHEN $7 THEN $5 ELSE m.photo END,
                photo_name = CASE WHEN $7 THEN $6 ELSE m.photo_name END,
                updated_at = NOW()
            FROM (
                SELECT id AS prev_id, photo AS previous_photo
                FROM movies
                WHERE id = $1
                FOR UPDATE
            ) AS prev
            WHERE m.id = prev.prev_id
            RETURNING {RETURNED_COLUMNS}, prev.previous_photo
            "#
        );

        sqlx::query_as::<_, UpdatedMovie>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.genre)
            .bind(changes.year)
            .bind(photo)
            .bind(photo_name)
            .bind(replace_photo)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to update movie")
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Movie>> {
        let sql = format!("DELETE FROM movies WHERE id = $1 RETURNING {MOVIE_COLUMNS}");

        sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to delete movie")
    }
}
