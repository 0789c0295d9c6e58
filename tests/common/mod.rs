#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
use movies_backend::app::create_app;
use movies_backend::config::settings::AppConfig;
use movies_backend::middleware::auth::TokenClaims;
use movies_backend::modules::movie::model::{Movie, MovieChanges, NewMovie, UpdatedMovie};
use movies_backend::modules::movie::repository::MovieRepository;
use movies_backend::state::AppState;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";
pub const BOUNDARY: &str = "----movies-test-boundary";

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Keeps rows in insertion order, which is also creation order.
#[derive(Default)]
pub struct InMemoryMovies {
    rows: Mutex<Vec<Movie>>,
    /// When set, `create` accepts the insert but yields no row.
    create_yields_nothing: bool,
    /// Photo another writer stores on the next updated row just before the update lands.
    interleaved_photo: Mutex<Option<String>>,
}

impl InMemoryMovies {
    pub fn yielding_nothing_on_create() -> Self {
        Self {
            create_yields_nothing: true,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Makes the next `update` see a photo written by a concurrent request.
    pub fn interleave_photo_on_next_update(&self, path: &str) {
        *self.interleaved_photo.lock().unwrap() = Some(path.to_string());
    }

    pub fn get(&self, id: Uuid) -> Option<Movie> {
        self.rows.lock().unwrap().iter().find(|m| m.id == id).cloned()
    }

    pub fn seed(&self, count: usize) -> Vec<Uuid> {
        let mut rows = self.rows.lock().unwrap();
        (0..count)
            .map(|i| {
                let now = OffsetDateTime::now_utc();
                let movie = Movie {
                    id: Uuid::new_v4(),
                    title: Some(format!("Movie {i}")),
                    genre: Some("Drama".to_string()),
                    year: Some("1999".to_string()),
                    photo: None,
                    photo_name: None,
                    created_at: now,
                    updated_at: now,
                };
                let id = movie.id;
                rows.push(movie);
                id
            })
            .collect()
    }
}

#[async_trait]
impl MovieRepository for InMemoryMovies {
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<Movie>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>> {
        Ok(self.get(id))
    }

    async fn create(&self, movie: NewMovie) -> Result<Option<Movie>> {
        if self.create_yields_nothing {
            return Ok(None);
        }

        let now = OffsetDateTime::now_utc();
        let movie = Movie {
            id: movie.id,
            title: movie.title,
            genre: movie.genre,
            year: movie.year,
            photo: Some(movie.photo),
            photo_name: movie.photo_name,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(movie.clone());
        Ok(Some(movie))
    }

    async fn update(&self, id: Uuid, changes: MovieChanges) -> Result<Option<UpdatedMovie>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(movie) = rows.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        if let Some(path) = self.interleaved_photo.lock().unwrap().take() {
            movie.photo = Some(path);
        }
        let previous_photo = movie.photo.clone();

        if let Some(title) = changes.title {
            movie.title = Some(title);
        }
        if let Some(genre) = changes.genre {
            movie.genre = Some(genre);
        }
        if let Some(year) = changes.year {
            movie.year = Some(year);
        }
        if let Some((path, name)) = changes.photo {
            movie.photo = Some(path);
            movie.photo_name = name;
        }
        movie.updated_at = OffsetDateTime::now_utc();

        Ok(Some(UpdatedMovie {
            movie: movie.clone(),
            previous_photo,
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Movie>> {
        let mut rows = self.rows.lock().unwrap();
        let position = rows.iter().position(|m| m.id == id);
        Ok(position.map(|i| rows.remove(i)))
    }
}

/// A store whose every call fails, standing in for a lost database.
pub struct FailingMovies;

#[async_trait]
impl MovieRepository for FailingMovies {
    async fn find_all(&self, _limit: i64, _offset: i64) -> Result<Vec<Movie>> {
        Err(anyhow!("connection refused by db.internal:5432"))
    }

    async fn count(&self) -> Result<i64> {
        Err(anyhow!("connection refused by db.internal:5432"))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Movie>> {
        Err(anyhow!("connection refused by db.internal:5432"))
    }

    async fn create(&self, _movie: NewMovie) -> Result<Option<Movie>> {
        Err(anyhow!("connection refused by db.internal:5432"))
    }

    async fn update(&self, _id: Uuid, _changes: MovieChanges) -> Result<Option<UpdatedMovie>> {
        Err(anyhow!("connection refused by db.internal:5432"))
    }

    async fn delete(&self, _id: Uuid) -> Result<Option<Movie>> {
        Err(anyhow!("connection refused by db.internal:5432"))
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub upload_dir: PathBuf,
    pub token: String,
    // Held so the directory outlives the test.
    _tmp: TempDir,
}

impl TestApp {
    /// Files currently in the upload directory.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.upload_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn test_config(upload_dir: PathBuf, max_upload_bytes: usize) -> AppConfig {
    AppConfig {
        server_port: 0,
        database_url: "postgres://unused".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        upload_dir,
        max_upload_bytes,
    }
}

pub fn build_test_app(movies: Arc<dyn MovieRepository>) -> TestApp {
    build_test_app_with_limit(movies, 1024 * 1024)
}

pub fn build_test_app_with_limit(movies: Arc<dyn MovieRepository>, max_upload_bytes: usize) -> TestApp {
    let tmp = tempfile::tempdir().unwrap();
    let upload_dir = tmp.path().join("asset");
    std::fs::create_dir_all(&upload_dir).unwrap();

    let state = AppState::new(test_config(upload_dir.clone(), max_upload_bytes), movies);

    TestApp {
        router: create_app(state),
        upload_dir,
        token: token_expiring_in(3600, JWT_SECRET),
        _tmp: tmp,
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Signs a token for `user-1`; a negative `ttl_secs` yields an expired token.
pub fn token_expiring_in(ttl_secs: i64, secret: &str) -> String {
    let now = get_current_timestamp() as i64;
    let claims = TokenClaims {
        sub: "user-1".to_string(),
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn authed_multipart(method: Method, uri: &str, token: &str, form: MultipartForm) -> Request<Body> {
    let body = form.finish();
    let length = body.len();

    multipart_request(method, uri, token)
        .header(header::CONTENT_LENGTH, length)
        .body(Body::from(body))
        .unwrap()
}

/// Like `authed_multipart`, but without a `Content-Length` header, as a chunked client sends it.
pub fn authed_multipart_chunked(
    method: Method,
    uri: &str,
    token: &str,
    form: MultipartForm,
) -> Request<Body> {
    multipart_request(method, uri, token)
        .body(Body::from(form.finish()))
        .unwrap()
}

fn multipart_request(method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
}

/// Hand-built multipart body.
#[derive(Default)]
pub struct MultipartForm {
    buf: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.buf
    }
}

/// A complete create form with a small PNG photo.
pub fn movie_form(title: &str) -> MultipartForm {
    MultipartForm::new()
        .text("title", title)
        .text("genre", "Sci-Fi")
        .text("year", "1982")
        .file("photo", "poster.png", "image/png", b"\x89PNG\r\n\x1a\nfake")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
