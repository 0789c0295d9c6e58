use crate::common::upload::PhotoStorage;
use crate::config::settings::AppConfig;
use crate::modules::movie::repository::MovieRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub movies: Arc<dyn MovieRepository>,
    pub photos: PhotoStorage,
}

impl AppState {
    pub fn new(config: AppConfig, movies: Arc<dyn MovieRepository>) -> Self {
        let photos = PhotoStorage::new(config.upload_dir.clone());

        Self {
            config,
            movies,
            photos,
        }
    }
}
