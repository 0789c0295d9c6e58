use anyhow::{Context, Result, anyhow};
use axum::extract::multipart::Field;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

const FALLBACK_EXTENSION: &str = "bin";
const MAX_EXTENSION_LEN: usize = 8;

/// A photo written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    /// Path as persisted on the movie row.
    pub path: String,
    /// Client-supplied filename. Display metadata only.
    pub original_name: Option<String>,
}

/// Local-disk photo store. Files are named by the server, never by the client.
#[derive(Clone, Debug)]
pub struct PhotoStorage {
    dir: PathBuf,
}

impl PhotoStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create upload dir {}", self.dir.display()))
    }

    /// Streams a multipart field to `<dir>/<uuid>.<ext>`.
    ///
    /// A partially written file is removed before the error is returned.
    pub async fn store(&self, mut field: Field<'_>) -> Result<StoredPhoto> {
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let original_name = field.file_name().map(str::to_string);

        let extension = extension_for(&content_type, original_name.as_deref());
        let target = self.dir.join(format!("{}.{}", Uuid::new_v4(), extension));

        let mut file = File::create(&target)
            .await
            .with_context(|| format!("Failed to create {}", target.display()))?;

        let written = async {
            loop {
                match field.chunk().await {
                    Ok(Some(chunk)) => file.write_all(&chunk).await?,
                    Ok(None) => break,
                    Err(e) => return Err(anyhow::Error::new(e)),
                }
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&target).await;
            return Err(e);
        }

        let path = target.to_string_lossy().into_owned();
        info!("Stored photo {} (client name {:?})", path, original_name);

        Ok(StoredPhoto {
            path,
            original_name,
        })
    }

    /// Removes a previously stored photo. Paths outside the upload directory are refused.
    pub async fn remove(&self, path: &str) -> Result<()> {
        let target = Path::new(path);
        if target.parent() != Some(self.dir.as_path()) {
            return Err(anyhow!("Refusing to remove {} outside upload dir", path));
        }

        match fs::remove_file(target).await {
            Ok(()) => {
                info!("Removed photo {}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context(format!("Failed to remove {}", path))),
        }
    }

    /// Best-effort removal; failures are logged and swallowed.
    pub async fn discard(&self, path: &str) {
        if let Err(e) = self.remove(path).await {
            warn!("Could not remove photo: {:#}", e);
        }
    }
}

/// Picks a file extension for a stored photo.
///
/// The client's extension is kept only when it is a known extension of the
/// declared content type, or when the content type is unknown and the
/// extension is short and alphanumeric.
pub fn extension_for(content_type: &str, original_name: Option<&str>) -> String {
    let client_ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase());

    match mime_guess::get_mime_extensions_str(content_type) {
        Some(known) => match client_ext {
            Some(ext) if known.contains(&ext.as_str()) => ext,
            _ => known
                .first()
                .map(|ext| ext.to_string())
                .unwrap_or_else(|| FALLBACK_EXTENSION.to_string()),
        },
        None => client_ext.unwrap_or_else(|| FALLBACK_EXTENSION.to_string()),
    }
}
