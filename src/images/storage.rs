//! Filesystem-level image storage keyed by entity ID.
//!
//! Images live under `{base_dir}/{entity_id}/{file_id}`; the shared fallback
//! image lives at `{base_dir}/default/default.png`.

use std::path::{Component, Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Path value recorded by the metadata service meaning "serve the default image".
pub const DEFAULT_SENTINEL: &str = "default";

const DEFAULT_DIR: &str = "default";
const DEFAULT_FILE: &str = "default.png";

#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Metadata about a freshly stored image file.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Generated file name inside the entity directory.
    pub file_id: String,
    /// Absolute path of the written file.
    pub path: PathBuf,
}

/// Filesystem manager for image storage.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    base_dir: PathBuf,
}

impl ImageStorage {
    /// Create a new `ImageStorage` rooted at the given resources directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Path of the shared default image.
    pub fn default_path(&self) -> PathBuf {
        self.base_dir.join(DEFAULT_DIR).join(DEFAULT_FILE)
    }

    /// Directory holding all images of one entity.
    pub fn entity_dir(&self, entity_id: &str) -> Result<PathBuf> {
        let entity_id = checked_component(entity_id, "entity ID")?;
        Ok(self.base_dir.join(entity_id))
    }

    /// Compose `{base_dir}/{entity_id}/{file_path}`.
    pub fn get_path(&self, entity_id: &str, file_path: &str) -> Result<PathBuf> {
        let file_path = checked_component(file_path, "file path")?;
        Ok(self.entity_dir(entity_id)?.join(file_path))
    }

    /// Load the image recorded at `file_path` for `entity_id`.
    ///
    /// An empty path means nothing is recorded and fails with
    /// [`Error::ImageNotFound`]; the [`DEFAULT_SENTINEL`] path loads the
    /// shared default image instead of an entity file.
    pub async fn load(&self, entity_id: &str, file_path: &str) -> Result<Vec<u8>> {
        if file_path.is_empty() {
            return Err(Error::image_not_found(entity_id));
        }
        if file_path == DEFAULT_SENTINEL {
            return self.load_default().await;
        }

        let path = self.get_path(entity_id, file_path)?;
        read_file(&path).await
    }

    /// Load the shared default image.
    pub async fn load_default(&self) -> Result<Vec<u8>> {
        read_file(&self.default_path()).await
    }

    /// Write `data` under a freshly generated name inside the entity's
    /// directory, creating the directory when needed.
    pub async fn store(&self, entity_id: &str, data: &[u8]) -> Result<StoredImage> {
        let entity_dir = self.entity_dir(entity_id)?;

        // create_dir_all tolerates the directory appearing concurrently
        tokio::fs::create_dir_all(&entity_dir)
            .await
            .map_err(|source| Error::Persistence {
                path: entity_dir.clone(),
                source,
            })?;

        let file_id = Uuid::new_v4().to_string();
        let path = entity_dir.join(&file_id);
        write_file(&path, data)
            .await
            .map_err(|source| Error::Persistence {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Stored {} bytes at {}", data.len(), path.display());

        Ok(StoredImage { file_id, path })
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await.map_err(|source| {
        tracing::warn!("File not found: {}", path.display());
        Error::FileNotFound {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .await
        .map_err(|source| Error::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(buf)
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.flush().await
}

/// Accept `value` only if it is exactly one normal path component, so that
/// composed paths never leave the resources root.
fn checked_component<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == value => Ok(value),
        _ => Err(Error::validation(format!("Invalid {}: {:?}", what, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_with_default() -> (tempfile::TempDir, ImageStorage) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("default")).unwrap();
        std::fs::write(dir.path().join("default/default.png"), b"\x89PNG default").unwrap();
        let storage = ImageStorage::new(dir.path().to_path_buf());
        (dir, storage)
    }

    #[test]
    fn test_get_path() {
        let storage = ImageStorage::new(PathBuf::from("/data/resources"));
        let path = storage.get_path("abc", "img-1").unwrap();
        assert_eq!(path, PathBuf::from("/data/resources/abc/img-1"));
    }

    #[test]
    fn test_default_path() {
        let storage = ImageStorage::new(PathBuf::from("/data/resources"));
        assert_eq!(
            storage.default_path(),
            PathBuf::from("/data/resources/default/default.png")
        );
    }

    #[test]
    fn test_get_path_rejects_traversal() {
        let storage = ImageStorage::new(PathBuf::from("/data/resources"));
        for bad in ["..", "../etc", "a/b", "/abs", "", "abc/"] {
            assert!(
                matches!(storage.get_path("abc", bad), Err(Error::Validation(_))),
                "accepted file path {:?}",
                bad
            );
            assert!(
                matches!(storage.entity_dir(bad), Err(Error::Validation(_))),
                "accepted entity {:?}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_load_existing_file() {
        let (dir, storage) = storage_with_default();
        std::fs::create_dir_all(dir.path().join("abc")).unwrap();
        std::fs::write(dir.path().join("abc/img-1"), b"real image").unwrap();

        let bytes = storage.load("abc", "img-1").await.unwrap();
        assert_eq!(bytes, b"real image");
    }

    #[tokio::test]
    async fn test_load_empty_path_is_image_not_found() {
        let (_dir, storage) = storage_with_default();
        let err = storage.load("abc", "").await.unwrap_err();
        assert!(matches!(err, Error::ImageNotFound { ref entity_id } if entity_id == "abc"));
    }

    #[tokio::test]
    async fn test_load_sentinel_returns_default() {
        let (_dir, storage) = storage_with_default();
        let bytes = storage.load("abc", DEFAULT_SENTINEL).await.unwrap();
        assert_eq!(bytes, b"\x89PNG default");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_file_not_found() {
        let (_dir, storage) = storage_with_default();
        let err = storage.load("abc", "missing").await.unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn test_load_default_is_idempotent() {
        let (dir, storage) = storage_with_default();
        let first = storage.load_default().await.unwrap();
        let second = storage.load_default().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            std::fs::read(dir.path().join("default/default.png")).unwrap(),
            first
        );
    }

    #[tokio::test]
    async fn test_load_default_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ImageStorage::new(dir.path().to_path_buf());
        let err = storage.load_default().await.unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_store_creates_directory_and_round_trips() {
        let (dir, storage) = storage_with_default();

        let stored = storage.store("new-entity", b"uploaded").await.unwrap();
        assert!(dir.path().join("new-entity").is_dir());
        assert_eq!(stored.path, dir.path().join("new-entity").join(&stored.file_id));
        assert!(Uuid::parse_str(&stored.file_id).is_ok());

        let bytes = storage.load("new-entity", &stored.file_id).await.unwrap();
        assert_eq!(bytes, b"uploaded");
    }

    #[tokio::test]
    async fn test_store_twice_generates_distinct_files() {
        let (_dir, storage) = storage_with_default();
        let first = storage.store("abc", b"one").await.unwrap();
        let second = storage.store("abc", b"two").await.unwrap();
        assert_ne!(first.file_id, second.file_id);
        assert_eq!(storage.load("abc", &first.file_id).await.unwrap(), b"one");
        assert_eq!(storage.load("abc", &second.file_id).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_concurrent_first_uploads_share_directory() {
        let (_dir, storage) = storage_with_default();
        let (a, b) = tokio::join!(
            storage.store("fresh", b"a"),
            storage.store("fresh", b"b")
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_store_sets_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, storage) = storage_with_default();
        let stored = storage.store("abc", b"data").await.unwrap();
        let mode = std::fs::metadata(&stored.path).unwrap().permissions().mode();
        // umask can only clear bits
        assert_eq!(mode & 0o777 & !FILE_MODE, 0);
        assert_ne!(mode & 0o400, 0);
    }

    #[tokio::test]
    async fn test_store_rejects_unsafe_entity() {
        let (_dir, storage) = storage_with_default();
        let err = storage.store("../escape", b"data").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_store_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, b"file").unwrap();
        let storage = ImageStorage::new(root);

        let err = storage.store("abc", b"data").await.unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
        assert_eq!(err.http_status(), 500);
    }
}
