use crate::error::AmedasError;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const CACHE_DIR_NAME: &str = "amedas_rs_cache";

pub fn get_cache_dir() -> Result<PathBuf, AmedasError> {
    dirs::cache_dir()
        .ok_or_else(|| {
            AmedasError::CacheDirResolution(io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine system cache directory",
            ))
        })
        .map(|p| p.join(CACHE_DIR_NAME))
}

pub async fn ensure_cache_dir_exists(path: &Path) -> Result<(), AmedasError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(AmedasError::CacheDirCreation(
                    path.to_path_buf(),
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "Cache path exists but is not a directory",
                    ),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating cache directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| AmedasError::CacheDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(AmedasError::CacheDirCreation(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_missing_cache_dir() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("a").join("b");
        ensure_cache_dir_exists(&nested).await?;
        assert!(nested.is_dir());
        // Existing directories are fine
        ensure_cache_dir_exists(&nested).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_file_as_cache_dir() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("not_a_dir");
        std::fs::write(&file, "x")?;
        let err = ensure_cache_dir_exists(&file).await.unwrap_err();
        assert!(matches!(err, AmedasError::CacheDirCreation(p, _) if p == file));
        Ok(())
    }
}
