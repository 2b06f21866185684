use std::{error::Error, io, path::Path};

use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of where the document lives.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("stored document `{location}` is not valid JSON")]
    Decode {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document for `{location}`")]
    Encode {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Replace `path` with `contents` by writing a sibling temporary file and renaming it
/// over the target, so readers never observe a half-written document.
pub async fn write_atomically(path: &Path, contents: &[u8]) -> StorageResult<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".into());
    let temp_path = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| io_failure("creating parent directory", parent, err))?;
    }

    fs::write(&temp_path, contents)
        .await
        .map_err(|err| io_failure("writing temporary file", &temp_path, err))?;

    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(io_failure("replacing", path, err));
    }

    Ok(())
}

fn io_failure(action: &str, path: &Path, err: io::Error) -> StorageError {
    StorageError::unavailable(format!("{action} `{}`", path.display()), err)
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[tokio::test]
    async fn atomic_write_replaces_content_and_leaves_no_temp_file() {
        let dir = env::temp_dir().join(format!("royale-storage-{}", Uuid::new_v4()));
        let target = dir.join("nested").join("doc.json");

        write_atomically(&target, b"first").await.unwrap();
        write_atomically(&target, b"second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
        let leftovers = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
