//! Persistence of the arena document.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::fs;

use crate::{
    dao::storage::{StorageError, StorageResult, write_atomically},
    state::GameState,
};

/// Abstraction over where the arena document is kept.
///
/// Implementations assume a single writer; concurrent invocations against the same
/// backend can lose updates.
pub trait StateStore: Send + Sync {
    /// Read the raw document, `None` when nothing has been stored yet.
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<Value>>>;
    /// Replace the stored document with `state`.
    fn save(&self, state: GameState) -> BoxFuture<'static, StorageResult<()>>;
}

/// Pretty-printed JSON file replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: Arc<Path>,
}

impl JsonFileStore {
    /// Store the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::from(path.into()),
        }
    }

    /// Location of the document on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Encode a state the way it is persisted: pretty JSON with a trailing newline.
pub fn encode_state(state: &GameState, location: &str) -> StorageResult<String> {
    let mut text =
        serde_json::to_string_pretty(state).map_err(|source| StorageError::Encode {
            location: location.to_owned(),
            source,
        })?;
    text.push('\n');
    Ok(text)
}

impl StateStore for JsonFileStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let path = Arc::clone(&self.path);
        Box::pin(async move {
            let contents = match fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
                Err(err) => {
                    return Err(StorageError::unavailable(
                        format!("reading `{}`", path.display()),
                        err,
                    ));
                }
            };

            serde_json::from_str(&contents)
                .map(Some)
                .map_err(|source| StorageError::Decode {
                    location: path.display().to_string(),
                    source,
                })
        })
    }

    fn save(&self, state: GameState) -> BoxFuture<'static, StorageResult<()>> {
        let path = Arc::clone(&self.path);
        Box::pin(async move {
            let text = encode_state(&state, &path.display().to_string())?;
            write_atomically(&path, text.as_bytes()).await
        })
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::{Arc, Mutex};

    use futures::future::BoxFuture;
    use serde_json::Value;

    use super::StateStore;
    use crate::{
        dao::storage::{StorageError, StorageResult},
        state::GameState,
    };

    /// In-memory store recording every saved state.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryStore {
        document: Arc<Mutex<Option<Value>>>,
        saves: Arc<Mutex<Vec<GameState>>>,
        fail_saves: bool,
    }

    impl MemoryStore {
        pub fn with_document(document: Value) -> Self {
            Self {
                document: Arc::new(Mutex::new(Some(document))),
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_saves: true,
                ..Self::default()
            }
        }

        pub fn saves(&self) -> Vec<GameState> {
            self.saves.lock().unwrap().clone()
        }

        pub fn document(&self) -> Option<Value> {
            self.document.lock().unwrap().clone()
        }
    }

    impl StateStore for MemoryStore {
        fn load(&self) -> BoxFuture<'static, StorageResult<Option<Value>>> {
            let document = self.document();
            Box::pin(async move { Ok(document) })
        }

        fn save(&self, state: GameState) -> BoxFuture<'static, StorageResult<()>> {
            let store = self.clone();
            Box::pin(async move {
                if store.fail_saves {
                    return Err(StorageError::unavailable(
                        "memory store is read-only".into(),
                        std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                    ));
                }
                let value = serde_json::to_value(&state).map_err(|source| StorageError::Encode {
                    location: "memory".into(),
                    source,
                })?;
                *store.document.lock().unwrap() = Some(value);
                store.saves.lock().unwrap().push(state);
                Ok(())
            })
        }
    }
}
