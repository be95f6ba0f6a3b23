use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::error::{Error, Result};

/// Binary asset collaborator. Only the returned reference is ever persisted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn store(&self, key: &str, data: Bytes, content_type: &str) -> Result<String>;
}

/// Writes objects below a directory that the router serves at `public_base`.
#[derive(Clone, Debug)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::BadRequest(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn store(&self, key: &str, data: Bytes, content_type: &str) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &data).await.map_err(|e| {
            tracing::error!(key, error = %e, "Failed to write object");
            Error::Io(e)
        })?;
        tracing::debug!(key, content_type, bytes = data.len(), "Stored object");
        Ok(format!("{}/{}", self.public_base, key))
    }
}

/// Key under which an employer's upload is stored: `<owner>/<unix-millis>.<ext>`.
pub fn owner_scoped_key(owner: uuid::Uuid, millis: i64, extension: &str) -> String {
    format!("{}/{}.{}", owner, millis, extension)
}
