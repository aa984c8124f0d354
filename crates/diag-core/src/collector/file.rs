use std::path::{Path, PathBuf};

use super::{CollectContext, CollectError, CollectStream, ContextReader};

/// Reads a local file.
#[derive(Debug, Clone)]
pub struct FileCollector {
    name: String,
    optional: bool,
    path: PathBuf,
}

impl FileCollector {
    pub fn new(name: impl Into<String>, optional: bool, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            optional,
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn optional(&self) -> bool {
        self.optional
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn collect(&self, ctx: &CollectContext) -> Result<CollectStream, CollectError> {
        let file = ctx
            .run(tokio::fs::File::open(&self.path))
            .await
            .map_err(|reason| CollectError::Context {
                name: self.name.clone(),
                reason,
            })?
            .map_err(|source| CollectError::Open {
                name: self.name.clone(),
                source,
            })?;
        Ok(Box::pin(ContextReader::new(Box::pin(file), ctx)))
    }
}
