//! services/api/src/adapters/preferences.rs
//!
//! Stores the chosen color scheme as a one-word file under the data
//! directory. The system default comes from configuration.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use job_board_core::{ColorScheme, PortError, PortResult, PreferenceService};
use tracing::warn;

const SCHEME_FILE: &str = "color_scheme";

pub struct FilePreferenceStore {
    path: PathBuf,
    system: ColorScheme,
}

impl FilePreferenceStore {
    pub fn new(data_dir: impl Into<PathBuf>, system: ColorScheme) -> Self {
        Self {
            path: data_dir.into().join(SCHEME_FILE),
            system,
        }
    }
}

#[async_trait]
impl PreferenceService for FilePreferenceStore {
    async fn read_scheme(&self) -> PortResult<Option<ColorScheme>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PortError::Unavailable(format!("{}: {}", self.path.display(), e)))
            }
        };
        match raw.parse::<ColorScheme>() {
            Ok(scheme) => Ok(Some(scheme)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring stored color scheme");
                Ok(None)
            }
        }
    }

    async fn write_scheme(&self, scheme: ColorScheme) -> PortResult<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| PortError::Unavailable(format!("{}: {}", dir.display(), e)))?;
        }
        tokio::fs::write(&self.path, scheme.as_str())
            .await
            .map_err(|e| PortError::Unavailable(format!("{}: {}", self.path.display(), e)))
    }

    async fn system_scheme(&self) -> PortResult<Option<ColorScheme>> {
        Ok(Some(self.system))
    }
}
