use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to the operator.
///
/// Malformed rows never show up here: the pipeline drops them silently.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The snapshot file does not exist. Fatal for the session.
    #[error("找不到 '{}' 檔案。請先執行 convert.py 檔案來產生快速讀取檔。", path.display())]
    MissingArtifact { path: PathBuf },

    /// The snapshot exists but could not be read. Fatal for the session.
    #[error("無法讀取 '{}': {source:#}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The current filter combination matches no rows. Recoverable.
    #[error("在目前的篩選條件下，找不到任何資料！")]
    EmptyFilterResult,
}

impl DashboardError {
    /// Whether the session must stop rendering anything but the error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DashboardError::EmptyFilterResult)
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
