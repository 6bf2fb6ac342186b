//! Watch endpoint configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for one watch endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory to observe
    pub path: PathBuf,

    /// Also observe nested directories (default: false)
    #[serde(default)]
    pub recursive: bool,
}

impl WatchConfig {
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }
}
