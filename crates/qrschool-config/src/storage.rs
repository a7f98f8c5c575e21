use std::env;
use std::path::PathBuf;

const DEFAULT_TOKEN_PATH: &str = ".qrschool/session.json";

/// Location of the persisted session.
///
/// `QRSCHOOL_TOKEN_PATH` overrides the default `.qrschool/session.json`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub token_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            token_path: env::var("QRSCHOOL_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_PATH)),
        }
    }
}
