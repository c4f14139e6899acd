use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding one cookie-jar file per account plus the active pointer.
    pub session_dir: PathBuf,
    /// Base64 encoded 32-byte key; session files are encrypted when set.
    pub encryption_key: Option<String>,
}

impl fmt::Display for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"session_dir\":\"{}\",\"encryption_key\":{}}}",
            self.session_dir.display(),
            self.encryption_key
                .as_ref()
                .map_or("null".to_string(), |_| "\"[REDACTED]\"".to_string())
        )
    }
}
