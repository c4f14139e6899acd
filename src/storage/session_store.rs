use crate::constants::{ACTIVE_POINTER_FILE, SESSION_FILE_PREFIX};
use crate::presentation::encryption::{is_encrypted, SessionCipher};
use crate::presentation::serialization::Serializer;
use crate::session::session::Session;
use crate::storage::config::StorageConfig;
use crate::utils::validation::is_valid_username;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// One cookie-jar file per account (`session-<username>`) plus an `ACTIVE`
/// pointer naming the account in use.
pub struct SessionStore {
    dir: PathBuf,
    cipher: Option<SessionCipher>,
}

impl SessionStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        if !config.session_dir.exists() {
            fs::create_dir_all(&config.session_dir).with_context(|| {
                format!("Failed to create session dir {}", config.session_dir.display())
            })?;
            warn!("Created session dir: {}", config.session_dir.display());
        }
        let cipher = config
            .encryption_key
            .as_deref()
            .map(SessionCipher::from_base64_key)
            .transpose()?;
        Ok(Self {
            dir: config.session_dir.clone(),
            cipher,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, username: &str) -> Result<PathBuf> {
        if !is_valid_username(username) {
            anyhow::bail!("Refusing session file for invalid username {:?}", username);
        }
        Ok(self.dir.join(format!("{SESSION_FILE_PREFIX}{username}")))
    }

    /// Writes the cookie jar through a temporary file so readers never see a partial write.
    pub fn save(&self, session: &Session) -> Result<PathBuf> {
        let path = self.path_for(session.username())?;
        let json = Serializer::to_json_pretty(session)?;
        let contents = match &self.cipher {
            Some(cipher) => cipher.seal(&json)?,
            None => json,
        };
        let tmp = self
            .dir
            .join(format!(".{SESSION_FILE_PREFIX}{}.tmp", session.username()));
        fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write session file {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move session file into {}", path.display()))?;
        debug!("Session saved for {} at {}", session.username(), path.display());
        Ok(path)
    }

    pub fn load(&self, username: &str) -> Result<Session> {
        let path = self.path_for(username)?;
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        let json = if is_encrypted(&contents) {
            let cipher = self
                .cipher
                .as_ref()
                .context("Session file is encrypted but no session key is configured")?;
            cipher.open(&contents)?
        } else {
            contents
        };
        Serializer::from_json(&json)
            .with_context(|| format!("Corrupt session file {}", path.display()))
    }

    /// Usernames that have a stored session.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut usernames: Vec<String> = self
            .session_files()?
            .into_iter()
            .map(|(username, _)| username)
            .collect();
        usernames.sort();
        Ok(usernames)
    }

    pub fn set_active(&self, username: &str) -> Result<()> {
        let path = self.path_for(username)?;
        if !path.exists() {
            anyhow::bail!("No stored session for {}", username);
        }
        fs::write(self.dir.join(ACTIVE_POINTER_FILE), username)
            .context("Failed to write active session pointer")?;
        info!("Active session set to {}", username);
        Ok(())
    }

    /// The account named by the pointer, if the pointer exists and its file is present.
    pub fn active_username(&self) -> Result<Option<String>> {
        let pointer = self.dir.join(ACTIVE_POINTER_FILE);
        if !pointer.exists() {
            return Ok(None);
        }
        let username = fs::read_to_string(&pointer)
            .context("Failed to read active session pointer")?
            .trim()
            .to_string();
        match self.path_for(&username) {
            Ok(path) if path.exists() => Ok(Some(username)),
            _ => {
                warn!("Active session pointer names missing session {:?}", username);
                Ok(None)
            }
        }
    }

    /// Account whose session file was modified last.
    pub fn most_recent(&self) -> Result<Option<String>> {
        Ok(self
            .session_files()?
            .into_iter()
            .max_by_key(|(_, modified)| *modified)
            .map(|(username, _)| username))
    }

    /// Loads the active session. Without a pointer the most recently modified
    /// file is used and becomes the active one.
    pub fn load_active(&self) -> Result<Option<Session>> {
        if let Some(username) = self.active_username()? {
            return self.load(&username).map(Some);
        }
        match self.most_recent()? {
            Some(username) => {
                let session = self.load(&username)?;
                self.set_active(&username)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    fn session_files(&self) -> Result<Vec<(String, SystemTime)>> {
        let mut files = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list session dir {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(username) = name
                .to_str()
                .and_then(|n| n.strip_prefix(SESSION_FILE_PREFIX))
            else {
                continue;
            };
            if !is_valid_username(username) || !entry.file_type()?.is_file() {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            files.push((username.to_string(), modified));
        }
        Ok(files)
    }
}
