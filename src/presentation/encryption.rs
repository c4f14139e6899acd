use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine};
use rand::RngCore;

const NONCE_LENGTH: usize = 12;
const KEY_LENGTH: usize = 32;

/// Prefix marking an encrypted cookie-jar file.
pub(crate) const ENVELOPE_PREFIX: &str = "igenc:v1:";

/// AES-256-GCM sealing of session files at rest.
pub struct SessionCipher {
    cipher: Aes256Gcm,
}

impl SessionCipher {
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LENGTH {
            anyhow::bail!("Session key must be {} bytes, got {}", KEY_LENGTH, key.len());
        }
        let key = Key::<Aes256Gcm>::from_slice(key);
        let cipher = Aes256Gcm::new(key);
        Ok(Self { cipher })
    }

    /// Builds a cipher from the base64 form used in configuration.
    pub fn from_base64_key(encoded: &str) -> Result<Self> {
        let key = general_purpose::STANDARD
            .decode(encoded.trim())
            .context("Session key is not valid base64")?;
        Self::new(&key)
    }

    /// Seals `plaintext` into an `igenc:v1:` envelope with a fresh nonce.
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce);

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("Sealing session failed: {:?}", e))?;

        let mut payload = Vec::with_capacity(NONCE_LENGTH + sealed.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&sealed);
        Ok(format!("{ENVELOPE_PREFIX}{}", general_purpose::STANDARD.encode(payload)))
    }

    pub fn open(&self, envelope: &str) -> Result<String> {
        let encoded = envelope
            .trim()
            .strip_prefix(ENVELOPE_PREFIX)
            .context("Missing encryption envelope")?;
        let payload = general_purpose::STANDARD
            .decode(encoded)
            .context("Envelope is not valid base64")?;
        if payload.len() < NONCE_LENGTH {
            anyhow::bail!("Envelope is too short");
        }

        let (nonce, sealed) = payload.split_at(NONCE_LENGTH);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| {
                anyhow::anyhow!("Session file could not be opened with the configured key")
            })?;

        String::from_utf8(plain).context("Opened session is not UTF-8")
    }
}

pub(crate) fn is_encrypted(contents: &str) -> bool {
    contents.trim_start().starts_with(ENVELOPE_PREFIX)
}
