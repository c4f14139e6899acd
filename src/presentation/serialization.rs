use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::type_name;

/// Short type name for error messages (`Session` rather than the full path).
fn short_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Text encoding of records kept on disk.
pub struct Serializer;

impl Serializer {
    /// Indented JSON, so session files stay readable and diffable by hand.
    pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
        serde_json::to_string_pretty(value)
            .with_context(|| format!("Cannot encode {} as JSON", short_name::<T>()))
    }

    pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
        if json.trim().is_empty() {
            anyhow::bail!("Cannot decode {} from an empty document", short_name::<T>());
        }
        serde_json::from_str(json).with_context(|| {
            format!(
                "Cannot decode {} from {} bytes of JSON",
                short_name::<T>(),
                json.len()
            )
        })
    }
}
