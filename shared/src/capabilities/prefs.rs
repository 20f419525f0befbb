use crux_kv::error::KeyValueError;
use crux_kv::KeyValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 128;
pub const MAX_VALUE_LENGTH: usize = 4 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PrefsError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value too large: {size} bytes, max {max}")]
    ValueTooLarge { size: usize, max: usize },

    #[error("stored value is not UTF-8: {message}")]
    NotUtf8 { message: String },

    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

impl From<KeyValueError> for PrefsError {
    fn from(e: KeyValueError) -> Self {
        Self::Unavailable {
            message: e.to_string(),
        }
    }
}

/// Key of a small string setting in the shell's key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefsKey(String);

impl PrefsKey {
    pub fn new(key: impl Into<String>) -> Result<Self, PrefsError> {
        let key = key.into();

        if key.trim().is_empty() {
            return Err(PrefsError::InvalidKey {
                key,
                reason: "key cannot be empty".to_string(),
            });
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(PrefsError::InvalidKey {
                key: key.chars().take(50).collect::<String>() + "...",
                reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
            });
        }

        if key.chars().any(char::is_control) {
            return Err(PrefsError::InvalidKey {
                key: key.escape_debug().to_string(),
                reason: "key contains control characters".to_string(),
            });
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// String values are stored as their UTF-8 bytes.
pub fn encode_value(value: &str) -> Result<Vec<u8>, PrefsError> {
    if value.len() > MAX_VALUE_LENGTH {
        return Err(PrefsError::ValueTooLarge {
            size: value.len(),
            max: MAX_VALUE_LENGTH,
        });
    }
    Ok(value.as_bytes().to_vec())
}

pub fn decode_value(
    stored: Result<Option<Vec<u8>>, KeyValueError>,
) -> Result<Option<String>, PrefsError> {
    match stored? {
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| PrefsError::NotUtf8 {
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Validated string settings on top of [`KeyValue`].
pub struct Prefs<'a, Ev> {
    kv: &'a KeyValue<Ev>,
}

impl<'a, Ev> Prefs<'a, Ev>
where
    Ev: 'static,
{
    pub fn new(kv: &'a KeyValue<Ev>) -> Self {
        Self { kv }
    }

    pub fn get<F>(&self, key: &PrefsKey, make_event: F)
    where
        F: FnOnce(Result<Option<String>, PrefsError>) -> Ev + Send + Sync + 'static,
    {
        self.kv
            .get(key.as_str().to_string(), move |stored| make_event(decode_value(stored)));
    }

    pub fn set<F>(&self, key: &PrefsKey, value: &str, make_event: F) -> Result<(), PrefsError>
    where
        F: FnOnce(Result<(), PrefsError>) -> Ev + Send + Sync + 'static,
    {
        let bytes = encode_value(value)?;
        self.kv.set(key.as_str().to_string(), bytes, move |result| {
            make_event(result.map(|_previous| ()).map_err(PrefsError::from))
        });
        Ok(())
    }

    pub fn remove<F>(&self, key: &PrefsKey, make_event: F)
    where
        F: FnOnce(Result<(), PrefsError>) -> Ev + Send + Sync + 'static,
    {
        self.kv.delete(key.as_str().to_string(), move |result| {
            make_event(result.map(|_previous| ()).map_err(PrefsError::from))
        });
    }
}
