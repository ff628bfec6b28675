//! Key/value settings namespace with JSON-typed values.
//!
//! Every stored value carries an encoding tag (`text` or `json`), so reading
//! a value never depends on guessing from its first character.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::backend::{Backend, SettingEncoding, StoredSetting};
use crate::errors::Error;

/// Settings view over a borrowed store connection.
pub struct SettingsStore<'a, B: Backend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: Backend + ?Sized> SettingsStore<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Fetch and decode a setting.
    ///
    /// Returns `None` if the key does not exist or holds JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigDecode` if a JSON-tagged value does not parse.
    pub fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        match self.backend.get_setting(key)? {
            Some(setting) => Ok(decode(key, &setting)?.filter(|v| !v.is_null())),
            None => Ok(None),
        }
    }

    /// Fetch a setting and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        self.get(key)?
            .map(|value| {
                serde_json::from_value(value).map_err(|source| Error::ConfigDecode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Store any serializable value.
    ///
    /// Strings are stored verbatim with the `text` tag; everything else is
    /// serialized with the `json` tag.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), Error> {
        validate_key(key)?;
        let setting = match serde_json::to_value(value)? {
            Value::String(s) => StoredSetting::text(s),
            other => StoredSetting::json(other.to_string()),
        };
        self.backend.set_setting(key, &setting)?;
        Ok(())
    }

    /// Store a value typed by a human.
    ///
    /// A quoted JSON string literal (`"abc"` with the quotes) is unwrapped
    /// once; anything else is kept as the plain string it is. Numbers and
    /// booleans typed this way stay strings.
    pub fn set_from_input(&self, key: &str, input: &str) -> Result<(), Error> {
        if input.starts_with('"') {
            if let Ok(Value::String(inner)) = serde_json::from_str::<Value>(input) {
                return self.set(key, &inner);
            }
        }
        self.set(key, input)
    }

    /// Fetch the whole namespace in one call.
    ///
    /// Best-effort: a JSON-tagged entry that fails to parse is returned as
    /// its raw text (a JSON string) and logged. `null` entries are omitted.
    pub fn get_all(&self) -> Result<BTreeMap<String, Value>, Error> {
        let mut settings = BTreeMap::new();
        for (key, setting) in self.backend.get_all_settings()? {
            let value = match decode(&key, &setting) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %key, error = %e, "Returning raw value for undecodable setting");
                    Value::String(setting.raw)
                }
            };
            if !value.is_null() {
                settings.insert(key, value);
            }
        }
        Ok(settings)
    }
}

fn decode(key: &str, setting: &StoredSetting) -> Result<Option<Value>, Error> {
    match setting.encoding {
        SettingEncoding::Text => Ok(Some(Value::String(setting.raw.clone()))),
        SettingEncoding::Json => serde_json::from_str(&setting.raw)
            .map(Some)
            .map_err(|source| Error::ConfigDecode {
                key: key.to_string(),
                source,
            }),
    }
}

fn validate_key(key: &str) -> Result<(), Error> {
    if key.trim().is_empty() {
        return Err(Error::InvalidInput("Setting key cannot be empty".to_string()));
    }
    Ok(())
}
