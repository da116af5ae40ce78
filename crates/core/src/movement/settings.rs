//! Site and warehouse settings.
//!
//! A site carries the template map of setting keys. A warehouse copies the
//! key set once at creation and may override values afterwards, but it can
//! never introduce a key the site did not define.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from settings manipulation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The key is not part of the warehouse's key set.
    #[error("Unknown setting key: {0}")]
    UnknownKey(String),

    /// The stored blob is not a JSON object of strings.
    #[error("Invalid settings blob: {0}")]
    InvalidBlob(String),
}

/// Template layer owned by a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteSettings(BTreeMap<String, String>);

impl SiteSettings {
    /// Creates an empty template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a template value, adding the key if needed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Reads a template value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Parses the stored JSON blob.
    ///
    /// # Errors
    ///
    /// `InvalidBlob` unless the blob is an object whose values are strings.
    pub fn from_json(blob: &str) -> Result<Self, SettingsError> {
        parse_blob(blob).map(Self)
    }

    /// Serialises to the stored JSON blob.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SiteSettings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Override layer owned by a warehouse.
///
/// `None` means "inherit from the site".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseSettings(BTreeMap<String, Option<String>>);

impl WarehouseSettings {
    /// Fixes the key set from the site template, with no overrides.
    #[must_use]
    pub fn from_site(site: &SiteSettings) -> Self {
        Self(site.0.keys().map(|key| (key.clone(), None)).collect())
    }

    /// Overrides a value.
    ///
    /// # Errors
    ///
    /// `UnknownKey` for a key outside the fixed key set.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), SettingsError> {
        let slot = self
            .0
            .get_mut(key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        *slot = Some(value.into());
        Ok(())
    }

    /// Drops an override so the site value applies again.
    ///
    /// # Errors
    ///
    /// `UnknownKey` for a key outside the fixed key set.
    pub fn reset(&mut self, key: &str) -> Result<(), SettingsError> {
        let slot = self
            .0
            .get_mut(key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        *slot = None;
        Ok(())
    }

    /// The override for `key`, if any.
    #[must_use]
    pub fn override_for(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.as_deref())
    }

    /// Effective settings: the override where set, the site value otherwise.
    ///
    /// Keys the site has since dropped are only kept when overridden.
    #[must_use]
    pub fn merged(&self, site: &SiteSettings) -> BTreeMap<String, String> {
        self.0
            .iter()
            .filter_map(|(key, value)| {
                value
                    .clone()
                    .or_else(|| site.get(key).map(str::to_string))
                    .map(|value| (key.clone(), value))
            })
            .collect()
    }

    /// Parses a stored blob against the site's key set.
    ///
    /// Values equal to the site's are treated as inherited.
    ///
    /// # Errors
    ///
    /// `InvalidBlob` for a malformed blob, `UnknownKey` for a key the site
    /// does not define.
    pub fn from_json(site: &SiteSettings, blob: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::from_site(site);
        for (key, value) in parse_blob(blob)? {
            if site.get(&key) != Some(value.as_str()) {
                settings.set(&key, value)?;
            }
        }
        Ok(settings)
    }

    /// Serialises the overrides to a stored blob.
    #[must_use]
    pub fn to_json(&self) -> String {
        let overrides: BTreeMap<&str, &str> = self
            .0
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|value| (key.as_str(), value)))
            .collect();
        serde_json::to_string(&overrides).unwrap_or_else(|_| "{}".to_string())
    }
}

fn parse_blob(blob: &str) -> Result<BTreeMap<String, String>, SettingsError> {
    if blob.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let value: serde_json::Value =
        serde_json::from_str(blob).map_err(|err| SettingsError::InvalidBlob(err.to_string()))?;
    let serde_json::Value::Object(map) = value else {
        return Err(SettingsError::InvalidBlob("expected a JSON object".into()));
    };
    map.into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(text) => Ok((key, text)),
            other => Err(SettingsError::InvalidBlob(format!(
                "value of {key} is not a string: {other}"
            ))),
        })
        .collect()
}
