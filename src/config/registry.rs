//! The settings registry.
//!
//! # Responsibilities
//! - Own every registered [`Setting`] in registration order
//! - Validate writes against the declared type before storing
//! - Expose typed reads and a diagnostic listing
//!
//! # Design Decisions
//! - Registration is fail-fast: a duplicate name is an error
//! - Writes take `&mut self`; once bound the registry is shared as
//!   `Arc<Settings>` and only read from then on
//! - A rejected write leaves the previous binding untouched

use std::collections::HashMap;
use std::path::Path;

use crate::config::error::{SettingsError, SettingsResult};
use crate::config::setting::{Setting, SettingValue};

/// Registry of typed settings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    entries: Vec<Setting>,
    index: HashMap<String, usize>,
}

impl Settings {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a setting. Fails if the name is taken or the declared
    /// default does not match the declared type.
    pub fn register(&mut self, setting: Setting) -> SettingsResult<()> {
        if self.index.contains_key(setting.name()) {
            return Err(SettingsError::Duplicate(setting.name().to_string()));
        }
        if let Some(default) = setting.default_value() {
            if !setting.kind().accepts(default) {
                return Err(SettingsError::Type {
                    name: setting.name().to_string(),
                    expected: setting.kind(),
                    actual: format!("default {}", default),
                });
            }
        }
        self.index.insert(setting.name().to_string(), self.entries.len());
        self.entries.push(setting);
        Ok(())
    }

    fn entry(&self, name: &str) -> SettingsResult<&Setting> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| SettingsError::Unknown(name.to_string()))
    }

    /// Look up a setting definition.
    pub fn get(&self, name: &str) -> SettingsResult<&Setting> {
        self.entry(name)
    }

    /// Current value: the bound value, else the default.
    pub fn get_value(&self, name: &str) -> SettingsResult<Option<&SettingValue>> {
        self.entry(name)?.current()
    }

    /// Declared default, ignoring any bound value.
    pub fn get_default(&self, name: &str) -> SettingsResult<Option<&SettingValue>> {
        Ok(self.entry(name)?.default_value())
    }

    /// Validate and store a value.
    pub fn set_value(&mut self, name: &str, value: impl Into<SettingValue>) -> SettingsResult<()> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| SettingsError::Unknown(name.to_string()))?;
        self.entries[i].bind(value.into())?;
        tracing::trace!(setting = name, "Setting updated");
        Ok(())
    }

    /// True if the setting was explicitly bound.
    pub fn is_set(&self, name: &str) -> SettingsResult<bool> {
        Ok(self.entry(name)?.is_set())
    }

    pub fn get_bool(&self, name: &str) -> SettingsResult<bool> {
        let value = self.get_value(name)?;
        Ok(value.and_then(SettingValue::as_bool).unwrap_or(false))
    }

    pub fn get_string(&self, name: &str) -> SettingsResult<Option<&str>> {
        Ok(self.get_value(name)?.and_then(SettingValue::as_str))
    }

    pub fn get_integer(&self, name: &str) -> SettingsResult<Option<i64>> {
        Ok(self.get_value(name)?.and_then(SettingValue::as_number).map(|n| n.as_i64()))
    }

    pub fn get_float(&self, name: &str) -> SettingsResult<Option<f64>> {
        Ok(self.get_value(name)?.and_then(SettingValue::as_number).map(|n| n.as_f64()))
    }

    pub fn get_list(&self, name: &str) -> SettingsResult<&[String]> {
        Ok(self.get_value(name)?.and_then(SettingValue::as_list).unwrap_or(&[]))
    }

    pub fn get_path(&self, name: &str) -> SettingsResult<Option<&Path>> {
        Ok(self.get_value(name)?.and_then(SettingValue::as_path))
    }

    /// Number of registered settings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered settings in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Setting> {
        self.entries.iter()
    }

    /// One `name = value` line per setting, in registration order.
    ///
    /// The iterator is lazy and borrows the registry; call again to restart.
    pub fn format_settings(&self) -> FormatSettings<'_> {
        FormatSettings {
            inner: self.entries.iter(),
        }
    }
}

/// Lazy iterator returned by [`Settings::format_settings`].
#[derive(Clone)]
pub struct FormatSettings<'a> {
    inner: std::slice::Iter<'a, Setting>,
}

impl Iterator for FormatSettings<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next().map(Setting::format_line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for FormatSettings<'_> {}
