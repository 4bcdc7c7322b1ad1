//! Typed setting definitions and their validators.

use std::fmt;
use std::path::PathBuf;

use crate::config::error::{SettingsError, SettingsResult};

/// Declared type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingType {
    String,
    Boolean,
    Numeric,
    StringList,
    ExistingPath,
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingType::String => "a string",
            SettingType::Boolean => "a boolean",
            SettingType::Numeric => "a number",
            SettingType::StringList => "a list of strings",
            SettingType::ExistingPath => "an existing file path",
        };
        f.write_str(name)
    }
}

/// A numeric setting value; integers are kept exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Parse integer or floating text. Non-finite results are rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(i) = text.parse::<i64>() {
            return Some(Number::Int(i));
        }
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Number::Float(f)),
            _ => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Integer view; floats are truncated toward zero.
    pub fn as_i64(self) -> i64 {
        match self {
            Number::Int(i) => i,
            Number::Float(f) => f as i64,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A value held by the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Boolean(bool),
    Numeric(Number),
    List(Vec<String>),
    Path(PathBuf),
}

impl SettingValue {
    fn type_name(&self) -> &'static str {
        match self {
            SettingValue::String(_) => "string",
            SettingValue::Boolean(_) => "boolean",
            SettingValue::Numeric(_) => "number",
            SettingValue::List(_) => "list",
            SettingValue::Path(_) => "path",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            SettingValue::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            SettingValue::Path(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::String(s) => write!(f, "{:?}", s),
            SettingValue::Boolean(b) => write!(f, "{}", b),
            SettingValue::Numeric(n) => write!(f, "{}", n),
            SettingValue::List(items) => write!(f, "{:?}", items),
            SettingValue::Path(p) => write!(f, "{:?}", p.display().to_string()),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::String(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::String(s)
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Boolean(b)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        SettingValue::Numeric(Number::Int(i))
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Numeric(Number::Float(v))
    }
}

impl From<Number> for SettingValue {
    fn from(n: Number) -> Self {
        SettingValue::Numeric(n)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(items: Vec<String>) -> Self {
        SettingValue::List(items)
    }
}

impl From<PathBuf> for SettingValue {
    fn from(p: PathBuf) -> Self {
        SettingValue::Path(p)
    }
}

impl SettingType {
    /// Type predicate without coercion. Used for declared defaults.
    pub fn accepts(self, value: &SettingValue) -> bool {
        matches!(
            (self, value),
            (SettingType::String, SettingValue::String(_))
                | (SettingType::Boolean, SettingValue::Boolean(_))
                | (SettingType::Numeric, SettingValue::Numeric(_))
                | (SettingType::StringList, SettingValue::List(_))
                | (SettingType::ExistingPath, SettingValue::Path(_))
        )
    }

    /// Validate an incoming value, applying the documented coercions:
    /// numeric text becomes a number, a single string becomes a singleton
    /// list, and path strings become paths that must exist.
    pub fn validate(self, name: &str, value: SettingValue) -> SettingsResult<SettingValue> {
        match (self, value) {
            (SettingType::String, v @ SettingValue::String(_)) => Ok(v),
            (SettingType::Boolean, v @ SettingValue::Boolean(_)) => Ok(v),
            (SettingType::Numeric, v @ SettingValue::Numeric(_)) => Ok(v),
            (SettingType::Numeric, SettingValue::String(text)) => match Number::parse(&text) {
                Some(n) => Ok(SettingValue::Numeric(n)),
                None => Err(type_error(name, self, &SettingValue::String(text))),
            },
            (SettingType::StringList, v @ SettingValue::List(_)) => Ok(v),
            (SettingType::StringList, SettingValue::String(s)) => Ok(SettingValue::List(vec![s])),
            (SettingType::ExistingPath, SettingValue::Path(path)) => existing_path(name, path),
            (SettingType::ExistingPath, SettingValue::String(s)) => {
                existing_path(name, PathBuf::from(s))
            }
            (expected, other) => Err(type_error(name, expected, &other)),
        }
    }
}

fn existing_path(name: &str, path: PathBuf) -> SettingsResult<SettingValue> {
    if path.exists() {
        Ok(SettingValue::Path(path))
    } else {
        Err(SettingsError::InvalidPath {
            name: name.to_string(),
            path,
        })
    }
}

fn type_error(name: &str, expected: SettingType, actual: &SettingValue) -> SettingsError {
    SettingsError::Type {
        name: name.to_string(),
        expected,
        actual: format!("{} ({})", actual, actual.type_name()),
    }
}

/// A single named, typed configuration entry.
#[derive(Debug, Clone)]
pub struct Setting {
    name: String,
    kind: SettingType,
    default: Option<SettingValue>,
    strict: bool,
    value: Option<SettingValue>,
}

impl Setting {
    /// Setting with a default value.
    pub fn new(name: impl Into<String>, kind: SettingType, default: impl Into<SettingValue>) -> Self {
        Self {
            name: name.into(),
            kind,
            default: Some(default.into()),
            strict: false,
            value: None,
        }
    }

    /// Lenient setting without a default; reads yield no value.
    pub fn optional(name: impl Into<String>, kind: SettingType) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            strict: false,
            value: None,
        }
    }

    /// Strict setting without a default; reading before a write is an error.
    pub fn required(name: impl Into<String>, kind: SettingType) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            strict: true,
            value: None,
        }
    }

    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, SettingType::Boolean, default)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SettingType {
        self.kind
    }

    pub fn default_value(&self) -> Option<&SettingValue> {
        self.default.as_ref()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// True once a value has been explicitly bound.
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn current(&self) -> SettingsResult<Option<&SettingValue>> {
        match self.value.as_ref().or(self.default.as_ref()) {
            None if self.strict => Err(SettingsError::MissingRequired(self.name.clone())),
            v => Ok(v),
        }
    }

    pub(crate) fn bind(&mut self, value: SettingValue) -> SettingsResult<()> {
        let checked = self.kind.validate(&self.name, value)?;
        self.value = Some(checked);
        Ok(())
    }

    /// Diagnostic line: `name = value`, `*` marks explicit bindings even
    /// when they equal the default.
    pub fn format_line(&self) -> String {
        match (&self.value, &self.default) {
            (Some(v), Some(d)) if v != d => format!("*{} = {} (default: {})", self.name, v, d),
            (Some(v), _) => format!("*{} = {}", self.name, v),
            (None, Some(d)) => format!("{} = {}", self.name, d),
            (None, None) => format!("{} = <none>", self.name),
        }
    }
}
