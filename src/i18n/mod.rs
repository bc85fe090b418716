//! Internationalization (i18n) module for Post Box.
//!
//! String tables are TOML files flattened to dot-separated keys. The English
//! and Persian tables are compiled into the binary.
//!
//! # Usage
//!
//! ```
//! use postbox::i18n::I18nManager;
//!
//! let manager = I18nManager::builtin().unwrap();
//! let fa = manager.get_or_default("fa");
//!
//! assert_eq!(fa.t("compose.send"), "ارسال نامه");
//! let text = manager
//!     .get_or_default("en")
//!     .t_with("reject.cooldown_active", &[("hours", "3")]);
//! assert!(text.ends_with("in 3 hours."));
//! ```

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

/// Default locale.
pub const DEFAULT_LOCALE: &str = "en";

/// Locales compiled into the binary.
const BUILTIN_LOCALES: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.toml")),
    ("fa", include_str!("../../locales/fa.toml")),
];

/// I18n-related errors.
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to parse TOML.
    #[error("Failed to parse locale file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Locale not found.
    #[error("Locale not found: {0}")]
    LocaleNotFound(String),
}

/// Result type for i18n operations.
pub type Result<T> = std::result::Result<T, I18nError>;

/// String table for a single locale.
#[derive(Debug, Clone)]
pub struct I18n {
    locale: String,
    messages: HashMap<String, String>,
}

impl I18n {
    /// Create an I18n instance from a TOML string.
    pub fn from_str(locale: &str, content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;

        let mut messages = HashMap::new();
        flatten_toml("", &toml::Value::Table(table), &mut messages);

        Ok(Self {
            locale: locale.to_string(),
            messages,
        })
    }

    /// Create an empty I18n instance. Every lookup returns the key.
    pub fn empty(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            messages: HashMap::new(),
        }
    }

    /// Get the locale code.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Get the number of loaded messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if no messages are loaded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages, ordered by key.
    pub fn messages(&self) -> BTreeMap<&str, &str> {
        self.messages
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Translate a key. Returns the key itself if it is missing.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map(|s| s.as_str()).unwrap_or(key)
    }

    /// Translate a key, replacing `{{name}}` placeholders.
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut result = self.t(key).to_string();

        for (name, value) in params {
            let placeholder = format!("{{{{{name}}}}}");
            result = result.replace(&placeholder, value);
        }

        result
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::empty(DEFAULT_LOCALE)
    }
}

/// Flatten a TOML value into a HashMap with dot-separated keys.
fn flatten_toml(prefix: &str, value: &toml::Value, map: &mut HashMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_toml(&new_prefix, val, map);
            }
        }
        toml::Value::String(s) => {
            map.insert(prefix.to_string(), s.clone());
        }
        toml::Value::Integer(i) => {
            map.insert(prefix.to_string(), i.to_string());
        }
        toml::Value::Boolean(b) => {
            map.insert(prefix.to_string(), b.to_string());
        }
        // Not used for strings.
        toml::Value::Float(_) | toml::Value::Array(_) | toml::Value::Datetime(_) => {}
    }
}

/// Holds every available locale and the default one.
#[derive(Debug, Clone)]
pub struct I18nManager {
    locales: HashMap<String, I18n>,
    default: String,
    fallback: I18n,
}

impl I18nManager {
    /// Create a manager with no locales.
    pub fn new(default_locale: &str) -> Self {
        Self {
            locales: HashMap::new(),
            default: default_locale.to_string(),
            fallback: I18n::empty(default_locale),
        }
    }

    /// Load the locales compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let mut manager = Self::new(DEFAULT_LOCALE);
        for (locale, content) in BUILTIN_LOCALES {
            manager.add_locale(I18n::from_str(locale, content)?);
        }
        Ok(manager)
    }

    /// Add a locale, replacing any with the same code.
    pub fn add_locale(&mut self, i18n: I18n) {
        self.locales.insert(i18n.locale().to_string(), i18n);
    }

    /// Change the default locale.
    pub fn set_default(&mut self, locale: &str) -> Result<()> {
        if !self.locales.contains_key(locale) {
            return Err(I18nError::LocaleNotFound(locale.to_string()));
        }
        self.default = locale.to_string();
        Ok(())
    }

    /// Get the default locale code.
    pub fn default_locale(&self) -> &str {
        &self.default
    }

    /// Available locale codes, sorted.
    pub fn available_locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.locales.keys().map(|s| s.as_str()).collect();
        locales.sort_unstable();
        locales
    }

    /// Get the table for a specific locale.
    pub fn get(&self, locale: &str) -> Option<&I18n> {
        self.locales.get(locale)
    }

    /// Get the table for `locale`, or the default one if it is unknown.
    pub fn get_or_default(&self, locale: &str) -> &I18n {
        self.locales
            .get(locale)
            .or_else(|| self.locales.get(&self.default))
            .unwrap_or(&self.fallback)
    }
}
