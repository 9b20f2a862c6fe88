//! Locale type: a validated, copyable locale code.
//!
//! A `Locale` can only be constructed for codes present and enabled in the
//! registry, so every value flowing through the document store and the
//! fanout is known-good.

use crate::i18n::{LocaleConfig, LocaleRegistry};
use anyhow::{bail, Result};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale {
    /// ISO 639-1 code (e.g., "en", "bg", "tr")
    code: &'static str,
}

impl Locale {
    /// The canonical locale, English.
    pub const ENGLISH: Locale = Locale { code: "en" };

    /// Bulgarian.
    pub const BULGARIAN: Locale = Locale { code: "bg" };

    /// Turkish.
    pub const TURKISH: Locale = Locale { code: "tr" };

    /// Create a `Locale` from a locale code string.
    ///
    /// # Returns
    /// * `Ok(Locale)` if the code is registered and enabled
    /// * `Err` if the code is unknown or the locale is disabled
    pub fn from_code(code: &str) -> Result<Locale> {
        let registry = LocaleRegistry::get();

        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Locale {
                code: config.code, // static str owned by the registry
            }),
            Some(_) => bail!("Locale '{}' is not enabled", code),
            None => bail!("Unknown locale code: '{}'", code),
        }
    }

    /// The canonical (source) locale, from which all translations derive.
    pub fn canonical() -> Locale {
        let config = LocaleRegistry::get().canonical();
        Locale { code: config.code }
    }

    /// Translation targets in registry order: every enabled locale except
    /// the canonical one. This is the list the fanout iterates verbatim.
    pub fn targets() -> Vec<Locale> {
        LocaleRegistry::get()
            .targets()
            .into_iter()
            .map(|config| Locale { code: config.code })
            .collect()
    }

    /// The ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// The full registry configuration for this locale.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a properly constructed `Locale`.
    pub fn config(&self) -> &'static LocaleConfig {
        LocaleRegistry::get()
            .get_by_code(self.code)
            .expect("Locale code should always be valid")
    }

    /// English name of the locale (e.g., "Turkish").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Native name of the locale (e.g., "Türkçe").
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Whether this is the canonical locale.
    pub fn is_canonical(&self) -> bool {
        self.config().is_canonical
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl Serialize for Locale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}

impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Locale::from_code(&code).map_err(de::Error::custom)
    }
}
