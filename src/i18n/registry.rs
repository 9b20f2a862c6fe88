//! Locale registry: single source of truth for the locales the CMS serves.
//!
//! The registry is initialized once behind an `OnceLock` and is immutable
//! afterwards. Exactly one locale must be marked canonical; it is the source
//! of truth for every translation fanout.

use std::sync::OnceLock;

/// Configuration for a supported locale.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// ISO 639-1 code (e.g., "en", "bg", "tr")
    pub code: &'static str,

    /// English name of the locale (e.g., "Bulgarian")
    pub name: &'static str,

    /// Native name of the locale (e.g., "Български")
    pub native_name: &'static str,

    /// Whether this is the canonical/source locale (only one should be true)
    pub is_canonical: bool,

    /// Whether this locale is enabled for fanout
    pub enabled: bool,
}

/// Global locale registry singleton.
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global registry, initializing it on first access.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            locales: default_locales(),
        })
    }

    /// Look up a locale configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// All enabled locales, in registry order.
    pub fn list_enabled(&self) -> Vec<&LocaleConfig> {
        self.locales
            .iter()
            .filter(|locale| locale.enabled)
            .collect()
    }

    /// All locales, including disabled ones.
    pub fn list_all(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().collect()
    }

    /// Translation targets: every enabled locale except the canonical one,
    /// in registry order. This is the list the fanout iterates verbatim.
    pub fn targets(&self) -> Vec<&LocaleConfig> {
        self.locales
            .iter()
            .filter(|locale| locale.enabled && !locale.is_canonical)
            .collect()
    }

    /// The canonical locale configuration.
    ///
    /// # Panics
    /// Panics if zero or multiple canonical locales are registered, which
    /// indicates a configuration error.
    pub fn canonical(&self) -> &LocaleConfig {
        let canonical: Vec<_> = self
            .locales
            .iter()
            .filter(|locale| locale.is_canonical)
            .collect();

        match canonical.len() {
            0 => panic!("No canonical locale found in registry"),
            1 => canonical[0],
            _ => panic!("Multiple canonical locales found in registry"),
        }
    }

    /// Check whether a locale code is supported and enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code)
            .map(|locale| locale.enabled)
            .unwrap_or(false)
    }
}

/// The locale set served by the CMS. The canonical locale comes first.
fn default_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_canonical: true,
            enabled: true,
        },
        LocaleConfig {
            code: "bg",
            name: "Bulgarian",
            native_name: "Български",
            is_canonical: false,
            enabled: true,
        },
        LocaleConfig {
            code: "tr",
            name: "Turkish",
            native_name: "Türkçe",
            is_canonical: false,
            enabled: true,
        },
    ]
}
