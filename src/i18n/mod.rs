//! Internationalization (i18n) module.
//!
//! Centralized locale infrastructure for the CMS core:
//!
//! - `registry`: single source of truth for supported locales and their metadata
//! - `locale`: validated `Locale` type used by the store and the fanout
//!
//! # Example
//!
//! ```rust,ignore
//! use lexicon_cms::i18n::{Locale, LocaleRegistry};
//!
//! // Canonical locale (English)
//! let canonical = Locale::canonical();
//!
//! // Locale from a request path segment
//! let turkish = Locale::from_code("tr")?;
//!
//! // Fanout targets (every enabled locale except canonical)
//! let targets = LocaleRegistry::get().targets();
//! ```

mod locale;
mod registry;

pub use locale::Locale;
pub use registry::{LocaleConfig, LocaleRegistry};
