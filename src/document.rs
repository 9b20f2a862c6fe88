//! Document model shared by the access evaluator, the store boundary, and
//! the translation fanout.
//!
//! Collections form a closed set. Each collection declares which of its
//! localized scalar fields are translatable and whether it carries a
//! rich-text body; the fanout consults these lists instead of probing
//! documents dynamically.

use crate::i18n::Locale;
use crate::richtext::RichText;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The collections known to the CMS. Unknown slugs fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Users,
    Media,
    Dictionary,
    Posts,
    Pages,
    Categories,
    PartOfSpeech,
}

impl Collection {
    /// Every known collection.
    pub const ALL: [Collection; 7] = [
        Collection::Users,
        Collection::Media,
        Collection::Dictionary,
        Collection::Posts,
        Collection::Pages,
        Collection::Categories,
        Collection::PartOfSpeech,
    ];

    /// The collection's URL/storage slug.
    pub fn slug(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Media => "media",
            Collection::Dictionary => "dictionary",
            Collection::Posts => "posts",
            Collection::Pages => "pages",
            Collection::Categories => "categories",
            Collection::PartOfSpeech => "part-of-speech",
        }
    }

    /// Parse a slug into a collection. Unknown slugs are rejected.
    pub fn from_slug(slug: &str) -> Option<Collection> {
        Collection::ALL.iter().copied().find(|c| c.slug() == slug)
    }

    /// Localized scalar fields eligible for translation, in payload order.
    pub fn translatable_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Users => &["name"],
            Collection::Media => &["alt"],
            Collection::Dictionary => &[
                "word",
                "definitions",
                "pronunciation",
                "example",
                "etymology",
                "meta_title",
                "meta_description",
            ],
            Collection::Posts => &["title", "meta_title", "meta_description"],
            Collection::Pages => &["title"],
            Collection::Categories => &["title"],
            Collection::PartOfSpeech => &["name"],
        }
    }

    /// Whether documents in this collection may carry a rich-text body
    /// (post content, part-of-speech description, media caption).
    pub fn has_rich_text_body(&self) -> bool {
        matches!(
            self,
            Collection::Posts | Collection::PartOfSpeech | Collection::Media
        )
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Publication status of a document version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Published,
}

/// The operation that produced a document event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Read,
}

/// One locale-scoped representation of a document.
///
/// The canonical-locale version is the translation source; versions in
/// other locales are derived drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub collection: Collection,
    pub locale: Locale,
    pub status: Status,

    /// Localized scalar fields (word, title, definitions, ...).
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    /// Optional rich-text body (post content, media caption, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RichText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Document {
    /// A scalar field value, treating missing and empty the same way.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Whether the document has anything worth translating. A body only
    /// counts for collections that declare a rich-text field.
    pub fn has_translatable_content(&self) -> bool {
        self.collection
            .translatable_fields()
            .iter()
            .any(|name| self.field(name).is_some())
            || (self.body.is_some() && self.collection.has_rich_text_body())
    }
}

/// Stamp `published_at` on the first transition to published. Existing
/// stamps are never overwritten.
pub fn ensure_published_at(document: &mut Document, now: DateTime<Utc>) {
    if document.status == Status::Published && document.published_at.is_none() {
        document.published_at = Some(now);
    }
}

/// A partial, locale-scoped update: only the fields that actually produced
/// a translated value. Absent fields are left untouched in the store, never
/// cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RichText>,
}

impl UpdatePayload {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.body.is_none()
    }
}
