//! Document store boundary.
//!
//! The CMS framework owns real persistence, versioning, and drafts; this
//! crate only depends on the small locale-scoped contract below. The
//! in-memory implementation backs the preview binary and the tests.

use crate::document::{Collection, Document, Status, UpdatePayload};
use crate::i18n::Locale;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write to {collection}/{id} ({locale}) failed: {reason}")]
    WriteFailed {
        collection: Collection,
        id: u64,
        locale: Locale,
        reason: String,
    },

    #[error("store backend unavailable: {0}")]
    Unavailable(String),
}

/// Flags attached to a locale-scoped write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Write a draft snapshot instead of publishing.
    pub draft: bool,

    /// Suppress downstream cache revalidation for this write. Set during
    /// bulk fanout so unrelated consumers are not re-triggered per locale.
    pub disable_revalidate: bool,
}

impl WriteOptions {
    /// The options every fanout write uses.
    pub fn fanout_draft() -> Self {
        Self {
            draft: true,
            disable_revalidate: true,
        }
    }
}

/// Locale-scoped document reads and partial writes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document in one locale, or `None` if it does not exist.
    async fn find_by_id(
        &self,
        collection: Collection,
        id: u64,
        locale: Locale,
    ) -> Result<Option<Document>, StoreError>;

    /// Apply a partial update under one locale. Fields absent from the
    /// payload keep their stored value; they are never cleared.
    async fn update(
        &self,
        collection: Collection,
        id: u64,
        payload: UpdatePayload,
        locale: Locale,
        options: WriteOptions,
    ) -> Result<Document, StoreError>;
}

/// One write as the store received it, for asserting fanout behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub collection: Collection,
    pub id: u64,
    pub locale: Locale,
    pub payload: UpdatePayload,
    pub options: WriteOptions,
}

#[derive(Default)]
struct MemoryStoreInner {
    documents: HashMap<(Collection, u64, Locale), Document>,
    writes: Vec<RecordedWrite>,
    failing_locales: HashSet<Locale>,
}

/// In-memory store keyed by `(collection, id, locale)`.
///
/// Draft writes never auto-publish: a `draft = true` update leaves the
/// target snapshot in `Draft` status until a human promotes it through the
/// real CMS.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, bypassing the write log.
    pub fn seed(&self, document: Document) {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        inner.documents.insert(
            (document.collection, document.id, document.locale),
            document,
        );
    }

    /// Make every write to `locale` fail, to exercise write-failure paths.
    pub fn fail_writes_for(&self, locale: Locale) {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        inner.failing_locales.insert(locale);
    }

    /// All writes received so far, in order.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        inner.writes.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_id(
        &self,
        collection: Collection,
        id: u64,
        locale: Locale,
    ) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.lock().expect("memory store lock poisoned");
        Ok(inner.documents.get(&(collection, id, locale)).cloned())
    }

    async fn update(
        &self,
        collection: Collection,
        id: u64,
        payload: UpdatePayload,
        locale: Locale,
        options: WriteOptions,
    ) -> Result<Document, StoreError> {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");

        if inner.failing_locales.contains(&locale) {
            return Err(StoreError::WriteFailed {
                collection,
                id,
                locale,
                reason: "injected write failure".to_string(),
            });
        }

        inner.writes.push(RecordedWrite {
            collection,
            id,
            locale,
            payload: payload.clone(),
            options,
        });

        let document = inner
            .documents
            .entry((collection, id, locale))
            .or_insert_with(|| Document {
                id,
                collection,
                locale,
                status: Status::Draft,
                fields: Default::default(),
                body: None,
                published_at: None,
            });

        document.fields.extend(payload.fields);
        if let Some(body) = payload.body {
            document.body = Some(body);
        }
        if options.draft {
            document.status = Status::Draft;
        }

        Ok(document.clone())
    }
}
