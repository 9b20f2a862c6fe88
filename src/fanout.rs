//! Locale fanout translator.
//!
//! After a document is published in the canonical locale, this orchestrator
//! translates its fields into every other supported locale and writes each
//! result as a locale-scoped draft. Locales are fully isolated: a failure
//! in one is logged, recorded in the report, and never aborts the rest.
//!
//! Only the entry gate is fatal: the canonical document must exist and be
//! published. Everything past the gate returns `Ok` with a per-locale
//! report, whatever happened inside the loop.

use crate::document::{Collection, Document, Operation, Status, UpdatePayload};
use crate::i18n::Locale;
use crate::richtext::translate_rich_text;
use crate::store::{DocumentStore, StoreError, WriteOptions};
use crate::translator::Translate;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Task-fatal failures: the fanout never started its per-locale loop.
#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("{collection}/{id} not found in canonical locale")]
    NotFound { collection: Collection, id: u64 },

    #[error("{collection}/{id} is not published")]
    NotPublished { collection: Collection, id: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FanoutError {
    /// Whether retrying the whole job could help. Missing or unpublished
    /// documents stay that way until the next edit; store errors may not.
    pub fn is_transient(&self) -> bool {
        matches!(self, FanoutError::Store(_))
    }
}

/// Terminal state of one (document, target locale) attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocaleStatus {
    /// A draft was written under the target locale.
    Succeeded { fields_translated: usize },

    /// Nothing to translate: every source field was empty or absent.
    SkippedEmpty,

    /// Translation or the draft write failed; no draft was produced and
    /// any prior draft for this locale is left as it was.
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct LocaleOutcome {
    pub locale: Locale,
    #[serde(flatten)]
    pub status: LocaleStatus,
}

/// Result of one fanout run: one outcome per target locale, in fanout order.
#[derive(Debug, Clone, Serialize)]
pub struct FanoutReport {
    pub collection: Collection,
    pub id: u64,
    pub outcomes: Vec<LocaleOutcome>,
}

impl FanoutReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, LocaleStatus::Succeeded { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, LocaleStatus::Failed { .. }))
            .count()
    }
}

/// Write-hook gate: should this document event trigger a fanout?
///
/// Fires only for create/update of a published document in the canonical
/// locale. Derived locale versions are never a translation source, which is
/// what prevents translation loops.
pub fn should_fanout(status: Status, locale: Locale, operation: Operation) -> bool {
    status == Status::Published
        && locale.is_canonical()
        && matches!(operation, Operation::Create | Operation::Update)
}

/// Fan a canonical document out to every target locale.
///
/// Reads the canonical version, then attempts each target locale
/// independently and sequentially; target locales write disjoint storage
/// partitions, so no cross-locale coordination is needed.
pub async fn translate_document(
    store: &dyn DocumentStore,
    translator: &dyn Translate,
    collection: Collection,
    id: u64,
) -> Result<FanoutReport, FanoutError> {
    let canonical = store
        .find_by_id(collection, id, Locale::canonical())
        .await?
        .ok_or(FanoutError::NotFound { collection, id })?;

    if canonical.status != Status::Published {
        return Err(FanoutError::NotPublished { collection, id });
    }

    let mut outcomes = Vec::new();
    for target in Locale::targets() {
        let status = translate_for_locale(store, translator, &canonical, target).await;
        if let LocaleStatus::Failed { reason } = &status {
            warn!(
                "Error translating {}/{} to {}: {}",
                collection, id, target, reason
            );
        }
        outcomes.push(LocaleOutcome {
            locale: target,
            status,
        });
    }

    let report = FanoutReport {
        collection,
        id,
        outcomes,
    };
    info!(
        "Fanout for {}/{} finished: {} succeeded, {} failed of {} locales",
        collection,
        id,
        report.succeeded(),
        report.failed(),
        report.outcomes.len()
    );
    Ok(report)
}

/// One locale's best-effort attempt. All errors are contained here; the
/// caller only ever sees a terminal `LocaleStatus`.
async fn translate_for_locale(
    store: &dyn DocumentStore,
    translator: &dyn Translate,
    canonical: &Document,
    target: Locale,
) -> LocaleStatus {
    if !canonical.has_translatable_content() {
        return LocaleStatus::SkippedEmpty;
    }

    // Non-empty scalar sources, in the collection's declared field order
    let sources: Vec<(&'static str, &str)> = canonical
        .collection
        .translatable_fields()
        .iter()
        .filter_map(|name| canonical.field(name).map(|value| (*name, value)))
        .collect();

    // Sibling fields have no ordering dependency; translate them concurrently
    let translations = join_all(sources.iter().map(|(name, value)| async move {
        (*name, translator.translate(value, target).await)
    }))
    .await;

    let mut payload = UpdatePayload::default();
    let mut failed_fields = 0usize;
    for (name, result) in translations {
        match result {
            Ok(translated) if !translated.trim().is_empty() => {
                payload.fields.insert(name.to_string(), translated);
            }
            Ok(_) => {
                // Empty output is treated like an absent source: skipped
            }
            Err(e) => {
                // A failed field is omitted, not a whole-locale failure
                failed_fields += 1;
                warn!(
                    "Field '{}' of {}/{} failed to translate to {}: {}",
                    name, canonical.collection, canonical.id, target, e
                );
            }
        }
    }

    // A body on a collection that declares no rich-text field is ignored
    let body = canonical
        .body
        .as_ref()
        .filter(|_| canonical.collection.has_rich_text_body());
    if let Some(body) = body {
        match translate_rich_text(body, translator, target).await {
            Ok(translated) => payload.body = Some(translated),
            Err(e) => {
                failed_fields += 1;
                warn!(
                    "Rich-text body of {}/{} failed to translate to {}: {}",
                    canonical.collection, canonical.id, target, e
                );
            }
        }
    }

    if payload.is_empty() {
        if failed_fields > 0 {
            return LocaleStatus::Failed {
                reason: format!("all {} field translations failed", failed_fields),
            };
        }
        return LocaleStatus::SkippedEmpty;
    }

    let fields_translated = payload.fields.len() + usize::from(payload.body.is_some());
    match store
        .update(
            canonical.collection,
            canonical.id,
            payload,
            target,
            WriteOptions::fanout_draft(),
        )
        .await
    {
        Ok(_) => {
            info!(
                "Created draft translation for locale {} of {}/{}",
                target, canonical.collection, canonical.id
            );
            LocaleStatus::Succeeded { fields_translated }
        }
        Err(e) => LocaleStatus::Failed {
            reason: e.to_string(),
        },
    }
}
