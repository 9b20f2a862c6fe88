//! Fanout job queue.
//!
//! Document write hooks run inside the request lifecycle, so they only
//! enqueue; a worker owns the slow part. The hook-side entry point never
//! propagates errors back into the write, so a publish appears to succeed
//! even when the translation pipeline is down.

use crate::document::{Collection, Document, Operation};
use crate::fanout::{translate_document, FanoutError};
use crate::retry::{with_retry_if, RetryConfig};
use crate::store::DocumentStore;
use crate::translator::Translate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// One unit of fanout work: which canonical document to fan out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutJob {
    pub collection: Collection,
    pub id: u64,
}

/// Producer handle held by the document write hooks.
#[derive(Clone)]
pub struct FanoutQueue {
    tx: mpsc::UnboundedSender<FanoutJob>,
}

/// Create a queue and the receiver its worker consumes.
pub fn fanout_channel() -> (FanoutQueue, mpsc::UnboundedReceiver<FanoutJob>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FanoutQueue { tx }, rx)
}

impl FanoutQueue {
    /// After-change hook: enqueue a fanout for an eligible document event.
    ///
    /// Applies the publish/canonical/operation gate first. Enqueue failures
    /// (worker gone) are logged and swallowed so the triggering write is
    /// never failed by the translation pipeline.
    pub fn enqueue_after_change(&self, document: &Document, operation: Operation) {
        if !crate::fanout::should_fanout(document.status, document.locale, operation) {
            return;
        }

        let job = FanoutJob {
            collection: document.collection,
            id: document.id,
        };
        match self.tx.send(job) {
            Ok(()) => info!(
                "Queued fanout for {}/{}",
                document.collection, document.id
            ),
            Err(e) => error!(
                "Error queuing fanout for {}/{}: {}",
                document.collection, document.id, e
            ),
        }
    }
}

/// Consume fanout jobs until every queue handle is dropped.
///
/// Each job waits out `settle_delay` first, so a burst of edits to the same
/// document translates the settled state instead of every keystroke. Jobs
/// are retried only for transient store errors; a document that is missing
/// or unpublished by the time the job runs is dropped with a log line.
pub async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<FanoutJob>,
    store: Arc<dyn DocumentStore>,
    translator: Arc<dyn Translate>,
    settle_delay: Duration,
) {
    while let Some(job) = rx.recv().await {
        if !settle_delay.is_zero() {
            sleep(settle_delay).await;
        }

        let result = with_retry_if(
            &RetryConfig::fanout_job(),
            &format!("Fanout {}/{}", job.collection, job.id),
            || translate_document(store.as_ref(), translator.as_ref(), job.collection, job.id),
            FanoutError::is_transient,
        )
        .await;

        match result {
            Ok(report) => info!(
                "Fanout job {}/{} done: {}/{} locales succeeded",
                job.collection,
                job.id,
                report.succeeded(),
                report.outcomes.len()
            ),
            Err(e) => warn!("Fanout job {}/{} failed: {}", job.collection, job.id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Status;
    use crate::i18n::Locale;

    fn published_entry() -> Document {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("word".to_string(), "hello".to_string());
        Document {
            id: 1,
            collection: Collection::Dictionary,
            locale: Locale::ENGLISH,
            status: Status::Published,
            fields,
            body: None,
            published_at: None,
        }
    }

    #[tokio::test]
    async fn test_enqueue_after_change_published_create() {
        let (queue, mut rx) = fanout_channel();
        queue.enqueue_after_change(&published_entry(), Operation::Create);

        let job = rx.try_recv().expect("job should be queued");
        assert_eq!(
            job,
            FanoutJob {
                collection: Collection::Dictionary,
                id: 1
            }
        );
    }

    #[tokio::test]
    async fn test_enqueue_after_change_skips_drafts() {
        let (queue, mut rx) = fanout_channel();
        let mut draft = published_entry();
        draft.status = Status::Draft;

        queue.enqueue_after_change(&draft, Operation::Update);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enqueue_after_change_skips_derived_locales() {
        let (queue, mut rx) = fanout_channel();
        let mut derived = published_entry();
        derived.locale = Locale::TURKISH;

        queue.enqueue_after_change(&derived, Operation::Update);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enqueue_after_change_skips_deletes() {
        let (queue, mut rx) = fanout_channel();
        queue.enqueue_after_change(&published_entry(), Operation::Delete);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_gone_does_not_panic() {
        let (queue, rx) = fanout_channel();
        drop(rx);
        // The hook must swallow the send error
        queue.enqueue_after_change(&published_entry(), Operation::Create);
    }
}
