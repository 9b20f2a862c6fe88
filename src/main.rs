//! Fanout preview: run the translation fanout against a document file.
//!
//! Reads a canonical-locale document from a JSON file, seeds the in-memory
//! store, pushes the document through the after-change hook and the queue
//! worker, then prints the per-locale drafts. Useful for checking prompt
//! and payload behavior without a running CMS.
//!
//! Usage: `fanout-preview path/to/document.json`

use anyhow::{Context, Result};
use chrono::Utc;
use lexicon_cms::config::Config;
use lexicon_cms::document::{ensure_published_at, Document, Operation};
use lexicon_cms::i18n::Locale;
use lexicon_cms::queue::{fanout_channel, run_worker};
use lexicon_cms::store::{DocumentStore, MemoryStore};
use lexicon_cms::translator::OpenAiTranslator;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lexicon_cms=info".parse()?),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("Usage: fanout-preview <document.json>")?;

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read document file {}", path))?;
    let mut document: Document =
        serde_json::from_str(&raw).context("Failed to parse document JSON")?;
    ensure_published_at(&mut document, Utc::now());

    let config = Config::from_env()?;
    info!(
        "Previewing fanout for {}/{} ({} environment)",
        document.collection, document.id, config.environment
    );

    let store = Arc::new(MemoryStore::new());
    store.seed(document.clone());

    let settle_delay = config.settle_delay();
    let translator = Arc::new(OpenAiTranslator::new(reqwest::Client::new(), config));

    let (queue, rx) = fanout_channel();
    queue.enqueue_after_change(&document, Operation::Update);
    drop(queue); // worker exits once the queue drains

    // Set FANOUT_DELAY_SECS=0 to skip the settle delay when iterating
    run_worker(rx, store.clone(), translator, settle_delay).await;

    for target in Locale::targets() {
        match store
            .find_by_id(document.collection, document.id, target)
            .await?
        {
            Some(draft) => println!(
                "--- {} ---\n{}",
                target,
                serde_json::to_string_pretty(&draft)?
            ),
            None => println!("--- {} ---\n(no draft written)", target),
        }
    }

    Ok(())
}
