//! Core subsystems of a localized headless CMS: role-based access
//! evaluation and a multi-locale translation fanout.
//!
//! The CMS framework (storage, versioning, admin UI) and the web renderer
//! live elsewhere; they interact with this crate through the
//! [`store::DocumentStore`] and [`translator::Translate`] traits and the
//! pure predicates in [`access`].
//!
//! The typical flow: a write hook calls
//! [`queue::FanoutQueue::enqueue_after_change`]; the worker started with
//! [`queue::run_worker`] picks the job up and runs
//! [`fanout::translate_document`], which writes one draft per target locale.

pub mod access;
pub mod config;
pub mod document;
pub mod fanout;
pub mod i18n;
pub mod queue;
pub mod retry;
pub mod richtext;
pub mod store;
pub mod translator;
