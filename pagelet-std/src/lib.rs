//! # pagelet-std
//!
//! Standard implementation of the Pagelet partial-update pipeline.
//!
//! This crate provides:
//! - **The bus**: [`Bus`] — event registry, extension manager, dispatcher
//!   and request orchestrator in one process-scoped instance
//! - **The snippet patch engine**: [`SnippetEngine`]
//! - **Bundled extensions**: validation, forms, snippets, redirect, state,
//!   unique, abort, load, binder (see [`ext`])
//! - **Testing utilities**: fakes and recorders (see [`testing`])

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use pagelet_core;

mod builder;
mod bus;
pub mod ext;
mod request;
mod snippets;
pub mod testing;

pub use builder::BusBuilder;
pub use bus::Bus;
pub use snippets::{CallbackList, SnippetEngine, escape_selector};
