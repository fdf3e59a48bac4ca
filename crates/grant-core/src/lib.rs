//! grant-core: document model, local store, view derivation, and the chat
//! assistant session behind the `grant` CLI.
//!
//! # Conventions
//!
//! - **Errors**: library operations return [`error::GrantError`]; config
//!   loading uses `anyhow::Result` with context.
//! - **Logging**: `tracing` macros only; the binary installs the subscriber.

pub mod chat;
pub mod config;
pub mod error;
pub mod lock;
pub mod model;
pub mod report;
pub mod store;
pub mod transfer;
pub mod view;
