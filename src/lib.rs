//! Tidepool - Persistent Memory and Reference Resolution for AI Work Sessions
//!
//! Tidepool is the memory subsystem of a local AI daemon. It keeps durable,
//! content-addressed records of work sessions and externally supplied
//! references, and composes them into context for downstream tool synthesis.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      Reference Resolver                     │
//! │   search ─┐  tool ─┐  memory ─┐  file ─┐  url ─┐            │
//! │           │        │          │        │       │            │
//! │           ▼        ▼          ▼        ▼       ▼            │
//! │  ┌─────────────────────────────┐   ┌────────────────────┐  │
//! │  │        Memory Index         │   │ URL Artifact Cache │  │
//! │  │  session id → latest object │   │  url → {object id, │  │
//! │  │  + derived statistics       │   │   fetched at} + TTL│  │
//! │  └──────────────┬──────────────┘   └─────────┬──────────┘  │
//! │                 │                            │             │
//! │                 ▼                            ▼             │
//! │  ┌──────────────────────────────────────────────────────┐ │
//! │  │                    Object Store                       │ │
//! │  │  immutable content-addressed blobs + JSON sidecars    │ │
//! │  │  logical path index + mutable named pointer documents │ │
//! │  └──────────────────────────────────────────────────────┘ │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two addressing regimes coexist: immutable blobs identified by the SHA-256
//! of their content, and a small set of mutable documents (the memory index,
//! the URL cache pointer table) addressed by fixed name because their
//! identity must persist across content changes.
//!
//! ## Modules
//!
//! - [`store`]: content-addressed object store, metadata sidecars, path index
//! - [`memory`]: session model, mutable memory index, path migration
//! - [`resolve`]: typed reference resolution and the URL artifact cache
//! - [`config`]: configuration management

pub mod config;
pub mod error;
pub mod memory;
pub mod resolve;
pub mod store;

pub use config::TidepoolConfig;
pub use error::{Error, Result};
