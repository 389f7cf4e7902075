//! Typed reference resolution
//!
//! References arrive as `kind:locator` declarations, resolve independently
//! per kind, and aggregate into one context for downstream synthesis.

pub mod context;
pub mod reference;
pub mod service;
pub mod url_cache;

pub use context::{ContextFragment, ReferenceError, ResolutionOutcome, ResolutionStats};
pub use reference::{Reference, ReferenceKind};
pub use service::Resolver;
pub use url_cache::{
    CachedArtifact, FetchedPayload, HttpFetcher, UrlArtifact, UrlArtifactCache, UrlFetcher,
};
