//! Reference resolution service
//!
//! Dispatches parsed references to per-kind resolution logic. The batch is
//! parsed up-front and fails fast on structural errors; after that, every
//! reference resolves independently and failures are collected per reference
//! rather than aborting the batch.

use super::context::{ContextFragment, ReferenceError, ResolutionOutcome};
use super::reference::{Reference, ReferenceKind};
use super::url_cache::UrlArtifactCache;
use crate::error::{Error, Result};
use crate::memory::MemoryStore;
use crate::store::ObjectStore;
use std::sync::Arc;

/// Search hits that get full excerpts before the list is elided
const SEARCH_RESULT_LIMIT: usize = 3;

/// Per-kind content caps applied when formatting fragments
const FILE_CONTENT_LIMIT: usize = 1000;
const URL_CONTENT_LIMIT: usize = 800;
const TOOL_CONTENT_LIMIT: usize = 800;
const EXCERPT_LIMIT: usize = 150;
const TRANSCRIPT_MESSAGE_LIMIT: usize = 10;

/// Resolves typed references into context fragments
pub struct Resolver {
    objects: Arc<ObjectStore>,
    memory: Arc<MemoryStore>,
    urls: UrlArtifactCache,
}

impl Resolver {
    /// Create a resolver over the shared stores
    pub fn new(objects: Arc<ObjectStore>, memory: Arc<MemoryStore>, urls: UrlArtifactCache) -> Self {
        Self {
            objects,
            memory,
            urls,
        }
    }

    /// Resolve a batch of `kind:locator` declarations.
    ///
    /// Structural parse failures abort the whole request before any
    /// resolution work. Afterwards, one reference's failure never aborts the
    /// batch: the outcome carries resolved fragments plus a per-reference
    /// error list.
    pub async fn resolve_all<S: AsRef<str>>(&self, specs: &[S]) -> Result<ResolutionOutcome> {
        let references = Reference::parse_all(specs)?;
        tracing::debug!("Resolving {} references", references.len());

        let mut outcome = ResolutionOutcome::default();
        for reference in &references {
            match self.resolve_one(reference).await {
                Ok(content) => outcome.fragments.push(ContextFragment {
                    kind: reference.kind,
                    locator: reference.locator.clone(),
                    content,
                }),
                Err(e) => {
                    tracing::debug!("Reference {reference} failed: {e}");
                    outcome.errors.push(ReferenceError::new(reference, &e));
                }
            }
        }

        Ok(outcome)
    }

    async fn resolve_one(&self, reference: &Reference) -> Result<String> {
        match reference.kind {
            ReferenceKind::Search => self.resolve_search(&reference.locator).await,
            ReferenceKind::Tool => self.resolve_tool(&reference.locator).await,
            ReferenceKind::Memory => self.resolve_memory(&reference.locator).await,
            ReferenceKind::File => self.resolve_file(&reference.locator).await,
            ReferenceKind::Url => self.resolve_url(&reference.locator).await,
        }
    }

    /// Search stored sessions and format matching excerpts
    async fn resolve_search(&self, query: &str) -> Result<String> {
        let matches = self.memory.search_sessions(query).await;
        if matches.is_empty() {
            return Ok(format!("No results found for search query: '{query}'"));
        }

        let mut parts = vec![format!(
            "Search results for '{query}' ({} sessions):",
            matches.len()
        )];

        for (i, summary) in matches.iter().take(SEARCH_RESULT_LIMIT).enumerate() {
            parts.push(format!(
                "{}. {} with {} ({}, {} messages)",
                i + 1,
                summary.id,
                summary.agent,
                summary.state,
                summary.message_count
            ));

            // Best effort: a missing body downgrades the hit to its summary line
            if let Ok(session) = self.memory.load_session(&summary.id).await {
                if let Some(first) = session.messages.first() {
                    parts.push(format!("   Excerpt: {}", truncate(&first.content, EXCERPT_LIMIT)));
                }
            }
        }

        if matches.len() > SEARCH_RESULT_LIMIT {
            parts.push(format!(
                "... and {} more sessions",
                matches.len() - SEARCH_RESULT_LIMIT
            ));
        }

        Ok(parts.join("\n"))
    }

    /// Look up a declared tool through the logical path index
    async fn resolve_tool(&self, name: &str) -> Result<String> {
        let id = self
            .objects
            .resolve_path(&format!("/tools/{name}"))
            .await
            .ok_or_else(|| Error::NotFound(format!("tool not found: {name}")))?;

        let meta = self.objects.load_metadata(&id).await?;
        let body = self.objects.read(&id).await?;

        let mut parts = vec![format!("Tool Definition: {name}"), format!("ID: {id}")];
        if !meta.description.is_empty() {
            parts.push(format!("Description: {}", meta.description));
        }
        if !meta.tags.is_empty() {
            parts.push(format!("Tags: {}", meta.tags.join(", ")));
        }
        parts.push(format!(
            "Definition:\n{}",
            truncate(&String::from_utf8_lossy(&body), TOOL_CONTENT_LIMIT)
        ));

        Ok(parts.join("\n"))
    }

    /// Load a stored session and format its transcript
    async fn resolve_memory(&self, session_id: &str) -> Result<String> {
        let session = self.memory.load_session(session_id).await?;

        let mut parts = vec![format!(
            "Session {} with {} ({}, {} messages)",
            session.id,
            session.agent,
            session.state,
            session.messages.len()
        )];

        for message in session.messages.iter().take(TRANSCRIPT_MESSAGE_LIMIT) {
            parts.push(format!(
                "{}: {}",
                message.role,
                truncate(&message.content, EXCERPT_LIMIT)
            ));
        }
        if session.messages.len() > TRANSCRIPT_MESSAGE_LIMIT {
            parts.push(format!(
                "[{} earlier messages omitted]",
                session.messages.len() - TRANSCRIPT_MESSAGE_LIMIT
            ));
        }

        Ok(parts.join("\n"))
    }

    /// Read a local file
    async fn resolve_file(&self, path: &str) -> Result<String> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Storage(format!("failed to read file {path}: {e}")))?;

        Ok(format!(
            "Local File: {path}\nSize: {} bytes\nContent:\n{}",
            content.len(),
            truncate(content.trim(), FILE_CONTENT_LIMIT)
        ))
    }

    /// Resolve a URL through the artifact cache
    async fn resolve_url(&self, url: &str) -> Result<String> {
        let artifact = self.urls.resolve(url).await?;

        let provenance = if artifact.cache_hit {
            format!("[Cached from {}]", artifact.fetched_at.to_rfc3339())
        } else {
            "[Freshly fetched]".to_string()
        };

        Ok(format!(
            "URL: {url}\n{provenance}\nContent:\n{}",
            truncate(&artifact.content, URL_CONTENT_LIMIT)
        ))
    }
}

/// Character-safe truncation with an elision marker
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{cut}\n[Content truncated]")
}
