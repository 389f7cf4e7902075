//! One-shot migration of legacy session metadata paths
//!
//! Legacy sidecars carried relative paths ("memory/sessions/..."). The
//! canonical scheme is absolute: a leading separator marks a migrated record.
//! The sweep is idempotent; already-migrated and non-session records are
//! skipped unchanged.

use super::session::clean_agent_name;
use crate::error::Result;
use crate::store::ObjectStore;
use std::sync::Arc;

/// Outcome of a migration sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records rewritten to the canonical path scheme
    pub updated: usize,
    /// Records left unchanged (non-session or already migrated)
    pub skipped: usize,
}

/// Rewrites legacy session metadata to the canonical path scheme
pub struct PathMigrator {
    objects: Arc<ObjectStore>,
}

impl PathMigrator {
    /// Create a migrator over the given object store
    pub fn new(objects: Arc<ObjectStore>) -> Self {
        Self { objects }
    }

    /// Sweep every persisted metadata record once.
    ///
    /// Per-record failures are logged and skipped; the sweep always runs to
    /// the end and reports how many records it touched.
    pub async fn run(&self) -> Result<MigrationReport> {
        tracing::info!("Starting memory path migration");

        let mut report = MigrationReport::default();

        for mut meta in self.objects.list_metadata().await {
            if meta.kind != "session" {
                report.skipped += 1;
                continue;
            }

            if meta.paths.iter().any(|p| p.starts_with('/')) {
                report.skipped += 1;
                continue;
            }

            let mut new_paths: Vec<String> = Vec::new();
            let push_unique = |paths: &mut Vec<String>, candidate: String| {
                if !paths.contains(&candidate) {
                    paths.push(candidate);
                }
            };

            if !meta.session.is_empty() {
                push_unique(&mut new_paths, format!("/memory/{}", meta.session));
            }

            for old in &meta.paths {
                let normalized = if old.starts_with('/') {
                    old.clone()
                } else {
                    format!("/{old}")
                };
                push_unique(&mut new_paths, normalized);
            }

            if !meta.session.is_empty() {
                if let Some(created) = meta.created {
                    let date = created.format("%Y-%m-%d");
                    push_unique(
                        &mut new_paths,
                        format!("/by-date/{date}/memory/{}", meta.session),
                    );
                }
                if !meta.agent.is_empty() {
                    push_unique(
                        &mut new_paths,
                        format!(
                            "/by-agent/{}/memory/{}",
                            clean_agent_name(&meta.agent),
                            meta.session
                        ),
                    );
                }
            }

            meta.paths = new_paths;

            if let Err(e) = self.objects.save_metadata(&mut meta).await {
                tracing::warn!("Failed to write migrated metadata for {}: {e}", meta.id);
                continue;
            }
            self.objects.register_paths(&meta).await;

            report.updated += 1;
            tracing::debug!("Updated paths for session {}", meta.session);
        }

        tracing::info!(
            "Migration complete: {} updated, {} skipped",
            report.updated,
            report.skipped
        );
        Ok(report)
    }
}
