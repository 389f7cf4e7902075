//! Session memory store backed by the content-addressed object store
//!
//! Every save writes a new immutable object version and repoints the mutable
//! index entry at it; prior versions stay addressable but unreferenced. The
//! index and its on-disk document are the shared mutable state: reads take
//! the shared lock, saves hold the exclusive lock across the object write,
//! the index update, and the wholesale index rewrite.

use super::index::{MemoryIndex, MemoryStats, SessionReference, INDEX_DOCUMENT};
use super::keywords::KeywordExtractor;
use super::session::{
    clean_agent_name, CommandGenerated, PersistentSession, Session, SessionSummary,
};
use crate::error::{Error, Result};
use crate::store::{Metadata, ObjectStore};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Persistent session store with a mutable fast-lookup index
pub struct MemoryStore {
    objects: Arc<ObjectStore>,
    extractor: Box<dyn KeywordExtractor>,
    index: RwLock<MemoryIndex>,
}

impl MemoryStore {
    /// Open the memory store, loading the persisted index if one exists.
    ///
    /// An absent or unreadable index document yields an empty index rather
    /// than a failure; the next successful save rewrites it.
    pub async fn new(objects: Arc<ObjectStore>, extractor: Box<dyn KeywordExtractor>) -> Self {
        let index = match Self::load_index(&objects).await {
            Ok(index) => index,
            Err(e) => {
                tracing::info!("Creating new memory index: {e}");
                MemoryIndex::empty()
            }
        };

        Self {
            objects,
            extractor,
            index: RwLock::new(index),
        }
    }

    /// Persist a session as a new object version and repoint its index entry.
    ///
    /// Returns the new object id. A failure to persist the index document
    /// after the object write is logged and swallowed: the session is already
    /// durable, and a later save repairs the stale entry.
    pub async fn save_session(&self, session: &Session) -> Result<String> {
        tracing::debug!("Saving session {} to object store", session.id);

        let mut index = self.index.write().await;

        let now = Utc::now();
        let persistent = PersistentSession {
            id: session.id.clone(),
            agent: session.agent.clone(),
            state: session.state,
            created_at: session.created_at,
            updated_at: now,
            last_activity: session.last_activity,
            messages: session.messages.clone(),
            command_generated: session.generated_command.as_ref().map(|name| {
                CommandGenerated {
                    name: name.clone(),
                    created_at: now,
                    path: format!("commands/{name}"),
                }
            }),
        };

        let data = serde_json::to_vec_pretty(&persistent)?;
        let metadata = self.session_metadata(session);
        let object_id = self.objects.store_with_metadata(&data, metadata).await?;

        index.sessions.insert(
            session.id.clone(),
            SessionReference {
                object_id: object_id.clone(),
                session_id: session.id.clone(),
                agent: session.agent.clone(),
                created_at: session.created_at,
                last_updated: now,
                command_generated: session.generated_command.is_some(),
                state: session.state.as_str().to_string(),
                message_count: session.messages.len(),
            },
        );
        index.recompute_stats();

        if let Err(e) = Self::persist_index(&self.objects, &index).await {
            tracing::warn!("Failed to save memory index: {e}");
        }

        tracing::debug!("Session {} saved as {}", session.id, &object_id[..12]);
        Ok(object_id)
    }

    /// Load the full session body for an id
    pub async fn load_session(&self, session_id: &str) -> Result<PersistentSession> {
        let reference = {
            let index = self.index.read().await;
            index
                .sessions
                .get(session_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("session not found: {session_id}")))?
        };

        let data = match self.objects.read(&reference.object_id).await {
            Ok(data) => data,
            Err(Error::NotFound(msg)) => {
                return Err(Error::Storage(format!("failed to read session object: {msg}")))
            }
            Err(e) => return Err(e),
        };

        Ok(serde_json::from_slice(&data)?)
    }

    /// Load all sessions created within the last `days` days.
    ///
    /// The needed references are snapshotted under the shared lock; session
    /// bodies load outside any lock, and per-entry failures are skipped.
    pub async fn recent_sessions(&self, days: i64) -> Vec<PersistentSession> {
        let cutoff = Utc::now() - Duration::days(days);

        let references: Vec<SessionReference> = {
            let index = self.index.read().await;
            index
                .sessions
                .values()
                .filter(|r| r.created_at > cutoff)
                .cloned()
                .collect()
        };

        let mut sessions = Vec::new();
        for reference in references {
            match self.load_session(&reference.session_id).await {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!("Skipping unreadable session {}: {e}", reference.session_id);
                }
            }
        }

        sessions
    }

    /// Search sessions by case-insensitive substring match on id and agent.
    ///
    /// Operates purely on index-resident fields; session bodies are never
    /// deserialized.
    pub async fn search_sessions(&self, query: &str) -> Vec<SessionSummary> {
        let query = query.to_lowercase();
        let index = self.index.read().await;

        index
            .sessions
            .values()
            .filter(|r| {
                r.session_id.to_lowercase().contains(&query)
                    || r.agent.to_lowercase().contains(&query)
            })
            .map(summary_from_reference)
            .collect()
    }

    /// Lightweight summaries for every indexed session
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        let index = self.index.read().await;
        index.sessions.values().map(summary_from_reference).collect()
    }

    /// Current aggregate statistics
    pub async fn stats(&self) -> MemoryStats {
        self.index.read().await.stats.clone()
    }

    /// Derive the metadata sidecar for a session save
    fn session_metadata(&self, session: &Session) -> Metadata {
        let mut tags = vec![
            "conversation".to_string(),
            "ai".to_string(),
            session.agent.to_lowercase(),
            session.state.as_str().to_string(),
        ];
        if let Some(name) = &session.generated_command {
            tags.push(name.clone());
        }
        for message in &session.messages {
            tags.extend(self.extractor.keywords(&message.content));
        }

        let date = session.created_at.format("%Y-%m-%d");
        let agent_dir = clean_agent_name(&session.agent);

        let mut meta = Metadata::new("session");
        meta.title = format!("Session {}", session.id);
        meta.description = format!("AI conversation with {}", session.agent);
        meta.tags = tags;
        meta.session = session.id.clone();
        meta.agent = session.agent.clone();
        meta.lifecycle = session.state.lifecycle().to_string();
        meta.paths = vec![
            format!("/memory/{}", session.id),
            format!("/by-date/{date}/memory/{}", session.id),
            format!("/by-agent/{agent_dir}/memory/{}", session.id),
        ];
        meta
    }

    async fn load_index(objects: &ObjectStore) -> Result<MemoryIndex> {
        let data = objects.read_named(INDEX_DOCUMENT).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn persist_index(objects: &ObjectStore, index: &MemoryIndex) -> Result<()> {
        let data = serde_json::to_vec_pretty(index)?;
        objects.write_named(INDEX_DOCUMENT, &data).await
    }
}

fn summary_from_reference(reference: &SessionReference) -> SessionSummary {
    SessionSummary {
        id: reference.session_id.clone(),
        agent: reference.agent.clone(),
        command_generated: reference.command_generated,
        state: reference.state.clone(),
        created_at: reference.created_at,
        last_activity: reference.last_updated,
        message_count: reference.message_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::keywords::StopWordExtractor;
    use crate::memory::session::SessionState;
    use tempfile::TempDir;

    async fn make_store() -> (Arc<ObjectStore>, MemoryStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let objects = Arc::new(ObjectStore::new(dir.path()).await.unwrap());
        let store =
            MemoryStore::new(objects.clone(), Box::new(StopWordExtractor::default())).await;
        (objects, store, dir)
    }

    fn make_session(agent: &str) -> Session {
        let mut session = Session::new(agent);
        session.record_message("user", "please summarize yesterday's transcript");
        session.record_message("assistant", "here is the summary");
        session
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let (_objects, store, _dir) = make_store().await;

        let mut session = make_session("@muse");
        session.state = SessionState::Completed;
        session.generated_command = Some("summarize".to_string());

        store.save_session(&session).await.unwrap();
        let loaded = store.load_session(&session.id).await.unwrap();

        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.agent, "@muse");
        assert_eq!(loaded.state, SessionState::Completed);
        assert_eq!(loaded.created_at, session.created_at);
        assert_eq!(loaded.last_activity, session.last_activity);
        assert_eq!(loaded.messages, session.messages);

        let command = loaded.command_generated.unwrap();
        assert_eq!(command.name, "summarize");
        assert_eq!(command.path, "commands/summarize");
    }

    #[tokio::test]
    async fn test_load_session_not_found() {
        let (_objects, store, _dir) = make_store().await;
        let err = store.load_session("nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_save_registers_canonical_paths() {
        let (objects, store, _dir) = make_store().await;

        let mut session = make_session("@The Muse");
        session.created_at = "2024-01-02T03:04:05Z".parse().unwrap();
        let object_id = store.save_session(&session).await.unwrap();

        let direct = format!("/memory/{}", session.id);
        let by_date = format!("/by-date/2024-01-02/memory/{}", session.id);
        let by_agent = format!("/by-agent/the-muse/memory/{}", session.id);

        for path in [&direct, &by_date, &by_agent] {
            assert_eq!(objects.resolve_path(path).await, Some(object_id.clone()));
        }
    }

    #[tokio::test]
    async fn test_save_derives_tags_and_lifecycle() {
        let (objects, store, _dir) = make_store().await;

        let mut session = Session::new("@Muse");
        session.record_message("user", "refactor the scheduler before friday");
        session.state = SessionState::Completed;
        let object_id = store.save_session(&session).await.unwrap();

        let meta = objects.load_metadata(&object_id).await.unwrap();
        assert_eq!(meta.kind, "session");
        assert_eq!(meta.lifecycle, "stable");
        assert!(meta.tags.contains(&"conversation".to_string()));
        assert!(meta.tags.contains(&"@muse".to_string()));
        assert!(meta.tags.contains(&"completed".to_string()));
        assert!(meta.tags.contains(&"refactor".to_string()));
        assert!(meta.tags.contains(&"scheduler".to_string()));
        // Short and common words never become tags
        assert!(!meta.tags.contains(&"the".to_string()));
        assert!(!meta.tags.contains(&"before".to_string()));
    }

    #[tokio::test]
    async fn test_resave_repoints_index_and_keeps_old_version() {
        let (objects, store, _dir) = make_store().await;

        let mut session = make_session("@muse");
        let first = store.save_session(&session).await.unwrap();

        session.record_message("user", "one more thing");
        let second = store.save_session(&session).await.unwrap();
        assert_ne!(first, second);

        // Index points at the latest version
        let loaded = store.load_session(&session.id).await.unwrap();
        assert_eq!(loaded.messages.len(), 3);

        // The superseded version stays addressable
        assert!(objects.exists(&first).await);
    }

    #[tokio::test]
    async fn test_index_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let session = make_session("@muse");

        {
            let objects = Arc::new(ObjectStore::new(dir.path()).await.unwrap());
            let store =
                MemoryStore::new(objects, Box::new(StopWordExtractor::default())).await;
            store.save_session(&session).await.unwrap();
        }

        let objects = Arc::new(ObjectStore::new(dir.path()).await.unwrap());
        let store = MemoryStore::new(objects, Box::new(StopWordExtractor::default())).await;
        let loaded = store.load_session(&session.id).await.unwrap();
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(store.stats().await.total_sessions, 1);
    }

    #[tokio::test]
    async fn test_cold_start_with_corrupt_index() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(INDEX_DOCUMENT), "not valid json").unwrap();

        let objects = Arc::new(ObjectStore::new(dir.path()).await.unwrap());
        let store = MemoryStore::new(objects, Box::new(StopWordExtractor::default())).await;
        assert_eq!(store.stats().await.total_sessions, 0);

        // Still fully operational
        let session = make_session("@muse");
        store.save_session(&session).await.unwrap();
        assert!(store.load_session(&session.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_index_persist_failure_is_swallowed_and_repaired() {
        let dir = TempDir::new().unwrap();
        let objects = Arc::new(ObjectStore::new(dir.path()).await.unwrap());
        let store =
            MemoryStore::new(objects.clone(), Box::new(StopWordExtractor::default())).await;

        // Make the index document unwritable by occupying its name with a
        // directory; the save itself must still succeed.
        let index_path = dir.path().join(INDEX_DOCUMENT);
        std::fs::create_dir(&index_path).unwrap();

        let session = make_session("@muse");
        let object_id = store.save_session(&session).await.unwrap();

        // The session object is durably committed and readable
        assert!(objects.exists(&object_id).await);
        assert!(store.load_session(&session.id).await.is_ok());

        // Once the document becomes writable, the next save repairs it
        std::fs::remove_dir(&index_path).unwrap();
        store.save_session(&session).await.unwrap();

        let reloaded = ObjectStore::new(dir.path()).await.unwrap();
        let persisted = reloaded.read_named(INDEX_DOCUMENT).await.unwrap();
        let parsed: MemoryIndex = serde_json::from_slice(&persisted).unwrap();
        assert!(parsed.sessions.contains_key(&session.id));
    }

    #[tokio::test]
    async fn test_recent_sessions_filters_by_age() {
        let (_objects, store, _dir) = make_store().await;

        let fresh = make_session("@muse");
        store.save_session(&fresh).await.unwrap();

        let mut old = make_session("@muse");
        old.created_at = Utc::now() - Duration::days(30);
        store.save_session(&old).await.unwrap();

        let recent = store.recent_sessions(7).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, fresh.id);
    }

    #[tokio::test]
    async fn test_recent_sessions_skips_unreadable_entries() {
        let (objects, store, _dir) = make_store().await;

        let good = make_session("@muse");
        store.save_session(&good).await.unwrap();

        let bad = make_session("@muse");
        let bad_object = store.save_session(&bad).await.unwrap();
        std::fs::remove_file(objects.object_path(&bad_object).unwrap()).unwrap();

        let recent = store.recent_sessions(7).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, good.id);
    }

    #[tokio::test]
    async fn test_search_sessions_case_insensitive() {
        let (_objects, store, _dir) = make_store().await;

        let mut claude = make_session("@Claude");
        claude.id = "claude-session-1".to_string();
        store.save_session(&claude).await.unwrap();

        let mut other = make_session("@muse");
        other.id = "muse-session-1".to_string();
        store.save_session(&other).await.unwrap();

        let matches = store.search_sessions("claude").await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "claude-session-1");
        assert_eq!(matches[0].agent, "@Claude");
        assert_eq!(matches[0].message_count, 2);

        // Agent name matches too
        let matches = store.search_sessions("MUSE").await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "muse-session-1");

        assert!(store.search_sessions("nothing").await.is_empty());
    }

    #[tokio::test]
    async fn test_stats_recomputed_on_save() {
        let (_objects, store, _dir) = make_store().await;

        let mut active = make_session("@muse");
        active.generated_command = Some("fetch".to_string());
        store.save_session(&active).await.unwrap();

        let mut done = make_session("@muse");
        done.state = SessionState::Completed;
        store.save_session(&done).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.active_sessions, 1);
        assert_eq!(stats.commands_generated, 1);
        assert!(stats.last_session_time.is_some());

        let summaries = store.summaries().await;
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().any(|s| s.command_generated));
    }

    #[tokio::test]
    async fn test_concurrent_saves_all_indexed() {
        let dir = TempDir::new().unwrap();
        let objects = Arc::new(ObjectStore::new(dir.path()).await.unwrap());
        let store = Arc::new(
            MemoryStore::new(objects, Box::new(StopWordExtractor::default())).await,
        );

        let mut handles = Vec::new();
        for i in 0..8usize {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut session = Session::new("@muse");
                session.id = format!("concurrent-{i}");
                for turn in 0..=i {
                    session.record_message("user", format!("turn {turn}"));
                }
                store.save_session(&session).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = store.stats().await;
        assert_eq!(stats.total_sessions, 8);
        for i in 0..8usize {
            let loaded = store.load_session(&format!("concurrent-{i}")).await.unwrap();
            assert_eq!(loaded.messages.len(), i + 1);
        }
    }
}
