//! Memory index document
//!
//! The index is the one mutable document layered over the immutable object
//! store: a pointer table from session id to that session's latest object
//! version, plus derived aggregate statistics. Its on-disk JSON shape is a
//! compatibility surface with previously persisted state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index document schema version
pub const INDEX_VERSION: &str = "2.0";

/// Fixed name of the index document in the store root
pub const INDEX_DOCUMENT: &str = "memory-index-v2.json";

/// Pointer to the current object version for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReference {
    /// Latest object version holding the session body
    pub object_id: String,
    /// Session id
    pub session_id: String,
    /// Agent handling the session
    pub agent: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// When the session was last saved
    pub last_updated: DateTime<Utc>,
    /// Whether a command was generated
    pub command_generated: bool,
    /// State string at last save
    pub state: String,
    /// Number of conversation turns at last save
    pub message_count: usize,
}

/// Aggregate statistics, always recomputed from the full index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Total number of indexed sessions
    pub total_sessions: usize,
    /// Sessions that generated a command
    pub commands_generated: usize,
    /// Sessions currently in the active state
    pub active_sessions: usize,
    /// Most recent save time across all sessions
    pub last_session_time: Option<DateTime<Utc>>,
}

/// The mutable session index layered over the object store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryIndex {
    /// Schema version
    pub version: String,
    /// Session id -> reference to its latest object version
    pub sessions: HashMap<String, SessionReference>,
    /// Derived statistics
    pub stats: MemoryStats,
}

impl MemoryIndex {
    /// A fresh, empty index
    pub fn empty() -> Self {
        Self {
            version: INDEX_VERSION.to_string(),
            sessions: HashMap::new(),
            stats: MemoryStats::default(),
        }
    }

    /// Recompute all statistics with a full pass over the index
    pub fn recompute_stats(&mut self) {
        let mut stats = MemoryStats {
            total_sessions: self.sessions.len(),
            ..MemoryStats::default()
        };

        for reference in self.sessions.values() {
            if reference.command_generated {
                stats.commands_generated += 1;
            }
            if reference.state == "active" {
                stats.active_sessions += 1;
            }
            match stats.last_session_time {
                Some(last) if reference.last_updated <= last => {}
                _ => stats.last_session_time = Some(reference.last_updated),
            }
        }

        self.stats = stats;
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reference(id: &str, state: &str, command: bool) -> SessionReference {
        let now = Utc::now();
        SessionReference {
            object_id: format!("obj-{id}"),
            session_id: id.to_string(),
            agent: "@muse".to_string(),
            created_at: now,
            last_updated: now,
            command_generated: command,
            state: state.to_string(),
            message_count: 1,
        }
    }

    #[test]
    fn test_empty_index() {
        let index = MemoryIndex::empty();
        assert_eq!(index.version, INDEX_VERSION);
        assert!(index.sessions.is_empty());
        assert_eq!(index.stats.total_sessions, 0);
        assert!(index.stats.last_session_time.is_none());
    }

    #[test]
    fn test_recompute_stats() {
        let mut index = MemoryIndex::empty();
        index
            .sessions
            .insert("a".to_string(), make_reference("a", "active", true));
        index
            .sessions
            .insert("b".to_string(), make_reference("b", "completed", false));
        index
            .sessions
            .insert("c".to_string(), make_reference("c", "active", false));

        index.recompute_stats();
        assert_eq!(index.stats.total_sessions, 3);
        assert_eq!(index.stats.active_sessions, 2);
        assert_eq!(index.stats.commands_generated, 1);
        assert!(index.stats.last_session_time.is_some());
    }

    #[test]
    fn test_document_shape() {
        let mut index = MemoryIndex::empty();
        index
            .sessions
            .insert("s1".to_string(), make_reference("s1", "active", false));
        index.recompute_stats();

        let json = serde_json::to_string_pretty(&index).unwrap();
        for field in [
            "\"version\"",
            "\"sessions\"",
            "\"stats\"",
            "\"object_id\"",
            "\"session_id\"",
            "\"command_generated\"",
            "\"message_count\"",
            "\"total_sessions\"",
            "\"commands_generated\"",
            "\"active_sessions\"",
            "\"last_session_time\"",
        ] {
            assert!(json.contains(field), "missing {field} in {json}");
        }

        let parsed: MemoryIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sessions.len(), 1);
        assert_eq!(parsed.stats.total_sessions, 1);
    }
}
