//! Session model
//!
//! A session is created on its first message, mutated on every turn, and
//! persisted as a new object version on each save. [`PersistentSession`] is
//! the full on-disk shape; [`SessionSummary`] is the lightweight shape served
//! from the index without touching session bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Session is receiving messages
    Active,
    /// Session is open but has gone quiet
    Idle,
    /// Session finished normally
    Completed,
    /// Session was abandoned mid-flight
    Abandoned,
}

impl SessionState {
    /// String form used in index entries and tags
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Idle => "idle",
            SessionState::Completed => "completed",
            SessionState::Abandoned => "abandoned",
        }
    }

    /// Map session state to a metadata lifecycle classification
    pub fn lifecycle(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Completed => "stable",
            SessionState::Abandoned => "archived",
            _ => "draft",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Speaker role ("user", "assistant", ...)
    pub role: String,
    /// Message text
    pub content: String,
    /// When the message was recorded
    pub timestamp: DateTime<Utc>,
}

/// A live work session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session id
    pub id: String,
    /// Agent handling the session (e.g. "@muse")
    pub agent: String,
    /// Current state
    pub state: SessionState,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp
    pub last_activity: DateTime<Utc>,
    /// Conversation turns so far
    pub messages: Vec<Message>,
    /// Name of the command generated in this session, if any
    pub generated_command: Option<String>,
}

impl Session {
    /// Create a new session for an agent
    pub fn new(agent: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            agent: agent.into(),
            state: SessionState::Active,
            created_at: now,
            last_activity: now,
            messages: Vec::new(),
            generated_command: None,
        }
    }

    /// Append a conversation turn and touch last activity
    pub fn record_message(&mut self, role: impl Into<String>, content: impl Into<String>) {
        let now = Utc::now();
        self.messages.push(Message {
            role: role.into(),
            content: content.into(),
            timestamp: now,
        });
        self.last_activity = now;
    }
}

/// Descriptor for a command generated during a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandGenerated {
    /// Command name
    pub name: String,
    /// When generation was recorded
    pub created_at: DateTime<Utc>,
    /// Derived storage path for the generated command
    pub path: String,
}

/// Full session shape persisted to the object store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentSession {
    /// Session id
    pub id: String,
    /// Agent handling the session
    pub agent: String,
    /// State at save time
    pub state: SessionState,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// When this version was written
    pub updated_at: DateTime<Utc>,
    /// Last activity timestamp
    pub last_activity: DateTime<Utc>,
    /// Conversation turns
    pub messages: Vec<Message>,
    /// Command generation descriptor, if a command was generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_generated: Option<CommandGenerated>,
}

/// Lightweight session view served from index-resident fields only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session id
    pub id: String,
    /// Agent handling the session
    pub agent: String,
    /// Whether a command was generated
    pub command_generated: bool,
    /// State string as recorded in the index
    pub state: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp
    pub last_activity: DateTime<Utc>,
    /// Number of conversation turns at last save
    pub message_count: usize,
}

/// Filesystem-safe agent name: strips any leading "@", replaces spaces,
/// and lowercases
pub fn clean_agent_name(agent: &str) -> String {
    agent
        .trim_start_matches('@')
        .replace(' ', "-")
        .to_lowercase()
}
