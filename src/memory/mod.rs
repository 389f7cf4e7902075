//! Session memory: a mutable index over immutable session versions

pub mod index;
pub mod keywords;
pub mod migrate;
pub mod session;
pub mod store;

pub use index::{MemoryIndex, MemoryStats, SessionReference};
pub use keywords::{KeywordExtractor, StopWordExtractor};
pub use migrate::{MigrationReport, PathMigrator};
pub use session::{
    clean_agent_name, CommandGenerated, Message, PersistentSession, Session, SessionState,
    SessionSummary,
};
pub use store::MemoryStore;
