//! Chat session data model
//!
//! - `types`: sessions, messages and the persisted record shape
//! - `ids`: local-only session ids and message ids
//! - `convert`: coercion of remote payloads, including timestamp normalization
//! - `merge`: pure transitions of the merged session list

pub mod convert;
pub mod ids;
pub mod merge;
pub mod types;

pub use merge::{SessionEvent, TitlePolicy};
pub use types::{ChatMessage, ChatRecord, ChatSession, Role};
