//! Domain services behind the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `assistant` runs one turn over the other modules: `intent` and `extract`
//! classify the message, `resolver` reads `catalog`, and `compose` writes
//! the reply. `context` and `transcript` hold conversation state in memory
//! and durably.

pub mod assistant;
pub mod catalog;
pub mod compose;
pub mod context;
pub mod extract;
pub mod intent;
pub mod resolver;
pub mod transcript;
