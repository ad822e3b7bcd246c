//! Catalog assistant — grounded conversational query engine for a book catalog.
//!
//! ARCHITECTURE
//! ============
//! A user message flows through the text layer (`text`), the intent cascade
//! and parameter extraction (`services::intent`, `services::extract`), the
//! catalog resolver (`services::resolver`), and the grounded composer
//! (`services::compose`). `services::assistant` drives the escalation chain
//! for one turn. Catalog storage, transcripts, and the generative model are
//! external collaborators behind traits so every tier runs offline in tests.

pub mod config;
pub mod db;
pub mod llm;
pub mod routes;
pub mod services;
pub mod state;
pub mod text;
