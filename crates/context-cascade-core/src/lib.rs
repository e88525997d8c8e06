//! # Context Cascade Core
//!
//! Pure logic for context-cascade: data models, the document classifier,
//! structural parsers, term and topic extraction, the query intent
//! classifier, term counting, keyword search, rendering, chunking, and the
//! embedding and vector-index traits.
//!
//! This crate contains no tokio, no network clients and no filesystem I/O.
//! Documents arrive as already-read [`models::Document`] values; the
//! `context-cascade` crate owns reading, embedding providers and the
//! retrieval cascade itself.

pub mod analysis;
pub mod chunk;
pub mod classify;
pub mod count;
pub mod embedding;
pub mod error;
pub mod index;
pub mod intent;
pub mod models;
pub mod parse;
pub mod render;
pub mod resolve;
pub mod search;
pub mod terms;
pub mod topics;
