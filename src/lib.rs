//! # Context Cascade
//!
//! Resolves the best context for a natural-language query over a local
//! corpus of podcast transcripts, markdown notes and plain text.
//!
//! A query is classified by intent and then run through a fixed cascade of
//! retrieval strategies. The first strategy that produces text wins:
//!
//! ```text
//! query ──▶ intent ──▶ count ─▶ analysis ─▶ file metadata ─▶ author quotes
//!                         ─▶ keyword search ─▶ semantic ─▶ corpus dump
//!                                                              │
//!                                       RetrievalResult ◀──────┘
//! ```
//!
//! The pure parsing, analysis and rendering logic lives in
//! [`context_cascade_core`]; this crate adds the filesystem corpus, the
//! embedding providers, configuration and the `cascade` CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! cascade docs
//! cascade resolve "How many times is cocktail mentioned in episode 13?"
//! cascade count cocktail --episode 13 --json
//! cascade search "growth channels"
//! cascade prompt "list the authors and quotes"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`corpus`] | Document listing and reading (filesystem, in-memory) |
//! | [`loader`] | Corpus snapshots and the analysis cache |
//! | [`embedding`] | Embedding providers |
//! | [`index`] | Semantic index construction |
//! | [`semantic`] | Time-bounded semantic search |
//! | [`engine`] | The retrieval cascade |
//! | [`prompt`] | System prompt assembly |
//! | [`docs`], [`query`] | CLI commands |

pub mod config;
pub mod corpus;
pub mod docs;
pub mod embedding;
pub mod engine;
pub mod index;
pub mod loader;
pub mod prompt;
pub mod query;
pub mod semantic;

pub use context_cascade_core::error::RetrievalError;
pub use context_cascade_core::models::{RetrievalResult, SourceStrategy};
pub use engine::ContextEngine;
