//! Shared types, tokenizer, corpus loader and configuration for Loumina.
//!
//! Configuration uses Figment to merge defaults + `loumina.toml` +
//! `loumina.<env>.toml` + `LOUMINA_*` env vars. The retrieval engines never
//! read the environment themselves; callers inject plain parameters.

pub mod config;
pub mod corpus;
pub mod error;
pub mod tokenize;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
