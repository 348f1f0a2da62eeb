//! Core types and shared functionality for marketdeck.
//!
//! This crate provides:
//! - Cache key normalization and record types
//! - In-memory and SQLite-backed durable cache layers
//! - Unified error types

pub mod cache;
pub mod error;

pub use cache::{CacheRecord, DurableStore, MemoryLayer, normalize_key};
pub use error::Error;
