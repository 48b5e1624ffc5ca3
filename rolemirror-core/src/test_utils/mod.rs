//! Test utilities and helpers for rolemirror
//!
//! Fixtures for seeding an [`InMemoryDirectory`](crate::directory::InMemoryDirectory)
//! with a source/mirror pair, shared by unit and integration tests.

pub mod fixtures;

pub use fixtures::*;
