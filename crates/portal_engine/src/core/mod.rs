//! Core engine infrastructure
//!
//! Houses the unified configuration consumed by the scene registry, the
//! portal traversal and the movement resolver.

pub mod config;
