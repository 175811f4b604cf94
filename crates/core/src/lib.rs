//! Aizome Core - Shared types library.
//!
//! This crate provides common types used across all Aizome components:
//! - `server` - JSON API for the storefront, courses and the dyeing game
//! - `cli` - Command-line tools for migrations and seeding
//! - `integration-tests` - Router-level contract tests
//!
//! # Architecture
//!
//! The core crate contains only types and rules - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed UUID ids, prices, emails, and status enums with their
//!   legal transitions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
