//! Shared test utilities for the config-sync workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not
//! each rebuild stores and extensions by hand. It is a dev-dependency only
//! and never published.
//!
//! # Modules
//!
//! - [`items`]: in-memory stores and extensions from `(name, value)` lists
//! - [`faulty`]: [`FaultyStore`](faulty::FaultyStore), a store that fails on demand
//! - [`site`]: [`TestSite`](site::TestSite) builder for an on-disk site

pub mod faulty;
pub mod items;
pub mod site;

pub use faulty::FaultyStore;
pub use items::{memory_store, module, read_existing, theme, with_dependencies};
pub use site::{STATE_DIRECTORY, TestSite, extension_dir};
