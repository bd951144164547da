//! Shared test utilities for draftsmith integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated service instances over temp directories
//! - Scripted content providers and fake converters

pub mod fakes;
pub mod harness;

pub use fakes::*;
pub use harness::TestHarness;
