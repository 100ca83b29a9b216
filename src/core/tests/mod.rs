//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Type tests (Action, Key ordering, device detection)
//! - Section parser tests for both dialects
//! - Merge engine and conflict resolution tests
//! - Serializer tests
//! - User settings document tests
//! - Mod descriptor collection tests
//! - Menu var and file list tests
//! - Property tests (round trip, ordering, idempotence)

#[cfg(test)]
mod conflict_tests;
