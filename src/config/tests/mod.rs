//! Config module tests
//!
//! Exercise the settings directory, transactions and the installer
//! against temporary directories.
