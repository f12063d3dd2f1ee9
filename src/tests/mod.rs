//! End-to-end tests across modules.
