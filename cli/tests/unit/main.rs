//! Unit tests for the tether CLI
//!
//! These tests drive the application services against a scripted native
//! manager and a temporary home directory. No real service manager is used.

mod batch_orchestrator;
mod helpers;
mod lifecycle;
mod mocks;
mod property_tests;
