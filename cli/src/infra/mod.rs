//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, native service managers, HTTP and persisted state.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod alert_state;
pub mod command_runner;
pub mod config;
pub mod driver;
pub mod fs;
pub mod http;
pub mod launchd;
pub mod platform;
pub mod prompt;
pub mod scm;
pub mod systemd;

#[cfg(test)]
pub(crate) mod test_support;
