//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod alert;
pub mod artifact;
pub mod audit;
pub mod batch;
pub mod config;
pub mod definition;
pub mod error;
pub mod logs;
pub mod name;
pub mod platform;
pub mod selector;

pub use error::{ConfigError, ServiceError};
pub use name::ServiceName;
pub use platform::{PlatformCapability, PlatformFamily, ServiceManagerKind};
