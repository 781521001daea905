//! Service identifier validation and platform qualification.
//!
//! Every raw name coming from the command line passes through [`validate`]
//! exactly once; everything downstream takes a [`ServiceName`]. Checked here
//! before any path interpolation or native command construction to prevent
//! path traversal (CWE-22) and argument injection.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::ServiceError;
use crate::domain::platform::PlatformFamily;

/// Maximum identifier length.
pub const MAX_NAME_LEN: usize = 64;

/// launchd label prefix for managed services.
pub const LAUNCHD_PREFIX: &str = "dev.tether.";

/// SCM service-name prefix for managed services.
pub const SCM_PREFIX: &str = "tether-";

pub static SERVICE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9._-]{1,64}$").expect("valid regex")
});

/// A validated service identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ServiceName {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

/// Validate a raw service name.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidName`] when the name is empty, longer than
/// 64 characters, contains `/` or `..`, or uses characters outside
/// `[A-Za-z0-9._-]`.
pub fn validate(raw: &str) -> Result<ServiceName, ServiceError> {
    let invalid = |reason| ServiceError::InvalidName {
        name: raw.to_string(),
        reason,
    };
    if raw.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if raw.chars().count() > MAX_NAME_LEN {
        return Err(invalid("name must be at most 64 characters"));
    }
    if raw.contains('/') {
        return Err(invalid("name must not contain '/'"));
    }
    if raw.contains("..") {
        return Err(invalid("name must not contain '..'"));
    }
    if !SERVICE_NAME_RE.is_match(raw) {
        return Err(invalid(
            "only letters, digits, '.', '_' and '-' are allowed",
        ));
    }
    Ok(ServiceName(raw.to_string()))
}

/// Platform-qualified identifier handed to the native manager.
///
/// Linux units are not prefixed; launchd labels and SCM service names are.
#[must_use]
pub fn qualify(name: &ServiceName, family: PlatformFamily) -> String {
    match family {
        PlatformFamily::MacOs => format!("{LAUNCHD_PREFIX}{name}"),
        PlatformFamily::Windows => format!("{SCM_PREFIX}{name}"),
        PlatformFamily::Linux | PlatformFamily::Unsupported => name.as_str().to_string(),
    }
}

/// Inverse of [`qualify`]: recover the service name from a qualified one.
///
/// Returns `None` when the qualified string does not carry this platform's
/// prefix or the remainder is not a valid name.
#[must_use]
pub fn unqualify(qualified: &str, family: PlatformFamily) -> Option<ServiceName> {
    let raw = match family {
        PlatformFamily::MacOs => qualified.strip_prefix(LAUNCHD_PREFIX)?,
        PlatformFamily::Windows => qualified.strip_prefix(SCM_PREFIX)?,
        PlatformFamily::Linux | PlatformFamily::Unsupported => qualified,
    };
    validate(raw).ok()
}
