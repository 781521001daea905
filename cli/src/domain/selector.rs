//! Batch selector parsing and expansion.
//!
//! A selector is built from the positional arguments of `stop`, `restart`
//! and `remove`: plain names, a bracketed array (`[a,b]` or `["a","b"]`), or
//! the sentinel `all`.

use crate::domain::error::ServiceError;
use crate::domain::name::{ServiceName, validate};

/// Sentinel selecting every managed service.
pub const ALL: &str = "all";

/// A parsed but not yet expanded service-set selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every service carrying this tool's qualification.
    All,
    /// Raw names in the order given. Validated during expansion.
    Names(Vec<String>),
}

impl Selector {
    /// Parse positional arguments into a selector.
    ///
    /// Any token equal to `all` selects everything, so a service literally
    /// named `all` can only be addressed through that sentinel.
    #[must_use]
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        let mut names = Vec::new();
        for arg in args {
            names.extend(split_token(arg.as_ref()));
        }
        if names.iter().any(|n| n == ALL) {
            Selector::All
        } else {
            Selector::Names(names)
        }
    }

    /// Expand to a duplicate-free, order-preserving list of validated names.
    ///
    /// `known` supplies the membership of [`Selector::All`] and is only
    /// called for that variant.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidName`] for the first name that fails
    /// validation. Nothing is executed for a selector with an invalid member.
    pub fn expand<F>(&self, known: F) -> Result<Vec<ServiceName>, ServiceError>
    where
        F: FnOnce() -> Vec<ServiceName>,
    {
        let candidates = match self {
            Selector::All => known(),
            Selector::Names(raw) => raw
                .iter()
                .map(|r| validate(r))
                .collect::<Result<Vec<_>, _>>()?,
        };
        let mut out: Vec<ServiceName> = Vec::with_capacity(candidates.len());
        for name in candidates {
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Ok(out)
    }
}

/// Split one CLI token. Bracketed arrays yield their members, anything else
/// yields itself.
fn split_token(token: &str) -> Vec<String> {
    let trimmed = token.trim();
    let Some(inner) = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return vec![trimmed.to_string()];
    };
    inner
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
