//! Terminal implementation of the `Confirmer` port.

use anyhow::Result;

use crate::application::ports::Confirmer;

/// Environment variable that answers every confirmation with yes.
pub const ASSUME_YES_ENV: &str = "TETHER_YES";

/// Asks on the terminal with `dialoguer`.
pub struct TerminalConfirmer {
    /// Answer yes without asking (`TETHER_YES`).
    pub assume_yes: bool,
    /// Skip the prompt and answer with the default.
    ///
    /// Set when `CI` is present or when stderr is not a terminal.
    pub non_interactive: bool,
}

impl TerminalConfirmer {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            std::env::var_os("CI").is_some(),
            std::env::var_os(ASSUME_YES_ENV).is_some(),
            console::Term::stderr().is_term(),
        )
    }

    #[must_use]
    pub fn new(ci: bool, assume_yes: bool, is_term: bool) -> Self {
        Self {
            assume_yes,
            non_interactive: ci || !is_term,
        }
    }
}

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.assume_yes {
            tracing::debug!("{ASSUME_YES_ENV} set, confirming: {prompt}");
            return Ok(true);
        }
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
