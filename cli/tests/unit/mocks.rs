//! `mockall` doubles for the interaction ports.

use anyhow::Result;
use mockall::mock;
use tether_cli::application::ports::{Confirmer, ProgressReporter};

mock! {
    pub Confirmer {}

    impl Confirmer for Confirmer {
        fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
    }
}

mock! {
    pub Reporter {}

    impl ProgressReporter for Reporter {
        fn step(&self, message: &str);
        fn success(&self, message: &str);
        fn warn(&self, message: &str);
    }
}

/// A reporter that accepts any call.
pub fn quiet_reporter() -> MockReporter {
    let mut reporter = MockReporter::new();
    reporter.expect_step().return_const(());
    reporter.expect_success().return_const(());
    reporter.expect_warn().return_const(());
    reporter
}
