//! Application service: batch lifecycle operations across many services.
//!
//! Members run concurrently on the caller's task. A member's failure is
//! captured in its [`BatchResult`] and never reaches its siblings.

use anyhow::Result;
use futures_util::future::join_all;

use crate::application::ports::{Confirmer, LocalFs, ServiceManager};
use crate::application::services::service_control::{
    managed_services, remove_service, restart_service, stop_service,
};
use crate::domain::batch::{
    BatchOperation, BatchResult, BatchRun, confirmation_prompt, needs_confirmation,
};
use crate::domain::name::ServiceName;
use crate::domain::selector::Selector;

/// Expand `selector`, confirm if needed, then apply `operation` to every member.
///
/// Nothing reaches the native manager before the confirmation gate: `all`
/// is expanded from the service directory alone.
///
/// # Errors
///
/// Returns an error only when the selector is invalid or the confirmation
/// prompt itself fails. Member failures are reported in the results.
pub async fn run_batch(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    confirmer: &impl Confirmer,
    selector: &Selector,
    operation: BatchOperation,
    force: bool,
) -> Result<BatchRun> {
    let names = selector.expand(|| managed_services(manager, fs))?;

    if needs_confirmation(names.len(), force) {
        let prompt = confirmation_prompt(operation, &names);
        if !confirmer.confirm(&prompt, false)? {
            tracing::info!(operation = %operation, "batch cancelled");
            return Ok(BatchRun::Cancelled);
        }
    }

    let results = join_all(
        names
            .iter()
            .map(|name| run_member(manager, fs, operation, name)),
    )
    .await;
    Ok(BatchRun::Completed(results))
}

async fn run_member(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    operation: BatchOperation,
    name: &ServiceName,
) -> BatchResult {
    let outcome = match operation {
        BatchOperation::Stop => stop_service(manager, fs, name).await,
        BatchOperation::Restart => restart_service(manager, fs, name).await,
        BatchOperation::Remove { purge } => remove_service(manager, fs, name, purge).await,
    };
    match outcome {
        Ok(()) => BatchResult::success(name.as_str()),
        Err(e) => {
            tracing::warn!(service = %name, operation = %operation, "{e:#}");
            BatchResult::failure(name.as_str(), format!("{e:#}"))
        }
    }
}
