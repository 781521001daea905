//! Application service: stop, restart, remove and status of one service.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;

use anyhow::Result;
use futures_util::future::join_all;
use tether_common::{ServiceEndpoints, ServiceState, ServiceStatusOutput};

use crate::application::ports::{LocalFs, ManagerStatus, ServiceManager};
use crate::domain::artifact::{self, artifact_path, is_managed, name_from_file_name};
use crate::domain::error::ServiceError;
use crate::domain::logs::log_files;
use crate::domain::name::{ServiceName, qualify};

/// Why tether refuses a definition file it did not write.
pub(crate) const FOREIGN_DEFINITION: &str = "its definition file has no tether marker";
/// Why tether refuses a service the manager knows from elsewhere.
pub(crate) const FOREIGN_SERVICE: &str = "the service manager knows it but tether never defined it";

/// Who owns the definition at `path`: `Some(true)` for a file tether wrote,
/// `Some(false)` for anyone else's, `None` when there is no file.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read.
pub(crate) fn ownership(fs: &impl LocalFs, path: &Path) -> Result<Option<bool>> {
    if !fs.exists(path) {
        return Ok(None);
    }
    Ok(Some(is_managed(&fs.read_to_string(path)?)))
}

/// Manager status of `name`, refusing services tether does not own.
async fn owned_status(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    name: &ServiceName,
) -> Result<ManagerStatus> {
    let status = manager.status(name).await?;
    let owned = match artifact_path(name, manager.capability()) {
        Some(path) => ownership(fs, &path)?,
        None => None,
    };
    let refuse = |reason| ServiceError::NotManaged {
        service: name.to_string(),
        reason,
    };
    match owned {
        Some(true) => Ok(status),
        Some(false) => Err(refuse(FOREIGN_DEFINITION).into()),
        None if status.state == ServiceState::NotFound => {
            Err(ServiceError::NotFound(name.to_string()).into())
        }
        None => Err(refuse(FOREIGN_SERVICE).into()),
    }
}

/// Stop a service. Stopping an already stopped service succeeds.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] for an unknown service,
/// [`ServiceError::NotManaged`] for one tether did not define, or the
/// manager's error.
pub async fn stop_service(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    name: &ServiceName,
) -> Result<()> {
    let status = owned_status(manager, fs, name).await?;
    if status.is_active() {
        manager.stop(name).await?;
        tracing::info!(service = %name, "service stopped");
    } else {
        tracing::debug!(service = %name, state = %status.state, "already stopped");
    }
    Ok(())
}

/// Restart a service, starting it if it was stopped.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] for an unknown service,
/// [`ServiceError::NotManaged`] for one tether did not define, or the
/// manager's error.
pub async fn restart_service(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    name: &ServiceName,
) -> Result<()> {
    owned_status(manager, fs, name).await?;
    manager.restart(name).await?;
    tracing::info!(service = %name, "service restarted");
    Ok(())
}

/// Disable, stop and delete a service. With `purge`, also delete its logs.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] when neither the manager nor the
/// service directory knows the service, [`ServiceError::NotManaged`] when
/// tether did not define it, or the first failing step's error.
pub async fn remove_service(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    name: &ServiceName,
    purge: bool,
) -> Result<()> {
    let platform = manager.capability();
    let path = artifact_path(name, platform).ok_or_else(|| ServiceError::UnsupportedPlatform {
        platform: platform.os.clone(),
        operation: "remove",
    })?;
    let status = owned_status(manager, fs, name).await?;

    if status.enabled {
        manager.disable(name).await?;
    }
    if status.is_active() {
        manager.stop(name).await?;
    }
    fs.remove_file(&path)?;
    manager.unregister(name).await?;
    if purge {
        for log in log_files(name, platform) {
            fs.remove_file(&log)?;
        }
    }
    tracing::info!(service = %name, purge, "service removed");
    Ok(())
}

/// Services in the platform service directory carrying the tether marker,
/// sorted by name. Never touches the native manager.
#[must_use]
pub fn managed_services(manager: &impl ServiceManager, fs: &impl LocalFs) -> Vec<ServiceName> {
    let platform = manager.capability();
    let files = match fs.list_files(&platform.service_dir) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!("cannot list {}: {e:#}", platform.service_dir.display());
            return Vec::new();
        }
    };
    let mut names: Vec<ServiceName> = files
        .iter()
        .filter_map(|path| {
            let file_name = path.file_name()?.to_str()?;
            let name = name_from_file_name(file_name, platform.family)?;
            let content = fs.read_to_string(path).ok()?;
            is_managed(&content).then_some(name)
        })
        .collect();
    names.sort();
    names
}

/// Live status of one service. An unknown service reports `not_found`.
///
/// # Errors
///
/// Returns an error if the manager cannot be queried.
pub async fn status_service(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
    name: &ServiceName,
) -> Result<ServiceStatusOutput> {
    let platform = manager.capability();
    let status = manager.status(name).await?;
    let path = artifact_path(name, platform);
    let port = path
        .as_ref()
        .and_then(|p| fs.read_to_string(p).ok())
        .and_then(|content| artifact::read_port(&content));
    let on_disk = path.as_ref().is_some_and(|p| fs.exists(p));

    Ok(ServiceStatusOutput {
        name: name.to_string(),
        qualified_name: qualify(name, platform.family),
        state: status.state,
        enabled: status.enabled,
        pid: status.pid,
        port,
        artifact_path: path
            .filter(|_| on_disk)
            .map(|p| p.display().to_string()),
        endpoints: port.map(ServiceEndpoints::for_port),
    })
}

/// Status of every managed service.
///
/// # Errors
///
/// Returns the first manager query error.
pub async fn list_services(
    manager: &impl ServiceManager,
    fs: &impl LocalFs,
) -> Result<Vec<ServiceStatusOutput>> {
    let names = managed_services(manager, fs);
    join_all(names.iter().map(|name| status_service(manager, fs, name)))
        .await
        .into_iter()
        .collect()
}
