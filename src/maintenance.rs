use crate::error::Result;
use crate::services::NotebookControl;
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceOutcome {
    Stopping,
    Starting,
    Neither,
}

/// Scheduled notebook toggle: stop the instance if it accepts a stop,
/// otherwise try to start it. Only a failed status lookup is an error.
pub async fn toggle_notebook<C: NotebookControl>(
    control: &C,
    instance: &str,
) -> Result<MaintenanceOutcome> {
    let status = control.describe(instance).await?;
    info!("Notebook instance {} is {}", instance, status.status);

    match control.stop(instance).await {
        Ok(()) => {
            info!("Stopping notebook instance {}", instance);
            return Ok(MaintenanceOutcome::Stopping);
        }
        Err(e) => warn!("Stop request for {} refused: {}", instance, e),
    }

    match control.start(instance).await {
        Ok(()) => {
            info!("Starting notebook instance {}", instance);
            Ok(MaintenanceOutcome::Starting)
        }
        Err(e) => {
            warn!("Start request for {} refused: {}", instance, e);
            info!("Notebook instance {} was neither stopped nor started", instance);
            Ok(MaintenanceOutcome::Neither)
        }
    }
}
