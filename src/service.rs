//! Validate-then-reload of the consuming service.
//!
//! The two steps are opaque external commands. Reload only ever runs after a
//! successful validation; a failed reload leaves already-written files in
//! place.

use crate::error::PatchError;
use std::process::{Command, Stdio};

/// The service that consumes the patched artifacts.
pub trait ServiceControl {
    /// Check the service's configuration (e.g. `nginx -t`).
    fn validate(&self) -> Result<(), PatchError>;

    /// Ask the service to pick up the new configuration.
    fn reload(&self) -> Result<(), PatchError>;
}

/// Runs configured argv vectors as child processes, without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandService {
    pub validate: Vec<String>,
    pub reload: Vec<String>,
}

impl Default for CommandService {
    fn default() -> Self {
        Self {
            validate: vec!["nginx".into(), "-t".into()],
            reload: vec!["systemctl".into(), "reload".into(), "nginx".into()],
        }
    }
}

/// Why a command did not succeed.
fn run_command(argv: &[String]) -> Result<(), String> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| "empty command".to_string())?;

    tracing::info!(command = %argv.join(" "), "running service command");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("failed to spawn {program}: {e}"))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    Err(if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        format!("exited with {}: {}", output.status, stderr)
    })
}

impl ServiceControl for CommandService {
    fn validate(&self) -> Result<(), PatchError> {
        run_command(&self.validate).map_err(|detail| PatchError::ValidationFailed {
            command: self.validate.join(" "),
            detail,
        })
    }

    fn reload(&self) -> Result<(), PatchError> {
        run_command(&self.reload).map_err(|detail| PatchError::ReloadFailed {
            command: self.reload.join(" "),
            detail,
        })
    }
}

/// Validate, and reload only if validation passed.
pub fn validate_and_reload(service: &dyn ServiceControl) -> Result<(), PatchError> {
    service.validate()?;
    tracing::info!("service configuration check passed");
    service.reload()?;
    tracing::info!("service reloaded");
    Ok(())
}
