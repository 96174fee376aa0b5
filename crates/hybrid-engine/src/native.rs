//! Native helper subprocess protocol (spec.md §4.A): `<helper>
//! <subcommand> <--flag value>*`, a single JSON object on stdout
//! `{success, data?, error?}`, per-call timeout.

use crate::error::HybridEngineError;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct HelperResponse {
    success: bool,
    data: Option<Value>,
    error: Option<String>,
}

/// Probe `<helper> version`; absence or a non-zero exit is never fatal
/// (it just means the caller should fall back).
pub async fn probe(helper_path: &Path, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, Command::new(helper_path).arg("version").output()).await {
        Ok(Ok(output)) => output.status.success(),
        _ => false,
    }
}

/// Invoke `<helper> <subcommand> <args...>`, parse the single JSON
/// response object, and return its `data` field on success.
pub async fn call(
    helper_path: &Path,
    subcommand: &str,
    args: &[String],
    timeout: Duration,
) -> Result<Value, HybridEngineError> {
    let mut command = Command::new(helper_path);
    command.arg(subcommand).args(args);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| HybridEngineError::Timeout(timeout))?
        .map_err(|e| HybridEngineError::NativeHelper(e.to_string()))?;

    if !output.status.success() {
        return Err(HybridEngineError::NativeHelper(format!(
            "helper exited with {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let response: HelperResponse = serde_json::from_slice(&output.stdout)
        .map_err(|e| HybridEngineError::NativeHelper(format!("malformed helper response: {e}")))?;

    if !response.success {
        return Err(HybridEngineError::NativeHelper(
            response.error.unwrap_or_else(|| "helper reported failure".to_string()),
        ));
    }

    response.data.ok_or_else(|| HybridEngineError::NativeHelper("helper reported success with no data".to_string()))
}
