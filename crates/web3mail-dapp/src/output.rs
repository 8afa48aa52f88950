//! Deterministic task output.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::Result;

/// Result file name, inside the output directory.
pub const RESULT_FILE: &str = "result.txt";

/// Manifest file name, inside the output directory.
pub const COMPUTED_FILE: &str = "computed.json";

/// Content of the result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    /// Human-readable outcome.
    pub message: &'static str,
    /// HTTP-like status.
    pub status: u16,
}

impl SendResult {
    /// The single success outcome.
    pub const SENT: Self = Self {
        message: "Your email has been sent successfully.",
        status: 200,
    };
}

/// Writes the result file and the manifest pointing at it.
///
/// Returns the path of the result file.
///
/// # Errors
///
/// Returns an I/O error if either file cannot be written.
pub async fn write_outputs(output_dir: &Path, result: &SendResult) -> Result<PathBuf> {
    let result_path = output_dir.join(RESULT_FILE);
    tokio::fs::write(&result_path, serde_json::to_string_pretty(result)?).await?;
    debug!(path = %result_path.display(), "Wrote task result");

    let manifest = json!({
        "deterministic-output-path": result_path.display().to_string(),
    });
    let manifest_path = output_dir.join(COMPUTED_FILE);
    tokio::fs::write(&manifest_path, serde_json::to_string(&manifest)?).await?;
    debug!(path = %manifest_path.display(), "Wrote task manifest");

    Ok(result_path)
}
