// Device probe
//
// Two synchronous inventory commands per device, each bounded by a short
// timeout because they run before any long operation: `smartctl -aj` for
// the drive's own view of itself and `lsblk -JOad` for the kernel's.

use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::records::{Block, ExecRecord, Smart};
use crate::{SanitizeError, SanitizeResult};

/// Inventory commands must answer within this bound.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// smartctl exits with this code when the device does not exist.
const SMARTCTL_RC_NOT_FOUND: i32 = 2;
/// lsblk exits with this code when the device does not exist.
const LSBLK_RC_NOT_FOUND: i32 = 32;

#[derive(Debug, Deserialize)]
struct LsblkReport {
    #[serde(default)]
    blockdevices: Vec<Block>,
}

/// Probe one device, returning its SMART and lsblk views.
pub async fn probe(dev_path: &str) -> SanitizeResult<(Smart, Block)> {
    let smart = probe_smart(dev_path).await?;
    let block = probe_block(dev_path).await?;
    debug!("{dev_path}: data successfully exported");
    Ok((smart, block))
}

async fn probe_smart(dev_path: &str) -> SanitizeResult<Smart> {
    let record = crate::runner::run_with_timeout(
        &format!("smartctl -aj {dev_path}"),
        PROBE_TIMEOUT,
    )
    .await;

    if record.return_code == Some(SMARTCTL_RC_NOT_FOUND) {
        return Err(SanitizeError::DeviceNotFound(dev_path.to_string()));
    }
    // smartctl uses its exit code as a bitmask of findings; anything that
    // still produced JSON on stdout is parseable device data.
    parse_probe_json(dev_path, "smartctl", &record)
}

async fn probe_block(dev_path: &str) -> SanitizeResult<Block> {
    let record = crate::runner::run_with_timeout(
        &format!("lsblk -JOad {dev_path}"),
        PROBE_TIMEOUT,
    )
    .await;

    if record.return_code == Some(LSBLK_RC_NOT_FOUND) {
        return Err(SanitizeError::DeviceNotFound(dev_path.to_string()));
    }
    let report: LsblkReport = parse_probe_json(dev_path, "lsblk", &record)?;
    report
        .blockdevices
        .into_iter()
        .next()
        .ok_or_else(|| SanitizeError::ProbeFailed {
            device: dev_path.to_string(),
            reason: "lsblk reported no block devices".to_string(),
        })
}

fn parse_probe_json<T: serde::de::DeserializeOwned>(
    dev_path: &str,
    tool: &str,
    record: &ExecRecord,
) -> SanitizeResult<T> {
    let stdout = record.stdout.as_deref().unwrap_or("");
    if stdout.is_empty() {
        return Err(SanitizeError::ProbeFailed {
            device: dev_path.to_string(),
            reason: format!(
                "{tool} produced no output: {}",
                record.stderr.as_deref().unwrap_or("unknown error")
            ),
        });
    }
    serde_json::from_str(stdout).map_err(|err| SanitizeError::ProbeFailed {
        device: dev_path.to_string(),
        reason: format!("cannot parse {tool} output: {err}"),
    })
}
