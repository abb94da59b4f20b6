// Certificate data model
//
// Everything the engine does ends up in a `SanitizeRecord`, serialized as
// JSON and archived as the proof that a device was erased. The records are
// append-only once their producing phase finishes.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current wall-clock time as epoch seconds, the timestamp format used
/// throughout the certificate.
pub(crate) fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// One executed command: the full command line, captured output and exit
/// status, bracketed by wall-clock timestamps. Finalized by the runner and
/// never mutated afterwards, except for the pre-verify stdout redaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecRecord {
    pub description: Option<String>,
    pub command: String,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub return_code: Option<i32>,
    pub success: bool,
    pub start_time: f64,
    pub end_time: Option<f64>,
}

impl ExecRecord {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            description: None,
            command: command.into(),
            stdout: None,
            stderr: None,
            return_code: None,
            success: false,
            start_time: epoch_now(),
            end_time: None,
        }
    }
}

/// A group of commands that together perform one erasure pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Option<u32>,
    pub start_time: f64,
    pub end_time: Option<f64>,
    pub duration: Option<f64>,
    pub commands: Vec<ExecRecord>,
    pub success: bool,
}

impl StepRecord {
    pub fn new() -> Self {
        Self {
            step: None,
            start_time: epoch_now(),
            end_time: None,
            duration: None,
            commands: Vec::new(),
            success: false,
        }
    }

    /// Freeze the step: stamp the end time and fold the per-command
    /// results into the step result.
    pub fn finish(&mut self) {
        let end = epoch_now();
        self.end_time = Some(end);
        self.duration = Some(end - self.start_time);
        self.success = self.commands.iter().all(|c| c.success);
    }
}

impl Default for StepRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Evidence from the write-read-compare protocol. `data` maps sector
/// index to the hex bytes last observed there; the same content is
/// redacted from the command records themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub result: Option<bool>,
    pub commands: Vec<ExecRecord>,
    pub data: BTreeMap<u64, String>,
}

/// HDD or SSD, as reported on the certificate. NVMe devices are recorded
/// as SSD; the distinction only matters for method promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMedium {
    HDD,
    SSD,
}

/// `smartctl -aj` output. Only the fields the engine consults are typed;
/// everything else is preserved verbatim for archival.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Smart {
    pub model_family: Option<String>,
    pub model_name: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub logical_block_size: Option<u64>,
    pub physical_block_size: Option<u64>,
    pub rotation_rate: Option<u64>,
    pub user_capacity: Option<UserCapacity>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserCapacity {
    pub blocks: Option<u64>,
    pub bytes: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One element of `lsblk -JOad` output. `size` may be a number or a
/// human-readable string depending on the lsblk version, so it stays a
/// raw JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub path: Option<String>,
    pub name: Option<String>,
    pub rota: Option<bool>,
    pub size: Option<Value>,
    pub model: Option<String>,
    pub vendor: Option<String>,
    pub serial: Option<String>,
    pub subsystems: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Raw probe payloads, carried whole into the certificate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub smart: Option<Smart>,
    pub block: Option<Block>,
}

/// Identity of the device under sanitization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub storage_medium: Option<StorageMedium>,
    pub connector: Option<String>,
    pub size: Option<Value>,
    pub export_data: ExportData,
}

/// A single tool invocation within a method: which program overwrites
/// and with what pattern. Kept as plain strings so ad-hoc methods can be
/// built from data; the dispatcher rejects tools it does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub tool: String,
    pub pattern: Option<String>,
}

impl Execution {
    pub fn new(tool: &str) -> Self {
        Self {
            tool: tool.to_string(),
            pattern: None,
        }
    }

    pub fn with_pattern(tool: &str, pattern: &str) -> Self {
        Self {
            tool: tool.to_string(),
            pattern: Some(pattern.to_string()),
        }
    }
}

/// A named erasure procedure: the ordered tool executions plus the
/// metadata carried verbatim onto the certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub standard: String,
    pub description: Option<String>,
    pub removal_process: Option<String>,
    pub verification_enabled: bool,
    pub bad_sectors_enabled: bool,
    pub warnings: Option<String>,
    pub overwriting_steps: Vec<Execution>,
}

/// The certificate: one per device, serialized as JSON at the end of the
/// sanitize pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizeRecord {
    pub steps: Vec<StepRecord>,
    pub validation: ValidationRecord,
    pub device_info: DeviceInfo,
    pub method: Method,
    pub result: bool,
    pub version: String,
}

impl SanitizeRecord {
    pub fn new(device_info: DeviceInfo, method: Method) -> Self {
        Self {
            steps: Vec::new(),
            validation: ValidationRecord::default(),
            device_info,
            method,
            result: false,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The overall verdict: a verified method passes on its validation
    /// result, an unverified one on its last erasure step.
    pub fn compute_result(&mut self) {
        self.result = if self.method.verification_enabled {
            self.validation.result == Some(true)
        } else if let Some(last) = self.steps.last() {
            last.success
        } else {
            false
        };
    }
}
