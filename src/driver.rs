// Top-level driver
//
// Selects the devices to sanitize, asks the operator once for bulk
// confirmation, then runs one orchestrator per device concurrently.
// Parallelism exists only across devices; inside a device everything is
// sequential. A structural failure on one device never stops the others.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use futures::future::join_all;
use glob::glob;
use log::{error, info, warn};
use serde_json::Value;

use crate::mounts::MountedVolumes;
use crate::orchestrator::SanitizeOrchestrator;
use crate::records::{Block, Method, SanitizeRecord};
use crate::{probe, runner, SanitizeConfig, SanitizeError, SanitizeResult};

/// Discover sanitizable devices: whole SATA/SAS disks and NVMe
/// namespaces.
pub fn discover_devices() -> Vec<String> {
    let mut devices = Vec::new();
    for pattern in ["/dev/sd?", "/dev/nvme?n?"] {
        if let Ok(paths) = glob(pattern) {
            devices.extend(paths.flatten().map(|p| p.display().to_string()));
        }
    }
    devices.sort();
    devices
}

/// Sanitize every selected device with the given method and return the
/// certificates. `devices` of `None` means discover. Unless
/// `skip_confirmation` is set, the operator is shown every target and
/// must approve the run before any device is touched.
pub async fn auto_sanitize_disks(
    method: Method,
    devices: Option<Vec<String>>,
    config: SanitizeConfig,
    skip_confirmation: bool,
) -> SanitizeResult<Vec<SanitizeRecord>> {
    sanitize_disks_with_input(
        method,
        devices,
        config,
        skip_confirmation,
        &mut io::stdin().lock(),
    )
    .await
}

/// The driver flow with the operator's confirmation answer read from
/// `input` instead of the process stdin. [`auto_sanitize_disks`] wraps
/// this; tests feed scripted answers.
pub async fn sanitize_disks_with_input(
    method: Method,
    devices: Option<Vec<String>>,
    config: SanitizeConfig,
    skip_confirmation: bool,
    input: &mut dyn BufRead,
) -> SanitizeResult<Vec<SanitizeRecord>> {
    let selected = match devices {
        Some(list) => list,
        None => discover_devices(),
    };
    if selected.is_empty() {
        warn!("no devices selected for sanitization");
        return Ok(Vec::new());
    }

    if !skip_confirmation {
        let summaries = summarize_devices(&selected).await;
        confirm_with_operator(&summaries, input)?;
    }

    let mounts = MountedVolumes::load()?;

    let orchestrators: Vec<SanitizeOrchestrator> = selected
        .iter()
        .map(|path| SanitizeOrchestrator::new(path.clone(), method.clone(), config.clone()))
        .collect();

    let runs = orchestrators.iter().map(|orch| orch.run(&mounts));
    let outcomes = join_all(runs).await;

    let mut records = Vec::new();
    for (orch, outcome) in orchestrators.iter().zip(outcomes) {
        match outcome {
            Ok(record) => records.push(record),
            Err(err) => error!("{}: {err}", orch.dev_path()),
        }
    }
    Ok(records)
}

/// One line of the confirmation table.
#[derive(Debug)]
pub struct DeviceSummary {
    pub path: String,
    pub model: String,
    pub serial: String,
    pub size: String,
    pub medium: String,
}

impl std::fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Path: {}] [Model: {}] [Serial: {}] [Size: {}] [Type: {}]",
            self.path, self.model, self.serial, self.size, self.medium
        )
    }
}

/// Build the confirmation table from a single `lsblk` inventory call.
/// This is a read-only listing; the per-device probe happens later,
/// inside each orchestrator.
async fn summarize_devices(paths: &[String]) -> Vec<DeviceSummary> {
    let listing = runner::run_with_timeout(
        &format!("lsblk -JOad {}", paths.join(" ")),
        probe::PROBE_TIMEOUT,
    )
    .await;

    let mut by_path: HashMap<String, Block> = HashMap::new();
    if let Some(stdout) = listing.stdout.as_deref() {
        if let Ok(report) = serde_json::from_str::<Value>(stdout) {
            if let Some(devices) = report.get("blockdevices").and_then(Value::as_array) {
                for device in devices {
                    if let Ok(block) = serde_json::from_value::<Block>(device.clone()) {
                        if let Some(path) = block.path.clone() {
                            by_path.insert(path, block);
                        }
                    }
                }
            }
        }
    }

    paths
        .iter()
        .map(|path| match by_path.remove(path) {
            Some(block) => DeviceSummary {
                path: path.clone(),
                model: block.model.unwrap_or_else(|| "?".to_string()),
                serial: block.serial.unwrap_or_else(|| "?".to_string()),
                size: block
                    .size
                    .map(render_size)
                    .unwrap_or_else(|| "?".to_string()),
                medium: match block.rota {
                    Some(true) => "HDD".to_string(),
                    Some(false) => "SSD".to_string(),
                    None => "?".to_string(),
                },
            },
            None => DeviceSummary {
                path: path.clone(),
                model: "?".to_string(),
                serial: "?".to_string(),
                size: "?".to_string(),
                medium: "?".to_string(),
            },
        })
        .collect()
}

fn render_size(size: Value) -> String {
    match size {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Show every target and wait for an explicit yes on `input`. Anything
/// else, including end-of-input from an interrupt, cancels the whole
/// run.
fn confirm_with_operator(
    summaries: &[DeviceSummary],
    input: &mut dyn BufRead,
) -> SanitizeResult<()> {
    println!("The following devices will be IRREVERSIBLY ERASED:");
    for summary in summaries {
        println!("  {summary}");
    }
    print!("Proceed? [yes/NO]: ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => Err(SanitizeError::OperatorCancelled),
        Ok(_) if affirmative(&answer) => {
            info!("operator confirmed sanitization of {} device(s)", summaries.len());
            Ok(())
        }
        Ok(_) => Err(SanitizeError::OperatorCancelled),
    }
}

/// Only an explicit yes counts.
pub(crate) fn affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn one_summary() -> Vec<DeviceSummary> {
        vec![DeviceSummary {
            path: "/dev/sda".to_string(),
            model: "WDC WD3200BEKT".to_string(),
            serial: "WD-WX41A1234567".to_string(),
            size: "298.1G".to_string(),
            medium: "HDD".to_string(),
        }]
    }

    #[test]
    fn refusal_cancels_the_run() {
        let mut input = Cursor::new(&b"no\n"[..]);
        let outcome = confirm_with_operator(&one_summary(), &mut input);
        assert!(matches!(outcome, Err(SanitizeError::OperatorCancelled)));
    }

    #[test]
    fn end_of_input_cancels_the_run() {
        // An interrupt at the prompt surfaces as end-of-input.
        let mut input = Cursor::new(&b""[..]);
        let outcome = confirm_with_operator(&one_summary(), &mut input);
        assert!(matches!(outcome, Err(SanitizeError::OperatorCancelled)));
    }

    #[test]
    fn explicit_yes_proceeds() {
        let mut input = Cursor::new(&b"yes\n"[..]);
        assert!(confirm_with_operator(&one_summary(), &mut input).is_ok());
    }

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(affirmative("yes\n"));
        assert!(affirmative("Y"));
        assert!(affirmative("  YES  "));
        assert!(!affirmative(""));
        assert!(!affirmative("no"));
        assert!(!affirmative("yess"));
        assert!(!affirmative("\n"));
    }

    #[test]
    fn summary_renders_all_fields() {
        let summary = DeviceSummary {
            path: "/dev/sda".to_string(),
            model: "WDC WD3200BEKT".to_string(),
            serial: "WD-WX41A1234567".to_string(),
            size: "298.1G".to_string(),
            medium: "HDD".to_string(),
        };
        let line = summary.to_string();
        assert!(line.contains("[Path: /dev/sda]"));
        assert!(line.contains("[Model: WDC WD3200BEKT]"));
        assert!(line.contains("[Type: HDD]"));
    }
}
