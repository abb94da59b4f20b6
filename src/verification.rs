// Verification engine
//
// An overwriting tool that reports success but never actually wrote
// (powered-down USB bridge, write-protected device) would otherwise
// yield a "successful" certificate. The engine empirically proves the
// device is writable before erasure and observably changed after it, by
// sampling sectors across the whole address space.
//
// Pre-verify runs three passes over the sampled sectors, strictly in
// order: READ (capture current bytes), WRITE (store fresh bytes),
// READ-BACK (confirm the bytes changed). Post-verify re-reads the same
// sectors after the erasure steps and fails if any still carries the
// bytes observed before.

use log::{debug, warn};

use crate::records::{ExecRecord, ValidationRecord};
use crate::runner;

/// The captured sector bytes live in `validation.data`; the command
/// record itself only shows this marker.
const REDACTED: &str = "Private";

/// Write-read-compare protocol for one device.
pub struct Verifier {
    dev_path: String,
    block_size: u64,
    sectors: Vec<u64>,
}

impl Verifier {
    /// Plan a verification over `samples` sectors evenly spaced across
    /// the device.
    pub fn new(dev_path: &str, block_size: u64, capacity_bytes: u64, samples: usize) -> Self {
        let max_sector = capacity_bytes / block_size.max(1);
        Self {
            dev_path: dev_path.to_string(),
            block_size,
            sectors: spaced_sectors(max_sector, samples),
        }
    }

    pub fn sectors(&self) -> &[u64] {
        &self.sectors
    }

    /// Prove the device is writable: capture each sampled sector, write
    /// fresh bytes over it, and confirm a re-read observes the change.
    /// Populates `validation.data` with the bytes now on disk and sets
    /// `validation.result`.
    pub async fn pre_verify(&self, validation: &mut ValidationRecord, zeros: bool) {
        debug!(
            "{}: validating sectors {:?} ({} bytes each)",
            self.dev_path, self.sectors, self.block_size
        );

        for &sector in &self.sectors {
            let mut cmd = self.read_sector(sector).await;
            cmd.description = Some(format!(
                "Read data from sector {sector} to validate if have been changed."
            ));
            let Some(stdout) = Self::accept(validation, cmd) else {
                validation.result = Some(false);
                return;
            };
            validation.data.insert(sector, stdout);
            // The captured bytes stay in `data` only.
            if let Some(last) = validation.commands.last_mut() {
                last.stdout = Some(REDACTED.to_string());
            }
        }

        for &sector in &self.sectors {
            let mut cmd = self.write_sector(sector, zeros).await;
            cmd.description = Some("Write the data to validate into the sectors".to_string());
            if Self::accept(validation, cmd).is_none() {
                validation.result = Some(false);
                return;
            }
        }

        for &sector in &self.sectors {
            let mut cmd = self.read_sector(sector).await;
            cmd.description = Some("Check if new bytes has been written".to_string());
            let Some(stdout) = Self::accept(validation, cmd) else {
                validation.result = Some(false);
                return;
            };
            if validation.data.get(&sector) == Some(&stdout) {
                warn!(
                    "{}: validation failed: sector {sector} has not been changed",
                    self.dev_path
                );
                validation.result = Some(false);
                return;
            }
            // The write took; remember the bytes now on disk.
            validation.data.insert(sector, stdout);
        }

        debug!("{}: pre-erasure validation finished", self.dev_path);
        validation.result = Some(true);
    }

    /// Confirm the erasure destroyed the sampled bytes: any sector still
    /// reading the value stored during pre-verify fails the validation.
    pub async fn post_verify(&self, validation: &mut ValidationRecord) {
        let sectors: Vec<u64> = validation.data.keys().copied().collect();
        for sector in sectors {
            let cmd = self.read_sector(sector).await;
            if cmd.stdout == validation.data.get(&sector).cloned() {
                warn!("{}: erasure validation failed", self.dev_path);
                validation.result = Some(false);
                return;
            }
        }
        debug!("{}: erasure validation passed", self.dev_path);
        validation.result = Some(true);
    }

    /// Append `cmd` to the validation trail; a non-zero exit discards
    /// the collected sector data and stops the phase.
    fn accept(validation: &mut ValidationRecord, mut cmd: ExecRecord) -> Option<String> {
        let failed = cmd.return_code != Some(0);
        if failed {
            cmd.success = false;
        }
        let stdout = cmd.stdout.clone();
        let command = cmd.command.clone();
        validation.commands.push(cmd);
        if failed {
            validation.data.clear();
            warn!("validation step `{command}` failed");
            return None;
        }
        stdout
    }

    async fn read_sector(&self, sector: u64) -> ExecRecord {
        runner::run(&format!(
            "dd if={} bs={} count=1 skip={} | xxd -ps",
            self.dev_path, self.block_size, sector
        ))
        .await
    }

    async fn write_sector(&self, sector: u64, zeros: bool) -> ExecRecord {
        let source = if zeros { "/dev/zero" } else { "/dev/random" };
        runner::run(&format!(
            "dd if={} of={} bs={} count=1 seek={}",
            source, self.dev_path, self.block_size, sector
        ))
        .await
    }
}

/// `count` evenly spaced sector indices in `[0, max_sector)`, always
/// including the first and last sector. Collapsed duplicates on small
/// devices are removed.
pub fn spaced_sectors(max_sector: u64, count: usize) -> Vec<u64> {
    if max_sector <= 1 || count < 2 {
        return vec![0];
    }
    let span = (max_sector - 1) as u128;
    let slots = (count - 1) as u128;
    let mut sectors: Vec<u64> = (0..count as u128)
        .map(|i| (i * span / slots) as u64)
        .collect();
    sectors.dedup();
    sectors
}
