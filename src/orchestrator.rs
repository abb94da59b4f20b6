// Sanitize orchestrator
//
// The per-device state machine: probe, classify, promote the method when
// the media demands it, bracket the erasure with verification, and
// assemble the certificate. One orchestrator owns one device; commands
// against that device are strictly sequential.

use log::{debug, info, warn};

use crate::media::{self, MediaClass};
use crate::methods;
use crate::mounts::MountedVolumes;
use crate::records::{Block, DeviceInfo, ExportData, Method, SanitizeRecord, Smart};
use crate::verification::Verifier;
use crate::{probe, steps, SanitizeConfig, SanitizeError, SanitizeResult};

/// Drives the full sanitize pipeline for a single device and yields its
/// certificate.
pub struct SanitizeOrchestrator {
    dev_path: String,
    method: Method,
    config: SanitizeConfig,
}

impl SanitizeOrchestrator {
    pub fn new(dev_path: impl Into<String>, method: Method, config: SanitizeConfig) -> Self {
        Self {
            dev_path: dev_path.into(),
            method,
            config,
        }
    }

    pub fn dev_path(&self) -> &str {
        &self.dev_path
    }

    /// Run the pipeline to completion. Structural failures (absent
    /// device, mounted filesystem, inconsistent geometry, unknown media
    /// or tool) abort this device without a certificate; command
    /// failures are captured in the certificate instead.
    pub async fn run(&self, mounts: &MountedVolumes) -> SanitizeResult<SanitizeRecord> {
        info!("selected device `{}` for sanitization", self.dev_path);

        if mounts.contains(&self.dev_path) {
            return Err(SanitizeError::MountedVolume(self.dev_path.clone()));
        }

        let (smart, block) = probe::probe(&self.dev_path).await?;

        let name = self.device_name().to_string();
        let kernel_rotational = self.sysfs_bool(&name, "queue/rotational");
        let class = media::classify(&name, kernel_rotational, &smart, &block)?;
        info!("{}: detected as {:?}", self.dev_path, class);

        let device_info = build_device_info(class, smart, block);
        let verify_requested = self.method.verification_enabled;
        let method = promote_method(class, &self.method);
        if class.is_flash() {
            info!(
                "{}: flash media, using method `{}`",
                self.dev_path, method.name
            );
        }

        let mut record = SanitizeRecord::new(device_info, method);

        if verify_requested {
            let verifier = self.plan_verification(&name, &record)?;
            verifier
                .pre_verify(&mut record.validation, self.writes_zeros())
                .await;
            if record.validation.result != Some(true) {
                warn!("{}: validation failed, stopping process", self.dev_path);
                record.compute_result();
                return Ok(record);
            }

            self.run_erase_steps(&mut record).await?;

            if record.method.verification_enabled {
                verifier.post_verify(&mut record.validation).await;
            }
        } else {
            self.run_erase_steps(&mut record).await?;
        }

        record.compute_result();
        debug!(
            "{}: sanitization finished, result: {}",
            self.dev_path, record.result
        );
        Ok(record)
    }

    /// Dispatch each execution of the method to its tool helper, in the
    /// declared order.
    async fn run_erase_steps(&self, record: &mut SanitizeRecord) -> SanitizeResult<()> {
        let executions = record.method.overwriting_steps.clone();
        for (index, execution) in executions.iter().enumerate() {
            debug!("{}: running step {:?}", self.dev_path, execution);
            let pattern = execution.pattern.as_deref();

            let mut step = match execution.tool.as_str() {
                "shred" => steps::erase_shred(&self.dev_path, pattern).await,
                "badblocks" => steps::erase_badblocks(&self.dev_path, pattern).await,
                "hdparm" => steps::erase_hdparm(&self.dev_path).await,
                "nvme" => steps::erase_nvme(&self.dev_path).await,
                other => return Err(SanitizeError::UnknownTool(other.to_string())),
            };
            step.step = Some(index as u32 + 1);
            record.steps.push(step);
        }
        debug!("{}: erasure steps finished", self.dev_path);
        Ok(())
    }

    /// Resolve the device geometry and lay out the sampled sectors. The
    /// drive's own block size must agree with the kernel's before the
    /// engine trusts either.
    fn plan_verification(&self, name: &str, record: &SanitizeRecord) -> SanitizeResult<Verifier> {
        let smart = record.device_info.export_data.smart.as_ref();

        let block_size = smart.and_then(|s| s.logical_block_size).unwrap_or(512);
        if let Some(kernel_size) = self.sysfs_u64(name, "queue/physical_block_size") {
            if kernel_size != block_size {
                return Err(SanitizeError::InformationMismatch {
                    device: self.dev_path.clone(),
                    smart: block_size,
                    kernel: kernel_size,
                });
            }
        }

        let capacity = smart
            .and_then(|s| s.user_capacity.as_ref())
            .and_then(|c| c.bytes)
            // sysfs publishes the size in 512-byte units.
            .or_else(|| self.sysfs_u64(name, "size").map(|sectors| sectors * 512))
            .ok_or_else(|| SanitizeError::ProbeFailed {
                device: self.dev_path.clone(),
                reason: "cannot determine device capacity".to_string(),
            })?;

        Ok(Verifier::new(
            &self.dev_path,
            block_size,
            capacity,
            self.config.sectors_to_validate,
        ))
    }

    /// The verification WRITE pass mirrors the erasure pattern of the
    /// caller's requested method: zeros for an all-zeros method, random
    /// bytes otherwise. Pre-verification belongs entirely to the
    /// requested method — the same method that gates it — while
    /// promotion governs the erase steps, the post-verify gate and the
    /// result.
    fn writes_zeros(&self) -> bool {
        !self.method.overwriting_steps.is_empty()
            && self
                .method
                .overwriting_steps
                .iter()
                .all(|e| e.pattern.as_deref() == Some("zeros"))
    }

    fn device_name(&self) -> &str {
        self.dev_path
            .rsplit('/')
            .next()
            .unwrap_or(self.dev_path.as_str())
    }

    fn sysfs_value(&self, name: &str, attribute: &str) -> Option<String> {
        let path = self.config.sysfs_root.join(name).join(attribute);
        std::fs::read_to_string(path)
            .ok()
            .map(|raw| raw.trim().to_string())
    }

    fn sysfs_bool(&self, name: &str, attribute: &str) -> Option<bool> {
        self.sysfs_value(name, attribute)
            .and_then(|raw| raw.parse::<u8>().ok())
            .map(|flag| flag != 0)
    }

    fn sysfs_u64(&self, name: &str, attribute: &str) -> Option<u64> {
        self.sysfs_value(name, attribute)
            .and_then(|raw| raw.parse().ok())
    }
}

/// Flash media must not be overwritten; replace the caller's method with
/// the cryptographic erase matching the interface. HDDs keep the
/// caller's choice.
fn promote_method(class: MediaClass, requested: &Method) -> Method {
    match class {
        MediaClass::Hdd => requested.clone(),
        MediaClass::Ssd => methods::CRYPTOGRAPHIC_ATA.clone(),
        MediaClass::Nvme => methods::CRYPTOGRAPHIC_NVME.clone(),
    }
}

/// Condense the probe payloads into the certificate's device identity,
/// preferring the kernel's values and falling back to the drive's own.
fn build_device_info(class: MediaClass, smart: Smart, block: Block) -> DeviceInfo {
    DeviceInfo {
        manufacturer: block.vendor.clone().or_else(|| smart.model_family.clone()),
        model: block.model.clone().or_else(|| smart.model_name.clone()),
        serial_number: block.serial.clone().or_else(|| smart.serial_number.clone()),
        storage_medium: Some(class.storage_medium()),
        connector: block.subsystems.clone(),
        size: block.size.clone(),
        export_data: ExportData {
            smart: Some(smart),
            block: Some(block),
        },
    }
}
