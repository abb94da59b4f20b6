// Media classification
//
// Dispatching an overwriting tool to flash media damages the device, so
// the class decides which erasure primitives are legal. Three signals are
// consulted: the kernel rotational flag, SMART's rotation_rate and
// lsblk's rota. SMART wins when it speaks; disagreements are logged and
// never silently papered over.

use log::warn;

use crate::records::{Block, Smart, StorageMedium};
use crate::{SanitizeError, SanitizeResult};

/// How a device may be erased. NVMe is an SSD behind a PCIe interface
/// and needs its own cryptographic-erase command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Hdd,
    Ssd,
    Nvme,
}

impl MediaClass {
    /// The medium recorded on the certificate.
    pub fn storage_medium(self) -> StorageMedium {
        match self {
            MediaClass::Hdd => StorageMedium::HDD,
            MediaClass::Ssd | MediaClass::Nvme => StorageMedium::SSD,
        }
    }

    pub fn is_flash(self) -> bool {
        !matches!(self, MediaClass::Hdd)
    }
}

/// Classify a device from its probe output and the kernel rotational
/// flag. Pure in its inputs: the same probe data always yields the same
/// class.
pub fn classify(
    dev_name: &str,
    kernel_rotational: Option<bool>,
    smart: &Smart,
    block: &Block,
) -> SanitizeResult<MediaClass> {
    warn_on_disagreement(dev_name, kernel_rotational, smart, block);

    let class = match smart.rotation_rate {
        Some(0) => MediaClass::Ssd,
        Some(_) => MediaClass::Hdd,
        // SMART is silent; fall back to the kernel, then to lsblk.
        None => match kernel_rotational.or(block.rota) {
            Some(true) => MediaClass::Hdd,
            Some(false) => MediaClass::Ssd,
            None => return Err(SanitizeError::UnknownMedia(dev_name.to_string())),
        },
    };

    if class == MediaClass::Ssd && dev_name.starts_with("nvme") {
        return Ok(MediaClass::Nvme);
    }
    Ok(class)
}

fn warn_on_disagreement(
    dev_name: &str,
    kernel_rotational: Option<bool>,
    smart: &Smart,
    block: &Block,
) {
    let signals = [
        kernel_rotational,
        smart.rotation_rate.map(|rate| rate > 0),
        block.rota,
    ];
    let mut known = signals.iter().flatten();
    if let Some(first) = known.next() {
        if known.any(|s| s != first) {
            warn!(
                "{dev_name}: rotational signals disagree: kernel={:?} smartctl={:?} lsblk={:?}",
                kernel_rotational, smart.rotation_rate, block.rota
            );
        }
    }
}
