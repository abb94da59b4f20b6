// Method catalog
//
// The named erasure procedures the engine knows how to run. The metadata
// travels onto the certificate verbatim, so the texts here are the texts
// an auditor will read. Callers may also construct a `Method` by hand;
// the catalog is the curated set.

use lazy_static::lazy_static;

use crate::records::{Execution, Method};
use crate::{SanitizeError, SanitizeResult};

lazy_static! {
    /// Single `shred` pass of pseudorandom data over the whole drive,
    /// bracketed by write-read-compare verification.
    pub static ref BASIC: Method = Method {
        name: "Basic Erasure".to_string(),
        standard: "NIST SP-800-88".to_string(),
        description: Some(
            "A single-pass overwrite of the entire drive. This method is \
             relatively fast and simple, but it may not be completely \
             effective in destroying all traces of the original data."
                .to_string(),
        ),
        removal_process: Some("Overwriting".to_string()),
        verification_enabled: true,
        bad_sectors_enabled: false,
        warnings: None,
        overwriting_steps: vec![Execution::with_pattern("shred", "random")],
    };

    /// Single random pass with `badblocks`, which re-reads every sector
    /// it writes and therefore doubles as a bad-sector survey.
    pub static ref BASELINE: Method = Method {
        name: "Baseline Erasure".to_string(),
        standard: "HMG Infosec Standard 5, Baseline".to_string(),
        description: Some(
            "Securely erases data in compliance with HMG Infosec Standard \
             5 guidelines with a single step of a random write process on \
             the full disk. This process overwrites all data with a \
             randomized pattern, ensuring that it cannot be recovered."
                .to_string(),
        ),
        removal_process: Some("Overwriting".to_string()),
        verification_enabled: false,
        bad_sectors_enabled: true,
        warnings: None,
        overwriting_steps: vec![Execution::with_pattern("badblocks", "random")],
    };

    /// Two random passes plus a final zero pass, fully verified.
    pub static ref ENHANCED: Method = Method {
        name: "Enhanced Erasure".to_string(),
        standard: "HMG Infosec Standard 5, Enhanced".to_string(),
        description: Some(
            "Securely erases data in compliance with HMG Infosec Standard \
             5 guidelines with multiple write passes on the full disk, \
             finishing with zeros. Built-in validation confirms that the \
             data has been overwritten, and a final validation confirms \
             that all data has been deleted."
                .to_string(),
        ),
        removal_process: Some("Overwriting".to_string()),
        verification_enabled: true,
        bad_sectors_enabled: true,
        warnings: None,
        overwriting_steps: vec![
            Execution::with_pattern("badblocks", "random"),
            Execution::with_pattern("badblocks", "random"),
            Execution::with_pattern("shred", "zeros"),
        ],
    };

    /// ATA security erase: the controller destroys its internal
    /// encryption key. The only method safe for SATA flash media.
    pub static ref CRYPTOGRAPHIC_ATA: Method = Method {
        name: "Baseline Cryptographic".to_string(),
        standard: "NIST SP-800-88".to_string(),
        description: Some(
            "Instructs the drive controller to destroy the internal key \
             that encrypts user data, rendering the content unreadable. \
             Fast, and the appropriate procedure for flash media, which \
             overwriting erasures would damage."
                .to_string(),
        ),
        removal_process: Some("Cryptographic erase".to_string()),
        verification_enabled: false,
        bad_sectors_enabled: false,
        warnings: None,
        overwriting_steps: vec![Execution::new("hdparm")],
    };

    /// Cryptographic erase over the NVMe admin interface.
    pub static ref CRYPTOGRAPHIC_NVME: Method = Method {
        name: "Baseline Cryptographic".to_string(),
        standard: "NIST SP-800-88".to_string(),
        description: Some(
            "Instructs the drive controller to destroy the internal key \
             that encrypts user data, rendering the content unreadable. \
             Fast, and the appropriate procedure for flash media, which \
             overwriting erasures would damage."
                .to_string(),
        ),
        removal_process: Some("Cryptographic erase".to_string()),
        verification_enabled: false,
        bad_sectors_enabled: false,
        warnings: None,
        overwriting_steps: vec![Execution::new("nvme")],
    };
}

/// Resolve a caller-supplied method name against the catalog. An
/// unknown name fails here, before any device is probed or touched.
pub fn resolve(name: &str) -> SanitizeResult<Method> {
    find(name).ok_or_else(|| SanitizeError::UnknownMethod(name.to_string()))
}

/// Look a catalog method up by name, case-insensitively.
pub fn find(name: &str) -> Option<Method> {
    match name.to_ascii_lowercase().as_str() {
        "basic" => Some(BASIC.clone()),
        "baseline" => Some(BASELINE.clone()),
        "enhanced" => Some(ENHANCED.clone()),
        "cryptographic_ata" => Some(CRYPTOGRAPHIC_ATA.clone()),
        "cryptographic_nvme" => Some(CRYPTOGRAPHIC_NVME.clone()),
        _ => None,
    }
}
