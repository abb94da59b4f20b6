// Allow uppercase acronyms for industry-standard terms like HDD and SSD
#![allow(clippy::upper_case_acronyms)]

pub mod driver;
pub mod media;
pub mod methods;
pub mod mounts;
pub mod orchestrator;
pub mod probe;
pub mod records;
pub mod runner;
pub mod steps;
pub mod verification;

// Re-export the main entry points for convenience
pub use driver::auto_sanitize_disks;
pub use orchestrator::SanitizeOrchestrator;

use std::path::PathBuf;

use thiserror::Error;

/// Structural errors that abort one device (or, for cancellation, the
/// whole run). Individual command failures are never raised as errors;
/// they are captured inside the certificate and only influence its
/// result.
#[derive(Error, Debug)]
pub enum SanitizeError {
    #[error("disk {0} not found")]
    DeviceNotFound(String),

    #[error("device {0} holds a mounted volume")]
    MountedVolume(String),

    #[error("{device}: information mismatch: drive reports {smart}-byte blocks, kernel reports {kernel}")]
    InformationMismatch {
        device: String,
        smart: u64,
        kernel: u64,
    },

    #[error("cannot classify media of {0}")]
    UnknownMedia(String),

    #[error("unknown erasure tool `{0}`")]
    UnknownTool(String),

    #[error("unknown sanitize method `{0}`")]
    UnknownMethod(String),

    #[error("operator cancelled the sanitization")]
    OperatorCancelled,

    #[error("{device}: probe failed: {reason}")]
    ProbeFailed { device: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SanitizeResult<T> = Result<T, SanitizeError>;

/// Engine tunables shared by every orchestrator in a run.
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// How many sectors the verification protocol samples per device.
    pub sectors_to_validate: usize,
    /// Where the kernel exposes per-device block attributes.
    pub sysfs_root: PathBuf,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            sectors_to_validate: 10,
            sysfs_root: PathBuf::from("/sys/block"),
        }
    }
}



#[cfg(test)]
mod records_tests;
