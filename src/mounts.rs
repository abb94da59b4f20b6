// Mounted-volume cache
//
// A device carrying a mounted filesystem must never be sanitized. The
// cache is populated once per run from the kernel mount table and shared
// read-only with every orchestrator. Membership is prefix-based: the
// mount source `/dev/sda1` blocks the device `/dev/sda`.

use std::fs;
use std::io;

/// Mount sources observed at load time.
#[derive(Debug, Clone, Default)]
pub struct MountedVolumes {
    sources: Vec<String>,
}

impl MountedVolumes {
    /// Snapshot the current mount table.
    pub fn load() -> io::Result<Self> {
        let table = fs::read_to_string("/proc/mounts")?;
        Ok(Self {
            sources: parse_mount_sources(&table),
        })
    }

    /// Build a cache from known sources. Used by callers that already
    /// hold a mount list, and by tests.
    pub fn from_sources(sources: Vec<String>) -> Self {
        Self { sources }
    }

    /// Whether any mounted filesystem lives on the given device.
    pub fn contains(&self, dev_path: &str) -> bool {
        self.sources.iter().any(|src| src.starts_with(dev_path))
    }
}

/// Extract real device sources from a `/proc/mounts`-format table.
/// Pseudo-filesystems (proc, sysfs, tmpfs, cgroup, ...) have non-path
/// sources and are dropped.
fn parse_mount_sources(table: &str) -> Vec<String> {
    table
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|src| src.starts_with('/'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUNT_TABLE: &str = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec 0 0
proc /proc proc rw,nosuid,nodev,noexec 0 0
/dev/nvme0n1p2 / ext4 rw,relatime 0 0
/dev/sda1 /data ext4 rw,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev 0 0
/dev/loop0 /snap/core/123 squashfs ro,nodev 0 0
";

    #[test]
    fn parse_keeps_only_device_sources() {
        let sources = parse_mount_sources(MOUNT_TABLE);
        assert_eq!(
            sources,
            vec!["/dev/nvme0n1p2", "/dev/sda1", "/dev/loop0"]
        );
    }

    #[test]
    fn partition_mount_blocks_whole_device() {
        let mounts = MountedVolumes::from_sources(vec!["/dev/sda1".to_string()]);
        assert!(mounts.contains("/dev/sda"));
        assert!(mounts.contains("/dev/sda1"));
        assert!(!mounts.contains("/dev/sdb"));
    }

    #[test]
    fn empty_cache_blocks_nothing() {
        let mounts = MountedVolumes::from_sources(Vec::new());
        assert!(!mounts.contains("/dev/sda"));
    }
}
