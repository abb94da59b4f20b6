// Probe fixtures and fake sysfs trees
//
// The JSON payloads mirror what smartctl and lsblk report for two real
// drives: a 512 GB Samsung NVMe SSD and a 320 GB Toshiba laptop HDD on
// a USB dock. Neither smartctl payload carries `rotation_rate`, which is
// exactly what those tools emit for these devices; classification falls
// back to the kernel rotational flag.

use std::fs;
use std::path::Path;

pub const SMARTCTL_NVME: &str = r#"{
  "model_name": "Samsung SSD 960 PRO 512GB",
  "serial_number": "S3EWNX0K216135N",
  "logical_block_size": 512,
  "user_capacity": {
    "blocks": 1000215216,
    "bytes": 512110190592
  }
}"#;

pub const LSBLK_NVME: &str = r#"{
   "blockdevices": [
      {
         "name": "nvme0n1",
         "vendor": null,
         "model": "Samsung SSD 960 PRO 512GB",
         "serial": "S3EWNX0K216135N",
         "size": "476.9G",
         "rota": false,
         "path": "/dev/nvme0n1",
         "subsystems": "block:nvme:pci"
      }
   ]
}"#;

pub const SMARTCTL_HDD: &str = r#"{
  "model_name": "TOSHIBA MK3259GSXP",
  "serial_number": "42T9CPEGT",
  "logical_block_size": 512,
  "user_capacity": {
    "blocks": 625142448,
    "bytes": 320072933376
  }
}"#;

pub const LSBLK_HDD: &str = r#"{
   "blockdevices": [
      {
         "name": "sda",
         "vendor": "TOSHIBA ",
         "model": "MK3259GSXP",
         "serial": "152D00539000",
         "size": "298.1G",
         "rota": true,
         "path": "/dev/sda",
         "subsystems": "block:scsi:usb:pci"
      }
   ]
}"#;

/// A script body that prints the given document on stdout.
pub fn emit(document: &str) -> String {
    format!("cat <<'JSON'\n{document}\nJSON")
}

/// Lay out `/sys/block/<name>` attributes for one fake device under
/// `root`: the rotational flag, the physical block size and the size in
/// 512-byte units.
pub fn fake_sysfs(root: &Path, name: &str, rotational: &str, physical_block_size: &str, size: &str) {
    let queue = root.join(name).join("queue");
    fs::create_dir_all(&queue).expect("create fake sysfs queue dir");
    fs::write(queue.join("rotational"), format!("{rotational}\n")).expect("write rotational");
    fs::write(
        queue.join("physical_block_size"),
        format!("{physical_block_size}\n"),
    )
    .expect("write physical_block_size");
    fs::write(root.join(name).join("size"), format!("{size}\n")).expect("write size");
}

/// Sector indices the engine samples on the 512 GB NVMe drive.
pub const NVME_SECTORS: [u64; 10] = [
    0,
    111_135_023,
    222_270_047,
    333_405_071,
    444_540_095,
    555_675_119,
    666_810_143,
    777_945_167,
    889_080_191,
    1_000_215_215,
];

/// Sector indices the engine samples on the 320 GB HDD.
pub const HDD_SECTORS: [u64; 10] = [
    0,
    69_460_271,
    138_920_543,
    208_380_815,
    277_841_087,
    347_301_359,
    416_761_631,
    486_221_903,
    555_682_175,
    625_142_447,
];
