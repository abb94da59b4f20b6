// Erasure steps
//
// One helper per overwriting tool. Each returns a frozen `StepRecord`
// holding the commands it ran, in order. The helpers never throw: a tool
// failure is evidence, captured in-record, and surfaces through the step
// result.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::records::StepRecord;
use crate::runner;

lazy_static! {
    /// `hdparm -I` prints "not frozen" (spacing varies by version) when
    /// the security feature set accepts commands.
    static ref NOT_FROZEN: Regex = Regex::new(r"not[\t ]*frozen").expect("static regex");
}

pub(crate) fn shred_command(dev_path: &str, pattern: Option<&str>) -> String {
    match pattern {
        Some("zeros") => format!("shred --force --verbose --zero --iterations=0 {dev_path}"),
        // One pass of shred's internal pseudorandom stream.
        _ => format!("shred --force --verbose --iterations=1 {dev_path}"),
    }
}

pub(crate) fn badblocks_command(dev_path: &str, pattern: Option<&str>) -> String {
    // `-s` is deliberately absent: its carriage-return progress cannot be
    // consumed line-wise.
    match pattern {
        Some("zeros") => format!("badblocks -wv -p 1 -t 0 {dev_path}"),
        Some(other) if other != "random" => format!("badblocks -wv -p 1 -t {other} {dev_path}"),
        _ => format!("badblocks -wv -p 1 -t random {dev_path}"),
    }
}

/// Overwrite the whole device with `shred`.
pub async fn erase_shred(dev_path: &str, pattern: Option<&str>) -> StepRecord {
    let mut step = StepRecord::new();
    let command = shred_command(dev_path, pattern);

    let mut cmd = runner::run_streaming(&command, |line| {
        debug!("{dev_path} shred: {line}");
    })
    .await;
    cmd.description = Some(match pattern {
        Some("zeros") => "Write zeros to the disk with `shred`.".to_string(),
        _ => "Write random data to the disk with `shred`.".to_string(),
    });

    step.commands.push(cmd);
    step.finish();
    debug!("{dev_path}: shred erasure step finished");
    step
}

/// Overwrite the whole device with `badblocks`, which re-reads every
/// sector it writes.
pub async fn erase_badblocks(dev_path: &str, pattern: Option<&str>) -> StepRecord {
    let mut step = StepRecord::new();
    let command = badblocks_command(dev_path, pattern);

    let mut cmd = runner::run_streaming(&command, |line| {
        // badblocks redraws its status with backspaces.
        let clean = line.replace('\u{8}', "");
        if !clean.is_empty() {
            debug!("{dev_path} badblocks: {clean}");
        }
    })
    .await;
    cmd.description = Some("Write data into every disk sector with `badblocks`.".to_string());

    step.commands.push(cmd);
    step.finish();
    debug!("{dev_path}: badblocks erasure step finished");
    step
}

/// ATA security erase through `hdparm`: confirm the drive is not frozen,
/// set a throwaway password, issue the erase, then record the final
/// security state. A failed prerequisite skips the remaining commands.
pub async fn erase_hdparm(dev_path: &str) -> StepRecord {
    let mut step = StepRecord::new();

    let mut cmd1 = runner::run(&format!("hdparm -I {dev_path}")).await;
    cmd1.description = Some("Verify that the disk is not frozen.".to_string());
    cmd1.success = cmd1
        .stdout
        .as_deref()
        .is_some_and(|out| NOT_FROZEN.is_match(out));
    let proceed = cmd1.success;
    step.commands.push(cmd1);
    if !proceed {
        step.finish();
        return step;
    }

    let mut cmd2 = runner::run(&format!(
        "hdparm --user-master u --security-set-pass Usody {dev_path}"
    ))
    .await;
    cmd2.description = Some("Set a temporal password to unlock the security erase.".to_string());
    let proceed = cmd2.success;
    step.commands.push(cmd2);
    if !proceed {
        step.finish();
        return step;
    }

    let mut cmd3 = runner::run(&format!(
        "hdparm --user-master --security-erase Usody {dev_path}"
    ))
    .await;
    cmd3.description = Some("Erase the disk by changing the encryption key.".to_string());
    // hdparm is known to exit 22 on some drives that completed the erase.
    cmd3.success = matches!(cmd3.return_code, Some(0) | Some(22));
    let proceed = cmd3.success;
    step.commands.push(cmd3);
    if !proceed {
        step.finish();
        return step;
    }

    // Observational: recorded for the certificate whatever it says.
    let mut cmd4 = runner::run(&format!("hdparm -I {dev_path}")).await;
    cmd4.description = Some("Check the drive security state after the erase.".to_string());
    step.commands.push(cmd4);

    step.finish();
    debug!("{dev_path}: hdparm erasure step finished");
    step
}

/// Cryptographic erase over the NVMe admin interface.
pub async fn erase_nvme(dev_path: &str) -> StepRecord {
    let mut step = StepRecord::new();

    let mut cmd = runner::run(&format!("nvme format --ses=1 {dev_path}")).await;
    cmd.description =
        Some("Format the NVMe namespace with secure erase of user data.".to_string());

    step.commands.push(cmd);
    step.finish();
    debug!("{dev_path}: nvme erasure step finished");
    step
}
