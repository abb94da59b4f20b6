// Tests for the certificate data model: timestamps, result folding and
// the serialized shape of the JSON certificate.

use serde_json::{json, Value};

use crate::records::*;

// ==================== COMMAND RECORD TESTS ====================

#[test]
fn new_exec_record_is_unfinished() {
    let cmd = ExecRecord::new("echo hello");
    assert_eq!(cmd.command, "echo hello");
    assert!(cmd.start_time > 0.0, "start time must be stamped");
    assert!(cmd.end_time.is_none());
    assert!(cmd.return_code.is_none());
    assert!(!cmd.success, "a record is not successful until finalized");
}

#[test]
fn exec_record_serializes_every_field() {
    let cmd = ExecRecord::new("lsblk -JOad /dev/sda");
    let value = serde_json::to_value(&cmd).expect("serialize");
    for key in [
        "description",
        "command",
        "stdout",
        "stderr",
        "return_code",
        "success",
        "start_time",
        "end_time",
    ] {
        assert!(value.get(key).is_some(), "missing field `{key}`");
    }
}

// ==================== STEP RECORD TESTS ====================

#[test]
fn finish_stamps_times_and_duration() {
    let mut step = StepRecord::new();
    step.finish();
    let end = step.end_time.expect("end time set");
    assert!(end >= step.start_time);
    assert!(step.duration.expect("duration set") >= 0.0);
}

#[test]
fn step_success_is_the_conjunction_of_its_commands() {
    let mut ok = ExecRecord::new("true");
    ok.success = true;
    let failed = ExecRecord::new("false");

    let mut step = StepRecord::new();
    step.commands.push(ok.clone());
    step.commands.push(ok.clone());
    step.finish();
    assert!(step.success);

    let mut step = StepRecord::new();
    step.commands.push(ok);
    step.commands.push(failed);
    step.finish();
    assert!(!step.success, "one failed command fails the step");
}

// ==================== SANITIZE RECORD TESTS ====================

fn record_with(verification: bool) -> SanitizeRecord {
    let mut method = crate::methods::BASIC.clone();
    method.verification_enabled = verification;
    SanitizeRecord::new(DeviceInfo::default(), method)
}

#[test]
fn verified_result_follows_the_validation() {
    let mut record = record_with(true);
    record.validation.result = Some(true);
    record.compute_result();
    assert!(record.result);

    record.validation.result = Some(false);
    record.compute_result();
    assert!(!record.result);

    record.validation.result = None;
    record.compute_result();
    assert!(!record.result, "an unknown validation is not a pass");
}

#[test]
fn unverified_result_follows_the_last_step() {
    let mut record = record_with(false);
    record.compute_result();
    assert!(!record.result, "no steps and no validation is no erasure");

    let mut step = StepRecord::new();
    let mut cmd = ExecRecord::new("shred /dev/sda");
    cmd.success = true;
    step.commands.push(cmd);
    step.finish();
    record.steps.push(step);
    record.compute_result();
    assert!(record.result);

    let mut failed_step = StepRecord::new();
    failed_step.commands.push(ExecRecord::new("shred /dev/sda"));
    failed_step.finish();
    record.steps.push(failed_step);
    record.compute_result();
    assert!(!record.result, "the last step decides");
}

#[test]
fn certificate_carries_the_crate_version() {
    let record = record_with(true);
    assert_eq!(record.version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn validation_data_keys_serialize_as_sector_numbers() {
    let mut validation = ValidationRecord::default();
    validation.data.insert(0, "00ff".to_string());
    validation.data.insert(625142447, "55aa".to_string());
    let value = serde_json::to_value(&validation).expect("serialize");
    assert_eq!(value["data"]["0"], json!("00ff"));
    assert_eq!(value["data"]["625142447"], json!("55aa"));
}

#[test]
fn storage_medium_uses_certificate_spelling() {
    assert_eq!(
        serde_json::to_value(StorageMedium::HDD).expect("serialize"),
        Value::String("HDD".to_string())
    );
    assert_eq!(
        serde_json::to_value(StorageMedium::SSD).expect("serialize"),
        Value::String("SSD".to_string())
    );
}

#[test]
fn probe_payloads_preserve_unknown_fields() {
    let raw = json!({
        "model_name": "Samsung SSD 960 PRO 512GB",
        "serial_number": "S3EWNX0K216135N",
        "logical_block_size": 512,
        "rotation_rate": 0,
        "user_capacity": {"blocks": 1000215216_u64, "bytes": 512110190592_u64},
        "nvme_version": {"string": "1.2", "value": 66048}
    });
    let smart: Smart = serde_json::from_value(raw).expect("parse");
    assert_eq!(smart.rotation_rate, Some(0));
    assert!(
        smart.extra.contains_key("nvme_version"),
        "fields the engine does not consult must survive for archival"
    );
    let back = serde_json::to_value(&smart).expect("serialize");
    assert_eq!(back["nvme_version"]["value"], json!(66048));
}
