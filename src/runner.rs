// Subprocess runner
//
// Every external tool goes through here. Commands are handed to a shell
// because the engine composes pipelines (`dd ... | xxd -ps`), and each
// invocation is captured whole into an `ExecRecord`: stdout, stderr,
// return code and wall-clock bracket. Failures to spawn or decode are
// reported in-record, never thrown; the runner does not retry.

use std::process::Stdio;
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::records::{epoch_now, ExecRecord};

/// Run a command line through the shell and capture its full output.
pub async fn run(command: &str) -> ExecRecord {
    execute(command, false, None).await
}

/// Run a command line, feeding each stderr line to `on_line` while the
/// process is alive. Long-running tools (`shred`, `badblocks`) report
/// progress on stderr; streaming lets the caller observe it without
/// waiting for exit. The consumed lines are still collected into the
/// record's stderr.
pub async fn run_streaming<F>(command: &str, mut on_line: F) -> ExecRecord
where
    F: FnMut(&str),
{
    execute(command, false, Some(&mut on_line)).await
}

/// Run a command line with an upper bound on its wall-clock time. On
/// expiry the child is killed and a failed record is returned with the
/// reason in stderr. Used for the probe commands, which must answer
/// quickly or not at all.
pub async fn run_with_timeout(command: &str, limit: Duration) -> ExecRecord {
    let mut record = ExecRecord::new(command);
    match tokio::time::timeout(limit, collect(command, true, &mut record, None)).await {
        Ok(()) => {}
        Err(_) => {
            record.stderr = Some(format!(
                "command timed out after {} seconds",
                limit.as_secs()
            ));
            record.success = false;
            record.end_time = Some(epoch_now());
        }
    }
    record
}

async fn execute(
    command: &str,
    kill_on_drop: bool,
    on_stderr_line: Option<&mut dyn FnMut(&str)>,
) -> ExecRecord {
    let mut record = ExecRecord::new(command);
    collect(command, kill_on_drop, &mut record, on_stderr_line).await;
    record
}

/// Spawn the shell, drain both pipes concurrently and finalize `record`.
/// Reading the pipes together avoids a stall when one of them fills the
/// kernel buffer while the other is still open.
async fn collect(
    command: &str,
    kill_on_drop: bool,
    record: &mut ExecRecord,
    on_stderr_line: Option<&mut dyn FnMut(&str)>,
) {
    debug!("running command: `{command}`");

    let spawned = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(kill_on_drop)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            record.stderr = Some(format!("failed to spawn command: {err}"));
            record.success = false;
            record.end_time = Some(epoch_now());
            return;
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_fut = async {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stdout {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    };

    let stderr_fut = async {
        match (stderr, on_stderr_line) {
            (Some(pipe), Some(on_line)) => {
                // Line-by-line so the caller sees progress as it happens.
                let mut lines = BufReader::new(pipe).lines();
                let mut collected = Vec::new();
                while let Ok(Some(line)) = lines.next_line().await {
                    on_line(&line);
                    collected.push(line);
                }
                collected.join("\n").into_bytes()
            }
            (Some(mut pipe), None) => {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf).await;
                buf
            }
            (None, _) => Vec::new(),
        }
    };

    let (out_bytes, err_bytes) = tokio::join!(stdout_fut, stderr_fut);

    let status = child.wait().await;
    record.end_time = Some(epoch_now());

    let mut decode_failed = false;
    record.stdout = Some(decode_output(out_bytes, &mut decode_failed));
    if record.stderr.is_none() {
        record.stderr = Some(decode_output(err_bytes, &mut decode_failed));
    }
    if decode_failed {
        let note = "command produced non-UTF-8 output";
        record.stderr = match record.stderr.take() {
            Some(text) if !text.is_empty() => Some(format!("{text}\n{note}")),
            _ => Some(note.to_string()),
        };
    }

    match status {
        Ok(status) => {
            record.return_code = status.code();
            record.success = status.success() && !decode_failed;
            if record.return_code.is_none() && record.stderr.as_deref() == Some("") {
                record.stderr = Some("process terminated by signal".to_string());
            }
        }
        Err(err) => {
            record.stderr = Some(format!("failed to collect command status: {err}"));
            record.success = false;
        }
    }
}

/// Decode captured bytes as UTF-8 with trailing whitespace trimmed. A
/// non-UTF-8 stream marks the whole command failed; the bytes are kept
/// lossily so the record still carries evidence.
fn decode_output(bytes: Vec<u8>, decode_failed: &mut bool) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text.trim_end().to_string(),
        Err(err) => {
            *decode_failed = true;
            String::from_utf8_lossy(err.as_bytes())
                .trim_end()
                .to_string()
        }
    }
}
