use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{ArgGroup, Parser};
use log::info;

use adios_sanitize::records::SanitizeRecord;
use adios_sanitize::{auto_sanitize_disks, methods, SanitizeConfig};

#[derive(Parser)]
#[command(name = "adios")]
#[command(about = "Disk sanitization engine with verifiable JSON erasure certificates")]
#[command(version)]
#[command(group(ArgGroup::new("selection").required(true).args(["device", "all"])))]
struct Cli {
    /// Sanitize method: basic, baseline or enhanced (case-insensitive)
    #[arg(short, long, default_value = "basic")]
    method: String,

    /// Device to erase (repeatable), e.g. /dev/sda
    #[arg(short, long)]
    device: Vec<String>,

    /// Erase every discovered disk
    #[arg(short, long)]
    all: bool,

    /// Skip the interactive confirmation prompt
    #[arg(long)]
    confirm: bool,

    /// Log level filter (error, warn, info, debug, trace)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Directory where certificates are written
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level.as_str()),
    )
    .init();

    let method = methods::resolve(&cli.method)?;
    info!("using sanitize method `{}`", method.name);

    let devices = if cli.all { None } else { Some(cli.device.clone()) };
    let records =
        auto_sanitize_disks(method, devices, SanitizeConfig::default(), cli.confirm).await?;

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("cannot create output directory {}", cli.output.display()))?;
    for record in &records {
        let path = cli.output.join(certificate_filename(record));
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)
            .with_context(|| format!("cannot write certificate {}", path.display()))?;
        info!("certificate written to {}", path.display());
    }
    Ok(())
}

/// `<date>_<serial>.json`, with the device name standing in when the
/// probe reported no serial.
fn certificate_filename(record: &SanitizeRecord) -> String {
    let identity = record
        .device_info
        .serial_number
        .clone()
        .or_else(|| {
            record
                .device_info
                .export_data
                .block
                .as_ref()
                .and_then(|b| b.name.clone())
        })
        .unwrap_or_else(|| "unknown".to_string())
        .replace(['/', ' '], "-");
    format!("{}_{}.json", Local::now().format("%Y-%m-%d"), identity)
}
