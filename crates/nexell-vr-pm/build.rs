use std::{fmt::Write as _, path::PathBuf};

use serde::Deserialize;

fn main() {
    println!("cargo:rerun-if-env-changed=NX_VR_CONFIG");
    let config_path =
        std::env::var("NX_VR_CONFIG").unwrap_or_else(|_| "nexell-vr.toml".to_string());

    println!("cargo:rerun-if-changed={config_path}");

    let config = std::fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("failed to read {config_path}: {e}"));
    let value: Config = toml::from_str(&config).unwrap();
    let vr = value.vr;

    assert!(
        matches!(vr.board.as_str(), "s5p4418" | "s5p6818"),
        "unknown board `{}` in {config_path}",
        vr.board
    );
    let reset_release = match vr.reset_release.as_str() {
        "set" => "Set",
        "pulse" => "Pulse",
        other => panic!("unknown reset-release `{other}` in {config_path}"),
    };
    let fb_reserved = match (vr.fb_start, vr.fb_size) {
        (Some(start), Some(size)) => format!("Some(({start:#x}, {size:#x}))"),
        (None, None) => "None".to_string(),
        _ => panic!("fb-start and fb-size must be given together in {config_path}"),
    };
    assert!(
        vr.timing.poll_interval_us > 0,
        "poll-interval-us must be non-zero"
    );

    let mut out = String::new();
    writeln!(out, "/// Board the driver is configured for.").unwrap();
    writeln!(out, "pub const BOARD: &str = {:?};", vr.board).unwrap();
    writeln!(out, "/// Shared system memory handed to the GPU driver.").unwrap();
    writeln!(out, "pub const SHARED_MEM_SIZE: usize = {:#x};", vr.shared_mem_size).unwrap();
    writeln!(out, "/// Reserved framebuffer `(start, size)`.").unwrap();
    writeln!(out, "pub const FB_RESERVED: Option<(usize, usize)> = {fb_reserved};").unwrap();
    writeln!(out, "/// Reset release strategy.").unwrap();
    writeln!(out, "pub const RESET_RELEASE: ResetRelease = ResetRelease::{reset_release};").unwrap();
    writeln!(out, "pub const SETTLE_DELAY_MS: u64 = {};", vr.timing.settle_delay_ms).unwrap();
    writeln!(out, "pub const ACK_TIMEOUT_MS: u64 = {};", vr.timing.ack_timeout_ms).unwrap();
    writeln!(out, "pub const LPI_TIMEOUT_MS: u64 = {};", vr.timing.lpi_timeout_ms).unwrap();
    writeln!(out, "pub const POLL_INTERVAL_US: u64 = {};", vr.timing.poll_interval_us).unwrap();
    writeln!(
        out,
        "pub const AUTOSUSPEND_DELAY_MS: u64 = {};",
        vr.timing.autosuspend_delay_ms
    )
    .unwrap();

    std::fs::write(out_dir().join("config.rs"), out).expect("config.rs write failed");
}

fn out_dir() -> PathBuf {
    PathBuf::from(std::env::var("OUT_DIR").unwrap())
}

#[derive(Deserialize)]
struct Config {
    vr: Vr,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Vr {
    board: String,
    shared_mem_size: usize,
    fb_start: Option<usize>,
    fb_size: Option<usize>,
    reset_release: String,
    timing: Timing,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Timing {
    settle_delay_ms: u64,
    ack_timeout_ms: u64,
    lpi_timeout_ms: u64,
    poll_interval_us: u64,
    autosuspend_delay_ms: u64,
}
