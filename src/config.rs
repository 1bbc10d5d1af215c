//! Configuration loaded from environment variables

use std::path::PathBuf;

use chrono::Utc;

use crate::gsmtap::GpsFix;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Gateway URL for gRPC streaming; unset disables publishing
    pub gateway_url: Option<String>,

    /// Device ID string for identification
    pub device_id: String,

    /// Mission ID grouping this capture run
    pub mission_id: String,

    /// Path to the native diag helper binary
    pub diag_helper_path: Option<PathBuf>,

    /// Log mask config file the helper replays into the diag port
    pub diag_cfg_path: PathBuf,

    /// Named pipe carrying the framed capture stream
    pub fifo_path: Option<PathBuf>,

    /// Recorded capture stream to replay instead of a live device
    pub replay_path: Option<PathBuf>,

    /// Directory for pcap output and manifests
    pub pcap_dir: PathBuf,

    /// Fixed GPS position attached to every record
    pub fix: Option<GpsFix>,

    /// Pipeline statistics reporting interval in seconds
    pub stats_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let device_id = std::env::var("DEVICE_ID").unwrap_or_else(|_| "QCDM-0001".to_string());
        let mission_id = std::env::var("MISSION_ID")
            .unwrap_or_else(|_| format!("{}-{}", device_id, Utc::now().format("%Y%m%d")));

        Self {
            gateway_url: std::env::var("GATEWAY_URL").ok(),

            device_id,

            mission_id,

            diag_helper_path: std::env::var("DIAG_HELPER_PATH").ok().map(PathBuf::from),

            diag_cfg_path: std::env::var("DIAG_CFG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("diag.cfg")),

            fifo_path: std::env::var("DIAG_FIFO_PATH").ok().map(PathBuf::from),

            replay_path: std::env::var("REPLAY_PATH").ok().map(PathBuf::from),

            pcap_dir: std::env::var("PCAP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("captures")),

            fix: fix_from_env(),

            stats_interval_secs: std::env::var("STATS_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

/// A fix needs both FIXED_LAT and FIXED_LON; FIXED_ALT is optional.
fn fix_from_env() -> Option<GpsFix> {
    let latitude: f64 = std::env::var("FIXED_LAT").ok()?.parse().ok()?;
    let longitude: f64 = std::env::var("FIXED_LON").ok()?.parse().ok()?;
    let altitude = std::env::var("FIXED_ALT").ok().and_then(|s| s.parse().ok());
    Some(GpsFix {
        latitude,
        longitude,
        altitude,
    })
}
