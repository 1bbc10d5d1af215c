//! PCAP file sink
//!
//! Writes finished records to one `.pcap` file per device log session
//! and drops a JSON manifest next to it when the session closes.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::gsmtap::{build_global_header, WireRecord};
use crate::sink::{RecordSubscriber, SinkError};

pub struct PcapFileSink {
    dir: PathBuf,
    device_id: String,
    mission_id: String,
    state: Mutex<SinkState>,
}

#[derive(Default)]
struct SinkState {
    current: Option<OpenCapture>,
    write_failed: bool,
}

struct OpenCapture {
    writer: BufWriter<File>,
    path: PathBuf,
    source_name: String,
    records: u64,
    bytes_written: u64,
    first_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
    opened_at: DateTime<Utc>,
}

/// Summary written next to each finished pcap file.
#[derive(Debug, Serialize)]
struct CaptureManifest {
    device_id: String,
    mission_id: String,
    pcap_file: String,
    source_name: String,
    records: u64,
    bytes_written: u64,
    first_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
    opened_at: String,
    closed_at: String,
}

impl PcapFileSink {
    pub fn new(dir: PathBuf, device_id: String, mission_id: String) -> Self {
        Self {
            dir,
            device_id,
            mission_id,
            state: Mutex::new(SinkState::default()),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_capture(&self, source_name: &str) -> io::Result<OpenCapture> {
        fs::create_dir_all(&self.dir)?;
        let stem = sanitize_name(source_name).unwrap_or_else(|| {
            format!("{}-{}", self.device_id, Utc::now().format("%Y%m%d-%H%M%S"))
        });
        let path = self.dir.join(format!("{}.pcap", stem));
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&build_global_header())?;
        writer.flush()?;
        info!("[PcapFile] Writing capture to {:?}", path);
        Ok(OpenCapture {
            writer,
            path,
            source_name: source_name.to_string(),
            records: 0,
            bytes_written: 0,
            first_timestamp: None,
            last_timestamp: None,
            opened_at: Utc::now(),
        })
    }

    fn close_capture(&self, mut capture: OpenCapture) -> io::Result<()> {
        capture.writer.flush()?;
        let pcap_file = capture
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let manifest = CaptureManifest {
            device_id: self.device_id.clone(),
            mission_id: self.mission_id.clone(),
            pcap_file,
            source_name: capture.source_name,
            records: capture.records,
            bytes_written: capture.bytes_written,
            first_timestamp: capture.first_timestamp,
            last_timestamp: capture.last_timestamp,
            opened_at: capture.opened_at.to_rfc3339(),
            closed_at: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(capture.path.with_extension("json"), json)?;
        info!(
            "[PcapFile] Closed {:?}: {} records, {} bytes",
            capture.path, manifest.records, manifest.bytes_written
        );
        Ok(())
    }
}

impl RecordSubscriber for PcapFileSink {
    fn name(&self) -> &str {
        "pcap-file"
    }

    fn on_capture_started(&self, source_name: &str) -> Result<(), SinkError> {
        let mut state = self.lock_state();
        if let Some(capture) = state.current.take() {
            if let Err(e) = self.close_capture(capture) {
                warn!("[PcapFile] Failed to close previous capture: {}", e);
            }
        }
        state.write_failed = false;
        match self.open_capture(source_name) {
            Ok(capture) => {
                state.current = Some(capture);
                Ok(())
            }
            Err(e) => {
                state.write_failed = true;
                Err(SinkError::Io(e))
            }
        }
    }

    fn on_record(&self, record: &WireRecord) -> Result<(), SinkError> {
        let mut state = self.lock_state();
        if state.write_failed {
            return Err(SinkError::Unavailable);
        }
        if state.current.is_none() {
            // Records can arrive before any start-of-log marker
            match self.open_capture("") {
                Ok(capture) => state.current = Some(capture),
                Err(e) => {
                    state.write_failed = true;
                    return Err(SinkError::Io(e));
                }
            }
        }
        let capture = match state.current.as_mut() {
            Some(capture) => capture,
            None => return Err(SinkError::Unavailable),
        };
        // Flushed per record so the file stays readable mid-capture
        let written = capture
            .writer
            .write_all(&record.bytes)
            .and_then(|_| capture.writer.flush());
        if let Err(e) = written {
            state.current = None;
            state.write_failed = true;
            return Err(SinkError::Io(e));
        }
        capture.records += 1;
        capture.bytes_written += record.bytes.len() as u64;
        capture.first_timestamp.get_or_insert(record.meta.timestamp);
        capture.last_timestamp = Some(record.meta.timestamp);
        Ok(())
    }

    fn on_capture_ended(&self, _source_name: &str) -> Result<(), SinkError> {
        let mut state = self.lock_state();
        state.write_failed = false;
        match state.current.take() {
            Some(capture) => self.close_capture(capture).map_err(SinkError::Io),
            None => Ok(()),
        }
    }
}

impl Drop for PcapFileSink {
    fn drop(&mut self) {
        let mut state = self.lock_state();
        if let Some(capture) = state.current.take() {
            if let Err(e) = self.close_capture(capture) {
                warn!("[PcapFile] Failed to close capture on shutdown: {}", e);
            }
        }
    }
}

/// Reduces an incoming log file name to a safe file stem. Returns
/// `None` when nothing usable is left, so the caller can fall back to
/// a generated name.
fn sanitize_name(name: &str) -> Option<String> {
    let stem = Path::new(name).file_stem()?.to_string_lossy();
    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsmtap::RecordMeta;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("qcdm-pcap-test-{}-{}", tag, std::process::id()))
    }

    fn sample_record(timestamp: f64) -> WireRecord {
        WireRecord {
            bytes: vec![0xAB; 40],
            meta: RecordMeta {
                timestamp,
                gsmtap_type: 0x01,
                gsmtap_subtype: 0x01,
                uplink: false,
            },
        }
    }

    #[test]
    fn test_session_written_with_manifest() {
        let dir = temp_dir("session");
        let sink = PcapFileSink::new(dir.clone(), "DEV-1".to_string(), "M-1".to_string());

        sink.on_capture_started("diag_log_7.qmdl").unwrap();
        sink.on_record(&sample_record(100.0)).unwrap();
        sink.on_record(&sample_record(101.5)).unwrap();
        sink.on_capture_ended("diag_log_7.qmdl").unwrap();

        let pcap = fs::read(dir.join("diag_log_7.pcap")).unwrap();
        assert_eq!(&pcap[..4], &[0xd4, 0xc3, 0xb2, 0xa1]);
        assert_eq!(pcap.len(), 24 + 2 * 40);

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("diag_log_7.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["records"], 2);
        assert_eq!(manifest["bytes_written"], 80);
        assert_eq!(manifest["source_name"], "diag_log_7.qmdl");
        assert_eq!(manifest["first_timestamp"], 100.0);
        assert_eq!(manifest["last_timestamp"], 101.5);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_record_without_start_opens_default_capture() {
        let dir = temp_dir("default");
        let sink = PcapFileSink::new(dir.clone(), "DEV-2".to_string(), "M-2".to_string());

        sink.on_record(&sample_record(5.0)).unwrap();
        drop(sink);

        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with("DEV-2") && n.ends_with(".pcap")));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_source_names_cannot_escape_capture_dir() {
        assert_eq!(sanitize_name("../../etc/passwd"), Some("passwd".to_string()));
        assert_eq!(sanitize_name("diag log (1).qmdl"), Some("diaglog1".to_string()));
        assert_eq!(sanitize_name(""), None);
        assert_eq!(sanitize_name("///"), None);
    }
}
