//! Diag capture source
//!
//! Reads the helper's framed byte stream from a pipe or a recorded
//! file, reassembles frames, and hands them to the pipeline over a
//! bounded channel. When a helper binary is configured it is spawned
//! here and its output forwarded into our log.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs::{self, File};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::logmask::build_log_mask_config;
use crate::diag::{DiagFrame, FrameDecoder};

/// Where the framed diag stream comes from.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Spawn the native helper; frames arrive over its named pipe.
    Helper {
        helper_path: PathBuf,
        cfg_path: PathBuf,
        fifo_path: PathBuf,
    },
    /// Attach to a pipe some other process feeds.
    Fifo { path: PathBuf },
    /// Read a finite recording and stop at its end.
    Replay { path: PathBuf },
}

/// Statistics for the capture source (atomic for thread-safe access)
#[derive(Debug, Default)]
pub struct SourceStats {
    pub bytes_read: AtomicU64,
    pub frames_decoded: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub framing_errors: AtomicU64,
}

impl SourceStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Capture controller
pub struct CaptureSource {
    kind: SourceKind,
    running: Arc<AtomicBool>,
    stats: Arc<SourceStats>,
}

impl CaptureSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            running: Arc::new(AtomicBool::new(false)),
            stats: SourceStats::new(),
        }
    }

    /// Start capturing and return a receiver for decoded frames
    pub fn start(&self) -> Result<Receiver<DiagFrame>> {
        info!("===========================================");
        info!("  Starting diag capture");
        info!("===========================================");
        match &self.kind {
            SourceKind::Helper {
                helper_path,
                cfg_path,
                fifo_path,
            } => {
                info!("  Helper: {:?}", helper_path);
                info!("  Log mask config: {:?}", cfg_path);
                info!("  Pipe: {:?}", fifo_path);
            }
            SourceKind::Fifo { path } => info!("  Pipe: {:?}", path),
            SourceKind::Replay { path } => info!("  Replay file: {:?}", path),
        }

        // Create channel for decoded frames
        let (frame_tx, frame_rx) = bounded::<DiagFrame>(1000);

        // Clone for thread
        let kind = self.kind.clone();
        let running = self.running.clone();
        let stats = self.stats.clone();

        running.store(true, Ordering::SeqCst);

        // Spawn capture thread
        thread::Builder::new()
            .name("diag-capture".to_string())
            .spawn(move || {
                if let Err(e) = run_capture(kind, running.clone(), stats, frame_tx) {
                    error!("Diag capture error: {}", e);
                }
                running.store(false, Ordering::SeqCst);
            })
            .context("Failed to spawn capture thread")?;

        Ok(frame_rx)
    }

    /// Stop capturing
    pub fn stop(&self) {
        info!("Stopping diag capture...");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get statistics
    pub fn stats(&self) -> &Arc<SourceStats> {
        &self.stats
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Main capture loop (runs in dedicated thread)
fn run_capture(
    kind: SourceKind,
    running: Arc<AtomicBool>,
    stats: Arc<SourceStats>,
    frame_tx: Sender<DiagFrame>,
) -> Result<()> {
    let replay = matches!(kind, SourceKind::Replay { .. });
    let (mut input, child) = open_source(&kind)?;

    info!("===========================================");
    info!("  DIAG CAPTURE STARTED");
    info!("===========================================");

    let mut decoder = FrameDecoder::new();
    let mut buffer = vec![0u8; 64 * 1024];
    let mut first_data = true;

    // Main capture loop
    while running.load(Ordering::SeqCst) {
        match input.read(&mut buffer) {
            Ok(0) => {
                if replay {
                    info!("Replay file exhausted");
                } else {
                    warn!("Diag stream closed (EOF)");
                }
                break;
            }
            Ok(n_read) => {
                if first_data {
                    info!("First diag data received ({} bytes)", n_read);
                    first_data = false;
                }
                stats.bytes_read.fetch_add(n_read as u64, Ordering::Relaxed);
                decoder.push(&buffer[..n_read]);

                // Drain every complete frame before reading again
                loop {
                    match decoder.next_frame() {
                        Ok(Some(frame)) => {
                            stats.frames_decoded.fetch_add(1, Ordering::Relaxed);
                            if frame_tx.try_send(frame).is_err() {
                                stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                                debug!("Frame channel full, dropping frame");
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            stats.framing_errors.fetch_add(1, Ordering::Relaxed);
                            debug!("Dropping malformed frame: {}", e);
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Error reading diag stream: {}", e);
                thread::sleep(Duration::from_millis(100));
            }
        }
    }

    if replay {
        if let Err(e) = decoder.finish() {
            error!("Replay file ends mid-frame: {}", e);
        }
    } else if decoder.buffered() > 0 {
        warn!(
            "Discarding {} buffered bytes of an incomplete frame",
            decoder.buffered()
        );
    }

    // Kill the helper process
    if let Some(mut child) = child {
        let _ = child.kill();
        let _ = child.wait();
    }

    info!("Diag capture stopped");
    info!(
        "Final stats: Bytes={}, Frames={} (dropped: {}), Framing errors={}",
        stats.bytes_read.load(Ordering::Relaxed),
        stats.frames_decoded.load(Ordering::Relaxed),
        stats.frames_dropped.load(Ordering::Relaxed),
        stats.framing_errors.load(Ordering::Relaxed)
    );

    Ok(())
}

/// Opens the byte stream for a source, spawning the helper first when
/// one is configured.
fn open_source(kind: &SourceKind) -> Result<(File, Option<Child>)> {
    match kind {
        SourceKind::Helper {
            helper_path,
            cfg_path,
            fifo_path,
        } => {
            if !cfg_path.exists() {
                fs::write(cfg_path, build_log_mask_config())
                    .with_context(|| format!("Failed to write log mask config {:?}", cfg_path))?;
                info!("Wrote log mask config to {:?}", cfg_path);
            }

            let mut cmd = Command::new(helper_path);
            cmd.arg(cfg_path).arg(fifo_path);
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            info!("Executing: {:?}", cmd);

            let mut child = cmd.spawn().context(
                "Failed to spawn diag helper. Make sure it is installed and the device is rooted",
            )?;

            if let Some(stdout) = child.stdout.take() {
                spawn_line_logger(stdout);
            }
            if let Some(stderr) = child.stderr.take() {
                spawn_line_logger(stderr);
            }

            // Blocks until the helper opens its end
            let input = File::open(fifo_path)
                .with_context(|| format!("Failed to open capture pipe {:?}", fifo_path))?;
            Ok((input, Some(child)))
        }
        SourceKind::Fifo { path } => {
            let input = File::open(path)
                .with_context(|| format!("Failed to open capture pipe {:?}", path))?;
            Ok((input, None))
        }
        SourceKind::Replay { path } => {
            let input = File::open(path)
                .with_context(|| format!("Failed to open replay file {:?}", path))?;
            Ok((input, None))
        }
    }
}

/// Forwards a helper output stream into our log line by line.
fn spawn_line_logger(stream: impl Read + Send + 'static) {
    thread::spawn(move || {
        let mut reader = std::io::BufReader::new(stream);
        let mut line = String::new();
        while std::io::BufRead::read_line(&mut reader, &mut line).unwrap_or(0) > 0 {
            if !line.trim().is_empty() {
                info!("[diag-helper] {}", line.trim());
            }
            line.clear();
        }
    });
}
