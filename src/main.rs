//! QCDM Capture - cellular diag to GSMTAP/PCAP translator
//!
//! Reads Qualcomm diag log records from a rooted handset (or a recorded
//! stream), decodes the over-the-air signaling payloads, and writes them
//! as GSMTAP-in-UDP-in-IP pcap records to disk and to the gateway.

mod capture;
mod config;
mod diag;
mod grpc;
mod gsmtap;
mod pipeline;
mod sink;

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use capture::{CaptureSource, SourceKind, ENABLED_LOG_CODES};
use config::Config;
use diag::DiagFrame;
use grpc::diagmon::{CaptureStatus, DiagRecord};
use grpc::StreamingGatewayClient;
use pipeline::{DiagPipeline, PipelineStats, SubscriberRegistry};
use sink::{PcapFileSink, RecordPublisher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("===========================================");
    info!("   QCDM Capture - diag to GSMTAP/PCAP");
    info!("===========================================");

    // Load configuration
    let config = Config::from_env();

    info!("Configuration:");
    match &config.gateway_url {
        Some(url) => info!("  Gateway URL: {}", url),
        None => info!("  Gateway URL: (none, file output only)"),
    }
    info!("  Device ID: {}", config.device_id);
    info!("  Mission ID: {}", config.mission_id);
    info!("  PCAP dir: {:?}", config.pcap_dir);
    match &config.fix {
        Some(fix) => info!("  Fixed position: ({:.7}, {:.7})", fix.latitude, fix.longitude),
        None => info!("  Fixed position: (none)"),
    }
    info!("  Enabled log codes: {}", ENABLED_LOG_CODES.len());

    // Pick the capture source
    let kind = if let Some(path) = &config.replay_path {
        SourceKind::Replay { path: path.clone() }
    } else if let Some(fifo) = &config.fifo_path {
        match &config.diag_helper_path {
            Some(helper) => SourceKind::Helper {
                helper_path: helper.clone(),
                cfg_path: config.diag_cfg_path.clone(),
                fifo_path: fifo.clone(),
            },
            None => SourceKind::Fifo { path: fifo.clone() },
        }
    } else {
        error!("No capture source configured.");
        error!("Set REPLAY_PATH for a recording, or DIAG_FIFO_PATH (plus DIAG_HELPER_PATH) for live capture.");
        bail!("no capture source configured");
    };

    let stats = PipelineStats::new();

    // Sinks: pcap file always, gateway publisher when configured
    let registry = SubscriberRegistry::new();
    registry.register(Arc::new(PcapFileSink::new(
        config.pcap_dir.clone(),
        config.device_id.clone(),
        config.mission_id.clone(),
    )));

    let mut status_tx: Option<mpsc::Sender<CaptureStatus>> = None;
    let mut stream_handles = Vec::new();
    if let Some(url) = &config.gateway_url {
        let (record_tx, record_rx) = mpsc::channel::<DiagRecord>(1000);
        let (tx, status_rx) = mpsc::channel::<CaptureStatus>(10);

        // Start gRPC streaming to gateway
        let gateway_url = url.clone();
        stream_handles.push(tokio::spawn(async move {
            let client = StreamingGatewayClient::new(&gateway_url);
            if let Err(e) = client.stream_records(record_rx).await {
                error!("Record stream failed: {}", e);
            }
        }));

        let gateway_url = url.clone();
        stream_handles.push(tokio::spawn(async move {
            let client = StreamingGatewayClient::new(&gateway_url);
            if let Err(e) = client.stream_status(status_rx).await {
                error!("Status stream failed: {}", e);
            }
        }));

        registry.register(Arc::new(RecordPublisher::new(
            config.device_id.clone(),
            config.mission_id.clone(),
            config.fix.clone(),
            stats.clone(),
            record_tx,
            tx.clone(),
        )));
        status_tx = Some(tx);
    }
    info!("Registered {} sinks", registry.count());

    let pipeline = DiagPipeline::new(registry.clone(), stats.clone(), config.fix.clone());

    // Start the capture source
    let source = CaptureSource::new(kind);
    let frame_rx = match source.start() {
        Ok(rx) => rx,
        Err(e) => {
            error!("Failed to start diag capture: {}", e);
            return Err(e);
        }
    };

    // Shut down cleanly on Ctrl+C so the pcap file gets its manifest
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received, shutting down...");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    // Send initial capture status
    if let Some(tx) = &status_tx {
        let _ = tx.try_send(capture_status(&config, &stats, true, ""));
    }

    info!("===========================================");
    info!("  Starting capture...");
    info!("  Press Ctrl+C to stop.");
    info!("===========================================");

    let mut current_source_file = String::new();
    let mut last_heartbeat = Instant::now();
    let mut last_stats_report = Instant::now();

    // Main processing loop - receive frames from the capture thread
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        // Non-blocking receive with timeout for heartbeats
        match frame_rx.recv_timeout(Duration::from_millis(500)) {
            Ok(frame) => {
                match &frame {
                    DiagFrame::StartLogFile { name } => current_source_file = name.clone(),
                    DiagFrame::EndLogFile { .. } => current_source_file.clear(),
                    DiagFrame::Log { .. } => {}
                }
                pipeline.process_frame(frame);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                // No frame received, continue with periodic tasks
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                info!("Capture channel disconnected");
                break;
            }
        }

        // Periodic heartbeat (every 5 seconds keeps the mission active in the gateway)
        if last_heartbeat.elapsed() >= Duration::from_secs(5) {
            if let Some(tx) = &status_tx {
                let status =
                    capture_status(&config, &stats, source.is_running(), &current_source_file);
                let _ = tx.try_send(status);
            }
            last_heartbeat = Instant::now();
        }

        // Periodic capture and pipeline statistics
        if last_stats_report.elapsed() >= Duration::from_secs(config.stats_interval_secs) {
            let source_stats = source.stats();
            info!(
                "[Capture] Bytes={}, Frames={} (dropped: {}), Framing errors={}",
                source_stats.bytes_read.load(Ordering::Relaxed),
                source_stats.frames_decoded.load(Ordering::Relaxed),
                source_stats.frames_dropped.load(Ordering::Relaxed),
                source_stats.framing_errors.load(Ordering::Relaxed)
            );
            info!("[Pipeline] {}", stats.summary());
            last_stats_report = Instant::now();
        }
    }

    // Cleanup: stop the source and flush every sink
    source.stop();
    registry.notify_capture_ended(&current_source_file);

    // Send final capture status
    if let Some(tx) = &status_tx {
        let _ = tx.try_send(capture_status(&config, &stats, false, ""));
    }

    // Cancel streaming tasks
    for handle in stream_handles {
        handle.abort();
    }

    info!("Shutdown complete. {}", stats.summary());
    Ok(())
}

fn capture_status(
    config: &Config,
    stats: &PipelineStats,
    capturing: bool,
    capture_file: &str,
) -> CaptureStatus {
    CaptureStatus {
        device_id: config.device_id.clone(),
        mission_id: config.mission_id.clone(),
        capturing,
        capture_file: capture_file.to_string(),
        frames_processed: stats.frames_processed.load(Ordering::Relaxed),
        records_written: stats.records_decoded.load(Ordering::Relaxed),
        frames_dropped: stats.dropped(),
        timestamp_ms: chrono::Utc::now().timestamp_millis() as u64,
    }
}
