//! Diag capture sources and device configuration
//!
//! Everything between the modem's diag port and the decode pipeline:
//! 1. Build the log mask config that switches on the log codes we decode
//! 2. Spawn the native helper (or attach to a pipe / replay file)
//! 3. Reassemble the helper's framing into frames for the pipeline

mod logmask;
mod source;

pub use logmask::{build_log_mask_config, ENABLED_LOG_CODES};
pub use source::{CaptureSource, SourceKind, SourceStats};
