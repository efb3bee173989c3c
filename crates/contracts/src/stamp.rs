//! Per-stream capture stamp
//!
//! Sequence number plus wall-clock time, advanced on every successful
//! capture of the owning stream.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Capture stamp for one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    /// Strictly increasing capture counter
    pub seq: u64,

    /// Wall-clock time of the capture (seconds since epoch)
    pub time: f64,
}

impl Stamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the stamp for a new successful capture
    pub fn update(&mut self) {
        self.seq += 1;
        self.time = now_secs();
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
