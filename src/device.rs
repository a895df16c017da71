//! LED controller line protocol.
//!
//! The downstream device speaks a fire-and-forget text protocol over a
//! serial byte stream: one ASCII line per LED command, plus a bare `R` to
//! clear all outputs. Only the encoding lives here; the serial transport
//! is the caller's concern.

use serde::{Deserialize, Serialize};

/// Line that resets/clears all device outputs.
pub const RESET_LINE: &str = "R\n";

/// One LED update: `index,red,green,blue,brightness` with brightness in
/// percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedCommand {
    pub index: u32,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Clamped to 0..=100 on encode
    pub brightness_pct: u8,
}

impl LedCommand {
    /// Encode as one newline-terminated protocol line.
    pub fn encode(&self) -> String {
        format!(
            "{},{},{},{},{}\n",
            self.index,
            self.red,
            self.green,
            self.blue,
            self.brightness_pct.min(100)
        )
    }
}
