//! Playback position tracking over a converted event list.
//!
//! The conversion pipeline is pure; anything stateful about playback
//! (current position, rate) lives in a session value owned by the caller.
//! Scheduling is a slice over the time-sorted event list, so a caller
//! ticks the session forward and sends whatever came due.

use crate::events::MidiEvent;

/// Caller-owned playback state for one converted file.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    position_ms: f64,
    rate: f64,
    cursor: usize,
}

impl PlaybackSession {
    /// Start a session at position 0. Non-positive rates fall back to 1.
    pub fn new(rate: f64) -> Self {
        PlaybackSession {
            position_ms: 0.0,
            rate: if rate > 0.0 { rate } else { 1.0 },
            cursor: 0,
        }
    }

    pub fn position_ms(&self) -> f64 {
        self.position_ms
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) {
        if rate > 0.0 {
            self.rate = rate;
        }
    }

    /// Jump to an absolute position; events before it count as already
    /// delivered.
    pub fn seek(&mut self, events: &[MidiEvent], position_ms: f64) {
        self.position_ms = position_ms.max(0.0);
        self.cursor = events.partition_point(|e| e.time_ms < self.position_ms);
    }

    /// Advance by wall-clock `elapsed_ms` (scaled by the rate) and return
    /// the slice of events that newly came due. `events` must be the same
    /// time-sorted list across calls.
    pub fn advance<'a>(&mut self, events: &'a [MidiEvent], elapsed_ms: f64) -> &'a [MidiEvent] {
        self.position_ms += elapsed_ms.max(0.0) * self.rate;
        let start = self.cursor;
        let due = events[start..].partition_point(|e| e.time_ms <= self.position_ms);
        self.cursor = start + due;
        &events[start..self.cursor]
    }

    pub fn finished(&self, events: &[MidiEvent]) -> bool {
        self.cursor >= events.len()
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        PlaybackSession::new(1.0)
    }
}
