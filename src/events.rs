//! Common event model shared by both conversion paths.
//!
//! A score file (MusicXML) and a Standard MIDI File decode very differently,
//! but both paths converge on the same output: timed notes, wire-ready MIDI
//! channel messages, and a note-time table for the falling-notes display.

use serde::{Deserialize, Serialize};

/// MIDI note-on status byte (channel 0).
pub const NOTE_ON: u8 = 0x90;
/// MIDI note-off status byte (channel 0).
pub const NOTE_OFF: u8 = 0x80;
/// Velocity used for all emitted note-on events.
pub const PLAYBACK_VELOCITY: u8 = 100;

/// A resolved note: pitch plus absolute start/end in milliseconds.
///
/// Produced by the score timing resolver or by the SMF path's tick-to-ms
/// projection, consumed by the event merger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedNote {
    /// MIDI note number 0-127
    pub pitch: u8,
    pub start_ms: f64,
    pub end_ms: f64,
}

/// A wire-ready 3-byte MIDI channel message with an absolute timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MidiEvent {
    pub time_ms: f64,
    /// Status byte (0x90 note-on, 0x80 note-off)
    pub status: u8,
    /// First data byte (pitch)
    pub data1: u8,
    /// Second data byte (velocity, 0 for note-off)
    pub data2: u8,
}

/// One surviving note after deduplication, for the visualization layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotePair {
    pub pitch: u8,
    pub start_ms: f64,
    pub end_ms: f64,
}

/// Result of converting one input file.
///
/// `events` is sorted by `time_ms` ascending. `warnings` carries every
/// degraded-path diagnostic encountered on the way (bad archive members,
/// partially decoded tracks, skipped malformed notes); an empty list means
/// the input decoded cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionResult {
    pub events: Vec<MidiEvent>,
    pub note_pairs: Vec<NotePair>,
    pub total_duration_ms: f64,
    pub warnings: Vec<String>,
}

impl ConversionResult {
    /// Serialize for handoff to a UI layer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
