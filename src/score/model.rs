//! Parsed score content in divisions-relative time.
//!
//! This is a lean model for event conversion, not a full music object
//! model: it keeps exactly what the timing resolver needs. All onsets and
//! durations are integers in the document's divisions unit; onsets are
//! measure-relative and may go temporarily negative under `backup`.

use std::fmt;

use serde::Serialize;

/// Default tempo when the document carries none: 500000 µs/quarter = 120bpm.
pub(crate) const DEFAULT_TEMPO_MICROS: u32 = 500_000;

/// Note letter (pitch class).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    pub fn from_name(name: &str) -> Option<Step> {
        match name.trim() {
            "C" => Some(Step::C),
            "D" => Some(Step::D),
            "E" => Some(Step::E),
            "F" => Some(Step::F),
            "G" => Some(Step::G),
            "A" => Some(Step::A),
            "B" => Some(Step::B),
            _ => None,
        }
    }

    /// Semitone offset within the octave.
    pub fn semitone(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_unit: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature {
            beats: 4,
            beat_unit: 4,
        }
    }
}

/// A pitched note in divisions time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub step: Step,
    pub octave: i32,
    /// Semitone alteration, typically -2..=2
    pub alter: i32,
    pub duration: i64,
    /// Measure-relative onset in divisions; may be negative after `backup`
    pub onset: i64,
    /// Chord member: shares the group onset, contributes no clock advance
    pub chord: bool,
    pub part: usize,
}

impl NoteEvent {
    /// MIDI note number: 0 = C-1, so C4 (middle C) = 60.
    pub fn midi_pitch(&self) -> u8 {
        let semi = (self.octave + 1) * 12 + self.step.semitone() + self.alter;
        semi.clamp(0, 127) as u8
    }
}

/// A rest; contributes only clock advancement upstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestEvent {
    pub duration: i64,
    pub onset: i64,
    pub part: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreEvent {
    Note(NoteEvent),
    Rest(RestEvent),
}

/// One measure's events, merged across parts by measure index. Order
/// within a measure follows document order per part.
#[derive(Debug, Clone, Default)]
pub struct Measure {
    pub index: usize,
    pub events: Vec<ScoreEvent>,
}

/// An element the parser could not use, kept alongside the partial
/// document so callers can inspect what was dropped without the parse
/// failing outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    /// MusicXML element tag name (e.g. "note")
    pub element: String,
    /// 0-based measure index, if known
    pub measure: Option<usize>,
    /// 0-based part index, if known
    pub part: Option<usize>,
    pub reason: String,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped <{}>", self.element)?;
        if let Some(measure) = self.measure {
            write!(f, " in measure {}", measure + 1)?;
        }
        if let Some(part) = self.part {
            write!(f, " (part {})", part + 1)?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// The parsed musical content of one document.
#[derive(Debug, Clone)]
pub struct ScoreDocument {
    /// Divisions per quarter note, from the first `attributes` element
    pub divisions: u32,
    /// First time signature in the document; applied globally
    pub time: TimeSignature,
    /// Key signature in fifths; informational only
    pub key_fifths: i32,
    /// First tempo in the document, in µs per quarter note
    pub tempo_micros_per_quarter: u32,
    pub measures: Vec<Measure>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Default for ScoreDocument {
    fn default() -> Self {
        ScoreDocument {
            divisions: 1,
            time: TimeSignature::default(),
            key_fifths: 0,
            tempo_micros_per_quarter: DEFAULT_TEMPO_MICROS,
            measures: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_pitch_c_major_scale() {
        let note = |step| NoteEvent {
            step,
            octave: 4,
            alter: 0,
            duration: 1,
            onset: 0,
            chord: false,
            part: 0,
        };
        assert_eq!(note(Step::C).midi_pitch(), 60);
        assert_eq!(note(Step::D).midi_pitch(), 62);
        assert_eq!(note(Step::E).midi_pitch(), 64);
        assert_eq!(note(Step::F).midi_pitch(), 65);
        assert_eq!(note(Step::G).midi_pitch(), 67);
        assert_eq!(note(Step::A).midi_pitch(), 69);
        assert_eq!(note(Step::B).midi_pitch(), 71);
    }

    #[test]
    fn test_midi_pitch_alterations_and_clamping() {
        let sharp = NoteEvent {
            step: Step::C,
            octave: 4,
            alter: 1,
            duration: 1,
            onset: 0,
            chord: false,
            part: 0,
        };
        assert_eq!(sharp.midi_pitch(), 61);

        let low = NoteEvent {
            step: Step::C,
            octave: -3,
            alter: 0,
            duration: 1,
            onset: 0,
            chord: false,
            part: 0,
        };
        assert_eq!(low.midi_pitch(), 0);

        let high = NoteEvent {
            step: Step::G,
            octave: 10,
            alter: 0,
            duration: 1,
            onset: 0,
            chord: false,
            part: 0,
        };
        assert_eq!(high.midi_pitch(), 127);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = ParseDiagnostic {
            element: "note".to_string(),
            measure: Some(2),
            part: Some(0),
            reason: "pitch without step".to_string(),
        };
        assert_eq!(
            diag.to_string(),
            "skipped <note> in measure 3 (part 1): pitch without step"
        );
    }
}
