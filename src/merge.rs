//! Deduplication and final event emission.
//!
//! Multi-voice scores often notate the same pitch redundantly across
//! staves or parts at the same instant. Coincident notes (same start time
//! rounded to 2 decimals, same pitch) collapse to the one with the longest
//! duration before the note-on/note-off streams are emitted.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::events::{MidiEvent, NotePair, TimedNote, NOTE_OFF, NOTE_ON, PLAYBACK_VELOCITY};

/// The merger's output: wire-ready events sorted by time, one note pair
/// per surviving note, and the timestamp of the last event.
#[derive(Debug, Clone, Default)]
pub struct MergedEvents {
    pub midi_events: Vec<MidiEvent>,
    pub note_pairs: Vec<NotePair>,
    pub total_duration_ms: f64,
}

/// Deduplicate coincident notes and emit sorted note-on/note-off events.
///
/// Within a `(rounded start, pitch)` group only a strictly longer note
/// replaces the incumbent; ties keep the first seen. The sort is stable,
/// so events sharing a timestamp keep their insertion order.
pub fn merge(notes: &[TimedNote]) -> MergedEvents {
    let mut index: HashMap<(i64, u8), usize> = HashMap::new();
    let mut kept: Vec<TimedNote> = Vec::new();

    for note in notes {
        let key = (start_key(note.start_ms), note.pitch);
        match index.get(&key) {
            Some(&slot) => {
                if duration(note) > duration(&kept[slot]) {
                    kept[slot] = *note;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(*note);
            }
        }
    }

    let mut midi_events = Vec::with_capacity(kept.len() * 2);
    let mut note_pairs = Vec::with_capacity(kept.len());
    for note in &kept {
        midi_events.push(MidiEvent {
            time_ms: note.start_ms,
            status: NOTE_ON,
            data1: note.pitch,
            data2: PLAYBACK_VELOCITY,
        });
        midi_events.push(MidiEvent {
            time_ms: note.end_ms,
            status: NOTE_OFF,
            data1: note.pitch,
            data2: 0,
        });
        note_pairs.push(NotePair {
            pitch: note.pitch,
            start_ms: note.start_ms,
            end_ms: note.end_ms,
        });
    }

    midi_events.sort_by(|a, b| a.time_ms.partial_cmp(&b.time_ms).unwrap_or(Ordering::Equal));
    let total_duration_ms = midi_events.last().map_or(0.0, |e| e.time_ms);

    MergedEvents {
        midi_events,
        note_pairs,
        total_duration_ms,
    }
}

/// Group key: start time rounded to 2 decimal places, kept exact as an
/// integer so it can be hashed.
fn start_key(start_ms: f64) -> i64 {
    (start_ms * 100.0).round() as i64
}

fn duration(note: &TimedNote) -> f64 {
    note.end_ms - note.start_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start_ms: f64, end_ms: f64) -> TimedNote {
        TimedNote {
            pitch,
            start_ms,
            end_ms,
        }
    }

    #[test]
    fn test_merge_emits_on_off_pairs() {
        let merged = merge(&[note(60, 0.0, 500.0), note(64, 1000.0, 1500.0)]);
        assert_eq!(merged.midi_events.len(), 4);
        assert_eq!(merged.note_pairs.len(), 2);
        assert_eq!(merged.total_duration_ms, 1500.0);

        let first = merged.midi_events[0];
        assert_eq!((first.status, first.data1, first.data2), (NOTE_ON, 60, PLAYBACK_VELOCITY));
        let last = merged.midi_events[3];
        assert_eq!((last.status, last.data1, last.data2), (NOTE_OFF, 64, 0));
    }

    #[test]
    fn test_merge_keeps_longer_duplicate() {
        let merged = merge(&[note(60, 0.0, 250.0), note(60, 0.0, 800.0)]);
        assert_eq!(merged.note_pairs.len(), 1);
        assert_eq!(merged.note_pairs[0].end_ms, 800.0);
    }

    #[test]
    fn test_merge_tie_keeps_first_seen() {
        let merged = merge(&[note(60, 0.0, 500.0), note(60, 0.0, 500.0)]);
        assert_eq!(merged.note_pairs.len(), 1);
    }

    #[test]
    fn test_merge_rounding_groups_near_coincident_starts() {
        // 0.001ms apart: same group at 2-decimal rounding.
        let merged = merge(&[note(60, 100.004, 300.0), note(60, 100.001, 600.0)]);
        assert_eq!(merged.note_pairs.len(), 1);
        assert_eq!(merged.note_pairs[0].end_ms, 600.0);
    }

    #[test]
    fn test_merge_same_start_different_pitch_both_kept() {
        let merged = merge(&[note(60, 0.0, 500.0), note(64, 0.0, 500.0)]);
        assert_eq!(merged.note_pairs.len(), 2);
    }

    #[test]
    fn test_merge_idempotent_on_deduplicated_input() {
        let input = [note(60, 0.0, 500.0), note(64, 250.0, 750.0)];
        let first = merge(&input);
        let again: Vec<TimedNote> = first
            .note_pairs
            .iter()
            .map(|p| note(p.pitch, p.start_ms, p.end_ms))
            .collect();
        let second = merge(&again);
        assert_eq!(first.midi_events, second.midi_events);
        assert_eq!(first.note_pairs, second.note_pairs);
    }

    #[test]
    fn test_merge_output_sorted_by_time() {
        let merged = merge(&[
            note(60, 900.0, 1000.0),
            note(64, 0.0, 2000.0),
            note(67, 450.0, 460.0),
        ]);
        assert!(merged
            .midi_events
            .windows(2)
            .all(|w| w[0].time_ms <= w[1].time_ms));
    }

    #[test]
    fn test_merge_empty_input() {
        let merged = merge(&[]);
        assert!(merged.midi_events.is_empty());
        assert_eq!(merged.total_duration_ms, 0.0);
    }
}
