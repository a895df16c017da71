//! Divisions-to-milliseconds resolution for a parsed score.
//!
//! Every measure gets the same fixed duration, derived from the first time
//! signature and tempo in the document. Mid-score tempo or meter changes
//! are not reflected; the whole piece plays on one grid.

use crate::events::TimedNote;
use crate::score::model::{ScoreDocument, ScoreEvent};

/// Resolve all pitched notes of a document to absolute milliseconds.
///
/// Rests and skipped notes contributed only to clock advancement upstream
/// and produce nothing here. A backup-induced negative onset resolves with
/// its start clamped at zero.
pub fn resolve(document: &ScoreDocument) -> Vec<TimedNote> {
    let divisions = document.divisions.max(1) as f64;
    let ms_per_division = (document.tempo_micros_per_quarter as f64 / 1000.0) / divisions;
    let beats = document.time.beats as f64;
    let beat_unit = document.time.beat_unit.max(1) as f64;
    let ms_per_measure = beats * divisions * 4.0 / beat_unit * ms_per_division;

    let mut notes = Vec::new();
    for measure in &document.measures {
        let measure_start = measure.index as f64 * ms_per_measure;
        for event in &measure.events {
            if let ScoreEvent::Note(note) = event {
                let start = (measure_start + note.onset as f64 * ms_per_division).max(0.0);
                let end = (start + note.duration as f64 * ms_per_division).max(start);
                notes.push(TimedNote {
                    pitch: note.midi_pitch(),
                    start_ms: start,
                    end_ms: end,
                });
            }
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::model::{Measure, NoteEvent, RestEvent, Step, TimeSignature};

    fn doc_with_events(events: Vec<ScoreEvent>) -> ScoreDocument {
        ScoreDocument {
            divisions: 1,
            time: TimeSignature { beats: 4, beat_unit: 4 },
            measures: vec![Measure { index: 0, events }],
            ..ScoreDocument::default()
        }
    }

    fn quarter(step: Step, onset: i64) -> ScoreEvent {
        ScoreEvent::Note(NoteEvent {
            step,
            octave: 4,
            alter: 0,
            duration: 1,
            onset,
            chord: false,
            part: 0,
        })
    }

    #[test]
    fn test_quarter_note_grid_at_120bpm() {
        // divisions=1, 4/4, 120bpm: one division = 500ms, measure = 2000ms.
        let doc = doc_with_events(vec![
            quarter(Step::C, 0),
            ScoreEvent::Rest(RestEvent { duration: 1, onset: 1, part: 0 }),
            quarter(Step::E, 2),
        ]);
        let notes = resolve(&doc);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].pitch, 60);
        assert_eq!((notes[0].start_ms, notes[0].end_ms), (0.0, 500.0));
        assert_eq!(notes[1].pitch, 64);
        assert_eq!((notes[1].start_ms, notes[1].end_ms), (1000.0, 1500.0));
    }

    #[test]
    fn test_second_measure_offsets_by_measure_duration() {
        let mut doc = doc_with_events(vec![quarter(Step::C, 0)]);
        doc.measures.push(Measure {
            index: 1,
            events: vec![quarter(Step::D, 0)],
        });
        let notes = resolve(&doc);
        assert_eq!(notes[1].start_ms, 2000.0);
    }

    #[test]
    fn test_three_four_measure_duration() {
        let mut doc = doc_with_events(vec![quarter(Step::C, 0)]);
        doc.time = TimeSignature { beats: 3, beat_unit: 4 };
        doc.measures.push(Measure {
            index: 1,
            events: vec![quarter(Step::D, 0)],
        });
        let notes = resolve(&doc);
        // 3 quarters per measure at 500ms each
        assert_eq!(notes[1].start_ms, 1500.0);
    }

    #[test]
    fn test_negative_onset_clamps_to_zero() {
        let doc = doc_with_events(vec![quarter(Step::C, -2)]);
        let notes = resolve(&doc);
        assert_eq!(notes[0].start_ms, 0.0);
        assert!(notes[0].end_ms >= notes[0].start_ms);
    }

    #[test]
    fn test_chord_members_resolve_at_shared_onset() {
        let chord = |step| {
            ScoreEvent::Note(NoteEvent {
                step,
                octave: 4,
                alter: 0,
                duration: 1,
                onset: 0,
                chord: true,
                part: 0,
            })
        };
        let doc = doc_with_events(vec![quarter(Step::C, 0), chord(Step::E), chord(Step::G)]);
        let notes = resolve(&doc);
        assert!(notes.iter().all(|n| n.start_ms == 0.0));
    }
}
