//! Capability interface over an external score-object graph.
//!
//! Some front ends already hold a rendering library's in-memory score tree
//! with beat-based timing. Rather than duck-typing through that tree, the
//! library-specific traversal is isolated behind one narrow trait; the
//! shared timing and merge logic then works on [`TimedNote`]s as usual.

use crate::events::TimedNote;

/// One note inside a voice, in beat units. `start_beat` is relative to the
/// measure that owns the voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphNote {
    pub pitch: u8,
    pub start_beat: f64,
    pub duration_beats: f64,
}

/// One voice's notes within a measure.
#[derive(Debug, Clone, Default)]
pub struct GraphVoice {
    pub notes: Vec<GraphNote>,
}

/// One measure of the external tree, with its absolute start beat.
#[derive(Debug, Clone, Default)]
pub struct GraphMeasure {
    pub start_beat: f64,
    pub voices: Vec<GraphVoice>,
}

/// The narrow surface an adapter must implement over whatever rendering
/// library is in use.
pub trait ScoreGraph {
    fn measures(&self) -> Vec<GraphMeasure>;
}

/// Project a score graph onto timed notes at a fixed tempo.
pub fn notes_from_graph(graph: &impl ScoreGraph, bpm: f64) -> Vec<TimedNote> {
    let bpm = if bpm > 0.0 { bpm } else { 120.0 };
    let ms_per_beat = 60_000.0 / bpm;

    let mut notes = Vec::new();
    for measure in graph.measures() {
        for voice in &measure.voices {
            for note in &voice.notes {
                let start = (measure.start_beat + note.start_beat) * ms_per_beat;
                let start = start.max(0.0);
                let end = start + note.duration_beats.max(0.0) * ms_per_beat;
                notes.push(TimedNote {
                    pitch: note.pitch,
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

    struct FixedGraph(Vec<GraphMeasure>);

    impl ScoreGraph for FixedGraph {
        fn measures(&self) -> Vec<GraphMeasure> {
            self.0.clone()
        }
    }

    #[test]
    fn test_graph_notes_project_to_ms() {
        let graph = FixedGraph(vec![
            GraphMeasure {
                start_beat: 0.0,
                voices: vec![GraphVoice {
                    notes: vec![GraphNote {
                        pitch: 60,
                        start_beat: 0.0,
                        duration_beats: 1.0,
                    }],
                }],
            },
            GraphMeasure {
                start_beat: 4.0,
                voices: vec![GraphVoice {
                    notes: vec![GraphNote {
                        pitch: 64,
                        start_beat: 1.0,
                        duration_beats: 0.5,
                    }],
                }],
            },
        ]);

        let notes = notes_from_graph(&graph, 120.0);
        assert_eq!(notes.len(), 2);
        assert_eq!((notes[0].start_ms, notes[0].end_ms), (0.0, 500.0));
        assert_eq!((notes[1].start_ms, notes[1].end_ms), (2500.0, 2750.0));
    }

    #[test]
    fn test_graph_nonpositive_bpm_falls_back_to_default() {
        let graph = FixedGraph(vec![GraphMeasure {
            start_beat: 0.0,
            voices: vec![GraphVoice {
                notes: vec![GraphNote {
                    pitch: 60,
                    start_beat: 1.0,
                    duration_beats: 1.0,
                }],
            }],
        }]);
        let notes = notes_from_graph(&graph, 0.0);
        assert_eq!(notes[0].start_ms, 500.0);
    }
}
