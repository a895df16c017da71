//! Standard MIDI File path: chunk parsing, tempo map, tick-to-ms timing.

mod parse;
mod tempo;

pub use parse::{parse, RawTrackEvent, SmfScore};
pub use tempo::{TempoMap, TempoMapEntry};

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use crate::events::TimedNote;

#[derive(Debug, Clone, Error)]
pub enum SmfError {
    /// The first four bytes are not the `MThd` magic. Terminal for the
    /// file; anything past a valid header decodes best-effort.
    #[error("not a standard midi file (missing MThd magic)")]
    InvalidHeader,
}

pub type Result<T> = std::result::Result<T, SmfError>;

/// Decode an SMF byte stream into timed notes.
///
/// Projects every note event through the tempo map, then pairs note-ons
/// with their note-offs (status `0x80`, or `0x90` with velocity 0) per
/// pitch in first-on-first-off order. A note-on left open at the end of
/// the file closes at the final event's timestamp.
pub fn convert(bytes: &[u8]) -> Result<(Vec<TimedNote>, Vec<String>)> {
    let score = parse(bytes)?;

    let mut open: HashMap<u8, VecDeque<f64>> = HashMap::new();
    let mut notes = Vec::new();
    let mut last_time_ms = 0.0f64;

    for event in &score.events {
        let time_ms = score.tempo_map.time_ms(event.tick);
        if time_ms > last_time_ms {
            last_time_ms = time_ms;
        }

        let family = event.status & 0xF0;
        let is_note_off = family == 0x80 || (family == 0x90 && event.data2 == 0);
        if is_note_off {
            if let Some(starts) = open.get_mut(&event.data1) {
                if let Some(start_ms) = starts.pop_front() {
                    notes.push(TimedNote {
                        pitch: event.data1,
                        start_ms,
                        end_ms: time_ms.max(start_ms),
                    });
                }
            }
        } else if family == 0x90 {
            open.entry(event.data1).or_default().push_back(time_ms);
        }
    }

    let mut warnings = score.warnings;
    let mut dangling = 0usize;
    for (pitch, starts) in open {
        for start_ms in starts {
            dangling += 1;
            notes.push(TimedNote {
                pitch,
                start_ms,
                end_ms: last_time_ms.max(start_ms),
            });
        }
    }
    if dangling > 0 {
        let warning = format!(
            "{} note-on event(s) without a note-off, closed at end of file",
            dangling
        );
        log::warn!("{}", warning);
        warnings.push(warning);
    }

    notes.sort_by(|a, b| {
        a.start_ms
            .partial_cmp(&b.start_ms)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok((notes, warnings))
}
