//! Tick-position tempo map with precomputed cumulative milliseconds.
//!
//! MIDI files express time in ticks whose wall-clock length depends on the
//! tempo in effect; tempo can change mid-piece. The map stores each change
//! with the elapsed milliseconds up to it, so projecting any tick is one
//! lookup plus one multiplication.

/// 500000 µs/quarter = 120bpm, the SMF default when no set-tempo meta
/// event appears before the first note.
pub(crate) const DEFAULT_TEMPO_MICROS: u32 = 500_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoMapEntry {
    pub tick: u64,
    pub micros_per_quarter: u32,
    pub cumulative_ms: f64,
}

/// Ordered tempo changes for one file. The first entry always sits at
/// tick 0 (default tempo unless the file overrides it there).
#[derive(Debug, Clone)]
pub struct TempoMap {
    entries: Vec<TempoMapEntry>,
    /// Ticks per quarter note, guarded against a zero division field
    ticks_per_quarter: f64,
}

impl TempoMap {
    /// Build the map from raw `(tick, µs/quarter)` changes in any order.
    pub fn build(mut changes: Vec<(u64, u32)>, division: u16) -> TempoMap {
        changes.sort_by_key(|&(tick, _)| tick);
        let ticks_per_quarter = division.max(1) as f64;

        let mut entries = vec![TempoMapEntry {
            tick: 0,
            micros_per_quarter: DEFAULT_TEMPO_MICROS,
            cumulative_ms: 0.0,
        }];

        for (tick, micros) in changes {
            let last = entries.len() - 1;
            if entries[last].tick == tick {
                // Several changes on one tick: the last one wins.
                entries[last].micros_per_quarter = micros;
            } else {
                let prev = entries[last];
                let cumulative_ms = prev.cumulative_ms
                    + (tick - prev.tick) as f64 / ticks_per_quarter
                        * prev.micros_per_quarter as f64
                        / 1000.0;
                entries.push(TempoMapEntry {
                    tick,
                    micros_per_quarter: micros,
                    cumulative_ms,
                });
            }
        }

        TempoMap {
            entries,
            ticks_per_quarter,
        }
    }

    /// Project an absolute tick onto milliseconds, using the latest entry
    /// at or before it. Linear scan; tempo maps stay tiny in practice.
    pub fn time_ms(&self, tick: u64) -> f64 {
        let mut active = self.entries[0];
        for entry in &self.entries {
            if entry.tick <= tick {
                active = *entry;
            } else {
                break;
            }
        }
        active.cumulative_ms
            + (tick - active.tick) as f64 / self.ticks_per_quarter * active.micros_per_quarter as f64
                / 1000.0
    }

    pub fn entries(&self) -> &[TempoMapEntry] {
        &self.entries
    }
}
