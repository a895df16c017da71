//! Score-to-event conversion engine for a falling-notes LED piano display.
//!
//! Two independent decoders turn very different encodings (a compressed
//! MusicXML container and a Standard MIDI File) into one common
//! representation: a time-ordered sequence of note-on/note-off events with
//! absolute millisecond timestamps, plus a note-time table for rendering.

pub mod api;
pub mod container;
pub mod device;
pub mod errors;
pub mod events;
pub mod merge;
pub mod playback;
pub mod score;
pub mod smf;

// Re-export the conversion surface most callers need.
pub use api::{convert, convert_bytes, convert_path, input_kind, InputKind};
pub use errors::ConvertError;
pub use events::{ConversionResult, MidiEvent, NotePair, TimedNote};
pub use playback::PlaybackSession;
