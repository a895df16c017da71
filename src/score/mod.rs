//! MusicXML score path: document model, parser, and timing resolution.

mod graph;
mod model;
mod parse;
mod timing;

pub use graph::{notes_from_graph, GraphMeasure, GraphNote, GraphVoice, ScoreGraph};
pub use model::{
    Measure, NoteEvent, ParseDiagnostic, RestEvent, ScoreDocument, ScoreEvent, Step, TimeSignature,
};
pub use parse::parse;
pub use timing::resolve;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ScoreError {
    /// The underlying XML parse reported a structural error. Terminal for
    /// the file; malformed sub-elements inside a well-formed document are
    /// skipped with diagnostics instead.
    #[error("malformed xml: {0}")]
    MalformedXml(String),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
