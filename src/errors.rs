//! Top-level error taxonomy for the conversion pipeline.
//!
//! Document-level structural failures are terminal for a file and carry
//! the underlying error verbatim. Container- and member-level problems
//! never reach this type: they degrade into warnings on the result.

use thiserror::Error;

use crate::container::ContainerError;
use crate::score::ScoreError;
use crate::smf::SmfError;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Unparseable XML in a score file
    #[error(transparent)]
    Score(#[from] ScoreError),

    /// No MusicXML member recoverable from an .mxl container
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Missing SMF magic
    #[error(transparent)]
    Smf(#[from] SmfError),

    /// The file name carries an extension the pipeline has no path for
    #[error("unsupported input extension: {0}")]
    UnsupportedInput(String),

    #[error("failed to read input file: {0}")]
    Io(#[from] std::io::Error),
}
