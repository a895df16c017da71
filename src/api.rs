//! Conversion entry points.
//!
//! Dispatches on file extension and runs the matching pipeline:
//! `.mxl` unpacks the container first, `.xml`/`.musicxml` parse directly,
//! `.mid`/`.midi` go through the SMF decoder. All paths converge on one
//! [`ConversionResult`].

use std::path::Path;

use crate::container;
use crate::errors::ConvertError;
use crate::events::{ConversionResult, TimedNote};
use crate::merge;
use crate::score;
use crate::smf;

/// Which pipeline a file routes through, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `.mxl`: ZIP container holding a MusicXML document
    CompressedScore,
    /// `.xml` / `.musicxml`: raw MusicXML text
    Score,
    /// `.mid` / `.midi`: Standard MIDI File
    Midi,
}

/// Classify a file name by extension, case-insensitive.
pub fn input_kind(name: &str) -> Option<InputKind> {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match extension.as_str() {
        "mxl" => Some(InputKind::CompressedScore),
        "xml" | "musicxml" => Some(InputKind::Score),
        "mid" | "midi" => Some(InputKind::Midi),
        _ => None,
    }
}

/// Convert one file's bytes, routing by its name's extension.
pub fn convert(name: &str, bytes: &[u8]) -> Result<ConversionResult, ConvertError> {
    match input_kind(name) {
        Some(kind) => convert_bytes(kind, bytes),
        None => Err(ConvertError::UnsupportedInput(
            Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or(name)
                .to_string(),
        )),
    }
}

/// Convert one file's bytes with an explicit pipeline choice.
pub fn convert_bytes(kind: InputKind, bytes: &[u8]) -> Result<ConversionResult, ConvertError> {
    match kind {
        InputKind::CompressedScore => {
            let (xml, warnings) = container::extract_score_xml(bytes)?;
            convert_score_xml(&xml, warnings)
        }
        InputKind::Score => {
            let xml = String::from_utf8_lossy(bytes);
            convert_score_xml(&xml, Vec::new())
        }
        InputKind::Midi => {
            let (notes, warnings) = smf::convert(bytes)?;
            Ok(finish(&notes, warnings))
        }
    }
}

/// Read a file from disk and convert it.
pub fn convert_path(path: &Path) -> Result<ConversionResult, ConvertError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    convert(&name, &bytes)
}

fn convert_score_xml(
    xml: &str,
    mut warnings: Vec<String>,
) -> Result<ConversionResult, ConvertError> {
    let document = score::parse(xml)?;
    warnings.extend(document.diagnostics.iter().map(|d| d.to_string()));
    let notes = score::resolve(&document);
    Ok(finish(&notes, warnings))
}

fn finish(notes: &[TimedNote], warnings: Vec<String>) -> ConversionResult {
    let merged = merge::merge(notes);
    ConversionResult {
        events: merged.midi_events,
        note_pairs: merged.note_pairs,
        total_duration_ms: merged.total_duration_ms,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_by_extension() {
        assert_eq!(input_kind("song.mxl"), Some(InputKind::CompressedScore));
        assert_eq!(input_kind("song.XML"), Some(InputKind::Score));
        assert_eq!(input_kind("song.musicxml"), Some(InputKind::Score));
        assert_eq!(input_kind("song.mid"), Some(InputKind::Midi));
        assert_eq!(input_kind("song.MIDI"), Some(InputKind::Midi));
        assert_eq!(input_kind("song.wav"), None);
        assert_eq!(input_kind("song"), None);
    }

    #[test]
    fn test_convert_unknown_extension_fails() {
        let err = convert("song.wav", &[]).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedInput(ext) if ext == "wav"));
    }
}
