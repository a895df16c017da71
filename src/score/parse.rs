//! MusicXML document parser.
//!
//! Walks a parsed XML tree in document order, maintaining one divisions
//! clock per part per measure. Structural XML failures are terminal;
//! malformed notes inside a well-formed document are skipped and recorded
//! as diagnostics on the resulting [`ScoreDocument`].

use roxmltree::{Document, Node};

use crate::score::model::{
    Measure, NoteEvent, ParseDiagnostic, RestEvent, ScoreDocument, ScoreEvent, Step, TimeSignature,
};
use crate::score::{Result, ScoreError};

/// Parse MusicXML text into a [`ScoreDocument`].
///
/// Global tempo comes from the first `<sound tempo="...">` in the document
/// (default 120bpm); divisions, key, and time signature come from the
/// first `<attributes>` encountered anywhere. Later attribute changes are
/// ignored: the whole document plays on one grid.
pub fn parse(xml: &str) -> Result<ScoreDocument> {
    let doc = Document::parse(xml).map_err(|e| ScoreError::MalformedXml(e.to_string()))?;
    let root = doc.root_element();

    let mut document = ScoreDocument::default();

    if let Some(bpm) = root
        .descendants()
        .find(|n| n.has_tag_name("sound") && n.attribute("tempo").is_some())
        .and_then(|n| n.attribute("tempo"))
        .and_then(|t| t.trim().parse::<f64>().ok())
        .filter(|bpm| *bpm > 0.0)
    {
        document.tempo_micros_per_quarter = (60_000_000.0 / bpm) as u32;
    }

    if let Some(attributes) = root.descendants().find(|n| n.has_tag_name("attributes")) {
        parse_attributes(&attributes, &mut document);
    }

    let parts: Vec<_> = root
        .descendants()
        .filter(|n| n.has_tag_name("part"))
        .collect();

    // Pre-allocate to the longest part; shorter parts simply leave later
    // measures without a contribution.
    let measure_count = parts
        .iter()
        .map(|p| p.children().filter(|n| n.has_tag_name("measure")).count())
        .max()
        .unwrap_or(0);
    document.measures = (0..measure_count)
        .map(|index| Measure {
            index,
            events: Vec::new(),
        })
        .collect();

    for (part_index, part) in parts.iter().enumerate() {
        let measures = part.children().filter(|n| n.has_tag_name("measure"));
        for (measure_index, measure) in measures.enumerate() {
            parse_measure(
                &measure,
                part_index,
                measure_index,
                &mut document.measures[measure_index].events,
                &mut document.diagnostics,
            );
        }
    }

    log::debug!(
        "parsed score: {} measures, divisions={}, {} diagnostics",
        document.measures.len(),
        document.divisions,
        document.diagnostics.len()
    );

    Ok(document)
}

fn parse_attributes(attributes: &Node, document: &mut ScoreDocument) {
    if let Some(divisions) = child_text(attributes, "divisions")
        .and_then(|t| t.trim().parse::<u32>().ok())
        .filter(|d| *d > 0)
    {
        document.divisions = divisions;
    }

    if let Some(key) = child(attributes, "key") {
        if let Some(fifths) = child_text(&key, "fifths").and_then(|t| t.trim().parse::<i32>().ok())
        {
            document.key_fifths = fifths;
        }
    }

    if let Some(time) = child(attributes, "time") {
        let beats = child_text(&time, "beats").and_then(|t| t.trim().parse::<u32>().ok());
        let beat_unit = child_text(&time, "beat-type").and_then(|t| t.trim().parse::<u32>().ok());
        if let (Some(beats), Some(beat_unit)) = (beats, beat_unit) {
            if beats > 0 && beat_unit > 0 {
                document.time = TimeSignature { beats, beat_unit };
            }
        }
    }
}

/// Walk one measure of one part, document order, divisions clock from 0.
///
/// A chord group's clock advance is held in `pending_advance` and committed
/// when the group is consumed by the next non-chord event, so every member
/// of the group shares the group onset and the clock moves exactly once
/// per group. `backup` may drive the clock negative; that is tolerated.
fn parse_measure(
    node: &Node,
    part: usize,
    measure: usize,
    events: &mut Vec<ScoreEvent>,
    diagnostics: &mut Vec<ParseDiagnostic>,
) {
    let mut clock: i64 = 0;
    let mut pending_advance: i64 = 0;

    for element in node.children().filter(|n| n.is_element()) {
        match element.tag_name().name() {
            "backup" => {
                clock += pending_advance;
                pending_advance = 0;
                clock -= element_duration(&element);
            }
            "forward" => {
                clock += pending_advance;
                pending_advance = 0;
                clock += element_duration(&element);
            }
            "note" => {
                let duration = element_duration(&element);
                let is_chord = child(&element, "chord").is_some();

                if let Some(pitch) = child(&element, "pitch") {
                    match parse_pitch(&pitch) {
                        Some((step, octave, alter)) => {
                            let onset = if is_chord {
                                clock
                            } else {
                                clock += pending_advance;
                                pending_advance = duration;
                                clock
                            };
                            events.push(ScoreEvent::Note(NoteEvent {
                                step,
                                octave,
                                alter,
                                duration,
                                onset,
                                chord: is_chord,
                                part,
                            }));
                        }
                        None => {
                            skip_note(
                                diagnostics,
                                measure,
                                part,
                                "pitch missing step or octave",
                            );
                            if !is_chord {
                                clock += pending_advance;
                                pending_advance = duration;
                            }
                        }
                    }
                } else if child(&element, "rest").is_some() {
                    clock += pending_advance;
                    pending_advance = duration;
                    events.push(ScoreEvent::Rest(RestEvent {
                        duration,
                        onset: clock,
                        part,
                    }));
                } else {
                    skip_note(diagnostics, measure, part, "neither pitch nor rest");
                    if !is_chord {
                        clock += pending_advance;
                        pending_advance = duration;
                    }
                }
            }
            _ => {}
        }
    }
}

fn skip_note(
    diagnostics: &mut Vec<ParseDiagnostic>,
    measure: usize,
    part: usize,
    reason: &str,
) {
    let diag = ParseDiagnostic {
        element: "note".to_string(),
        measure: Some(measure),
        part: Some(part),
        reason: reason.to_string(),
    };
    log::warn!("{}", diag);
    diagnostics.push(diag);
}

fn parse_pitch(pitch: &Node) -> Option<(Step, i32, i32)> {
    let step = child_text(pitch, "step").and_then(Step::from_name)?;
    let octave = child_text(pitch, "octave").and_then(|t| t.trim().parse::<i32>().ok())?;
    let alter = child_text(pitch, "alter")
        .and_then(|t| t.trim().parse::<i32>().ok())
        .unwrap_or(0);
    Some((step, octave, alter))
}

fn element_duration(node: &Node) -> i64 {
    child_text(node, "duration")
        .and_then(|t| t.trim().parse::<i64>().ok())
        .unwrap_or(0)
        .max(0)
}

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn child_text<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|n| n.text())
}
