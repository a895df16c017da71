//! Standard MIDI File chunk and event decoding.
//!
//! Decodes `MThd`/`MTrk` chunks into raw note events on an absolute tick
//! axis plus a tempo map. Track decoding is best-effort: a missing `MTrk`
//! signature or an unhandled status byte abandons that point of the file
//! with a warning, keeping everything decoded so far.

use crate::smf::tempo::TempoMap;
use crate::smf::{Result, SmfError};

const SET_TEMPO_META: u8 = 0x51;

/// One channel note message at an absolute track tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTrackEvent {
    pub tick: u64,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

/// A decoded file: note events sorted by tick, the combined tempo map of
/// all tracks, and any decode warnings.
#[derive(Debug, Clone)]
pub struct SmfScore {
    pub division: u16,
    pub events: Vec<RawTrackEvent>,
    pub tempo_map: TempoMap,
    pub warnings: Vec<String>,
}

/// Parse an SMF byte stream.
///
/// Fails only on a missing `MThd` magic; everything past the header is
/// decoded best-effort.
pub fn parse(bytes: &[u8]) -> Result<SmfScore> {
    if bytes.len() < 14 || &bytes[0..4] != b"MThd" {
        return Err(SmfError::InvalidHeader);
    }

    // Chunk length and format type are not needed; track count and
    // division are.
    let track_count = read_u16_be(bytes, 10);
    let division = read_u16_be(bytes, 12);

    let mut events = Vec::new();
    let mut tempo_changes = Vec::new();
    let mut warnings = Vec::new();

    let mut offset = 14usize;
    for track in 0..track_count {
        if offset + 8 > bytes.len() {
            push_warning(
                &mut warnings,
                format!("track {} missing, file truncated", track),
            );
            break;
        }
        if &bytes[offset..offset + 4] != b"MTrk" {
            push_warning(
                &mut warnings,
                format!(
                    "track {} has no MTrk signature, remaining tracks skipped",
                    track
                ),
            );
            break;
        }

        let length = read_u32_be(bytes, offset + 4) as usize;
        let data_start = offset + 8;
        let data_end = data_start.saturating_add(length).min(bytes.len());
        if data_start.saturating_add(length) > bytes.len() {
            push_warning(&mut warnings, format!("track {} data truncated", track));
        }

        decode_track(
            &bytes[data_start..data_end],
            track,
            &mut events,
            &mut tempo_changes,
            &mut warnings,
        );
        offset = data_end;
    }

    events.sort_by_key(|e| e.tick);
    let tempo_map = TempoMap::build(tempo_changes, division);

    Ok(SmfScore {
        division,
        events,
        tempo_map,
        warnings,
    })
}

/// Decode one track's event stream. Ticks accumulate from the per-event
/// delta times; running status reuses the previous status byte whenever
/// the next byte's high bit is clear.
fn decode_track(
    data: &[u8],
    track: u16,
    events: &mut Vec<RawTrackEvent>,
    tempo_changes: &mut Vec<(u64, u32)>,
    warnings: &mut Vec<String>,
) {
    let mut offset = 0usize;
    let mut tick = 0u64;
    let mut last_status: Option<u8> = None;

    while offset < data.len() {
        tick += u64::from(read_vlq(data, &mut offset));
        let first = match data.get(offset) {
            Some(&byte) => byte,
            None => break,
        };

        let status = if first & 0x80 == 0 {
            // Running status: the byte just seen is already the first data
            // byte, so the offset stays put.
            match last_status {
                Some(status) => status,
                None => {
                    push_warning(
                        warnings,
                        format!("track {}: data byte with no running status, rest of track skipped", track),
                    );
                    return;
                }
            }
        } else {
            offset += 1;
            if first < 0xF0 {
                last_status = Some(first);
            }
            first
        };

        match status & 0xF0 {
            0x80 | 0x90 => {
                let data1 = byte_at(data, offset);
                let data2 = byte_at(data, offset + 1);
                offset += 2;
                events.push(RawTrackEvent {
                    tick,
                    status,
                    data1,
                    data2,
                });
            }
            // Aftertouch, control change, pitch bend: two data bytes.
            0xA0 | 0xB0 | 0xE0 => offset += 2,
            // Program change, channel pressure: one data byte.
            0xC0 | 0xD0 => offset += 1,
            0xF0 => {
                if status == 0xFF {
                    let meta_type = byte_at(data, offset);
                    offset += 1;
                    let length = read_vlq(data, &mut offset) as usize;
                    if meta_type == SET_TEMPO_META && length >= 3 && offset + 3 <= data.len() {
                        let micros = u32::from(data[offset]) << 16
                            | u32::from(data[offset + 1]) << 8
                            | u32::from(data[offset + 2]);
                        if micros > 0 {
                            tempo_changes.push((tick, micros));
                        }
                    }
                    offset = offset.saturating_add(length).min(data.len());
                } else if status == 0xF0 || status == 0xF7 {
                    // Sysex carries its own length; skip the payload.
                    let length = read_vlq(data, &mut offset) as usize;
                    offset = offset.saturating_add(length).min(data.len());
                } else {
                    // 0xF1-0xF6, 0xF8-0xFE have no length field to trust.
                    push_warning(
                        warnings,
                        format!(
                            "track {}: unhandled status byte 0x{:02X}, rest of track skipped",
                            track, status
                        ),
                    );
                    return;
                }
            }
            _ => {}
        }
    }
}

/// MIDI variable-length quantity: 7 bits per byte, high bit continues,
/// big-endian bit order within the value.
fn read_vlq(data: &[u8], offset: &mut usize) -> u32 {
    let mut value = 0u32;
    while let Some(&byte) = data.get(*offset) {
        *offset += 1;
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            break;
        }
    }
    value
}

fn byte_at(data: &[u8], offset: usize) -> u8 {
    data.get(offset).copied().unwrap_or(0)
}

fn push_warning(warnings: &mut Vec<String>, warning: String) {
    log::warn!("{}", warning);
    warnings.push(warning);
}

fn read_u16_be(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Encode a value as a VLQ. Test fixture for round-trip checks and track
/// building, shared with the conversion tests.
#[cfg(test)]
pub(crate) fn write_vlq(mut value: u32, out: &mut Vec<u8>) {
    let mut stack = [0u8; 5];
    let mut count = 0;
    loop {
        stack[count] = (value & 0x7F) as u8;
        count += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    while count > 1 {
        count -= 1;
        out.push(stack[count] | 0x80);
    }
    out.push(stack[0]);
}

/// Assemble a complete SMF from raw track payloads. Test fixture.
#[cfg(test)]
pub(crate) fn smf_bytes(division: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // format
    out.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(track);
    }
    out
}
