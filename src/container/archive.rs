//! Local-file-header scan over compressed score container bytes.
//!
//! Members are discovered purely from local headers: the scan walks the
//! buffer looking for the `PK\x03\x04` signature and never consults the
//! central directory. A truncated or padded archive therefore degrades one
//! member at a time instead of failing whole.

use std::io::Read;

use flate2::read::DeflateDecoder;

/// Local file header signature, little-endian `0x04034b50` on the wire.
const LOCAL_HEADER_SIG: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
/// Fixed portion of a local file header.
const LOCAL_HEADER_LEN: usize = 30;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

/// One decompressed archive member. Ephemeral: owned by the scan during a
/// single extraction call and discarded once the score member is located.
#[derive(Debug, Clone)]
pub struct RawContainerEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// All members recovered from one buffer, plus per-member warnings.
#[derive(Debug, Default)]
pub struct ArchiveScan {
    pub entries: Vec<RawContainerEntry>,
    pub warnings: Vec<String>,
}

/// Scan a byte buffer for local-file-header records.
///
/// On a signature match the member is consumed and the scan resumes right
/// after its data; on anything else the scan advances a single byte, which
/// tolerates inter-record padding and leading garbage. The scan ends when
/// fewer than four bytes remain. A member that cannot be inflated is kept
/// with its raw bytes rather than aborting the whole scan.
pub fn scan(bytes: &[u8]) -> ArchiveScan {
    let mut result = ArchiveScan::default();
    let mut offset = 0usize;

    while offset + 4 <= bytes.len() {
        if bytes[offset..offset + 4] != LOCAL_HEADER_SIG {
            offset += 1;
            continue;
        }
        match read_member(bytes, offset, &mut result.warnings) {
            Some((entry, next_offset)) => {
                result.entries.push(entry);
                offset = next_offset;
            }
            // Signature without a complete record behind it; treat the
            // match as noise and keep scanning.
            None => offset += 1,
        }
    }

    result
}

/// Decode the member whose local header starts at `offset`.
/// Returns the entry and the offset just past its data.
fn read_member(
    bytes: &[u8],
    offset: usize,
    warnings: &mut Vec<String>,
) -> Option<(RawContainerEntry, usize)> {
    if bytes.len() < offset + LOCAL_HEADER_LEN {
        return None;
    }

    let method = read_u16_le(bytes, offset + 8);
    let compressed_size = read_u32_le(bytes, offset + 18) as usize;
    let name_len = read_u16_le(bytes, offset + 26) as usize;
    let extra_len = read_u16_le(bytes, offset + 28) as usize;

    let name_start = offset + LOCAL_HEADER_LEN;
    let data_start = name_start.checked_add(name_len)?.checked_add(extra_len)?;
    let data_end = data_start.checked_add(compressed_size)?;
    if data_end > bytes.len() {
        return None;
    }

    let name = String::from_utf8_lossy(&bytes[name_start..name_start + name_len]).into_owned();
    let data = &bytes[data_start..data_end];

    let member_bytes = match method {
        METHOD_STORED => data.to_vec(),
        METHOD_DEFLATE => match inflate_raw(data) {
            Ok(inflated) => inflated,
            Err(err) => {
                let warning = format!("member '{}' failed to inflate ({}), kept raw", name, err);
                log::warn!("{}", warning);
                warnings.push(warning);
                data.to_vec()
            }
        },
        other => {
            let warning = format!(
                "member '{}' uses unsupported compression method {}, kept raw",
                name, other
            );
            log::warn!("{}", warning);
            warnings.push(warning);
            data.to_vec()
        }
    };

    Some((
        RawContainerEntry {
            name,
            bytes: member_bytes,
        },
        data_end,
    ))
}

/// Raw DEFLATE (no zlib/gzip wrapper), as .mxl members are stored.
fn inflate_raw(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    DeflateDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Build a stored (method 0) local-file-header record. Test fixture shared
/// with the member-selection tests.
#[cfg(test)]
pub(crate) fn stored_member(name: &str, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&LOCAL_HEADER_SIG);
    out.extend_from_slice(&[0; 4]); // version, flags
    out.extend_from_slice(&METHOD_STORED.to_le_bytes());
    out.extend_from_slice(&[0; 8]); // mod time/date, crc32
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // extra length
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_single_stored_member() {
        let archive = stored_member("hello.xml", b"<hello/>");
        let result = scan(&archive);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].name, "hello.xml");
        assert_eq!(result.entries[0].bytes, b"<hello/>");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_tolerates_leading_and_inter_record_garbage() {
        let mut archive = vec![0xDE, 0xAD, 0xBE, 0xEF];
        archive.extend(stored_member("a.xml", b"<a/>"));
        archive.extend_from_slice(b"junk");
        archive.extend(stored_member("b.xml", b"<b/>"));
        let result = scan(&archive);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].name, "a.xml");
        assert_eq!(result.entries[1].name, "b.xml");
    }

    #[test]
    fn test_scan_deflate_member_inflates() {
        use flate2::write::DeflateEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<score-partwise/>").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut archive = Vec::new();
        archive.extend_from_slice(&LOCAL_HEADER_SIG);
        archive.extend_from_slice(&[0; 4]);
        archive.extend_from_slice(&METHOD_DEFLATE.to_le_bytes());
        archive.extend_from_slice(&[0; 8]);
        archive.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        archive.extend_from_slice(&(b"<score-partwise/>".len() as u32).to_le_bytes());
        archive.extend_from_slice(&9u16.to_le_bytes());
        archive.extend_from_slice(&0u16.to_le_bytes());
        archive.extend_from_slice(b"score.xml");
        archive.extend_from_slice(&compressed);

        let result = scan(&archive);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].bytes, b"<score-partwise/>");
    }

    #[test]
    fn test_scan_bad_deflate_keeps_raw_bytes_with_warning() {
        let garbage = [0xFFu8, 0x00, 0xAB, 0xCD];
        let mut archive = Vec::new();
        archive.extend_from_slice(&LOCAL_HEADER_SIG);
        archive.extend_from_slice(&[0; 4]);
        archive.extend_from_slice(&METHOD_DEFLATE.to_le_bytes());
        archive.extend_from_slice(&[0; 8]);
        archive.extend_from_slice(&(garbage.len() as u32).to_le_bytes());
        archive.extend_from_slice(&0u32.to_le_bytes());
        archive.extend_from_slice(&5u16.to_le_bytes());
        archive.extend_from_slice(&0u16.to_le_bytes());
        archive.extend_from_slice(b"x.xml");
        archive.extend_from_slice(&garbage);

        let result = scan(&archive);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].bytes, garbage);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_scan_truncated_record_is_skipped() {
        let mut archive = stored_member("a.xml", b"<a/>");
        // Signature with nothing usable behind it.
        archive.extend_from_slice(&LOCAL_HEADER_SIG);
        archive.extend_from_slice(&[0x01, 0x02]);
        let result = scan(&archive);
        assert_eq!(result.entries.len(), 1);
    }

    #[test]
    fn test_scan_empty_buffer() {
        let result = scan(&[]);
        assert!(result.entries.is_empty());
    }
}
