//! Compressed score container (.mxl) handling.
//!
//! An .mxl file is a ZIP archive whose primary member is a MusicXML
//! document, named by the `META-INF/container.xml` manifest. Malformed and
//! truncated archives are common in the wild, so extraction degrades in
//! stages: manifest lookup, then first plausible `.xml` member, then a raw
//! byte-pattern scan for an embedded XML document.

mod archive;

pub use archive::{scan, ArchiveScan, RawContainerEntry};

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    /// No identifiable MusicXML member and the byte-pattern fallback also
    /// came up empty.
    #[error("no musicxml score found in container")]
    NoScoreFound,
}

/// Manifest member naming the primary score file.
const CONTAINER_MANIFEST: &str = "META-INF/container.xml";
/// Upper bound on the byte-pattern fallback scan.
const FALLBACK_SCAN_WINDOW: usize = 5_000_000;

const XML_PROLOG: &[u8] = b"<?xml";
const SCORE_END_TAGS: [&str; 2] = ["</score-partwise>", "</score-timewise>"];

/// Extract the primary MusicXML document from container bytes.
///
/// Selection order: the member named by the manifest's `rootfile/@full-path`;
/// else the first member ending in `.xml` outside `META-INF/` and
/// `__MACOSX/`; else a scan of the raw input for a literal `<?xml` prolog,
/// truncated inclusively at the first score end tag. Only when all three
/// stages fail does this return [`ContainerError::NoScoreFound`].
pub fn extract_score_xml(bytes: &[u8]) -> Result<(String, Vec<String>), ContainerError> {
    let ArchiveScan {
        entries,
        mut warnings,
    } = scan(bytes);

    if let Some(xml) = select_member(&entries) {
        return Ok((xml, warnings));
    }

    let warning = "no musicxml member in archive, trying byte-pattern fallback".to_string();
    log::warn!("{}", warning);
    warnings.push(warning);

    match pattern_fallback(bytes) {
        Some(xml) => Ok((xml, warnings)),
        None => Err(ContainerError::NoScoreFound),
    }
}

/// Pick the score member out of the recovered entries.
fn select_member(entries: &[RawContainerEntry]) -> Option<String> {
    if let Some(manifest) = entries.iter().find(|e| e.name == CONTAINER_MANIFEST) {
        if let Some(path) = rootfile_path(&manifest.bytes) {
            if let Some(entry) = entries.iter().find(|e| e.name == path) {
                return Some(String::from_utf8_lossy(&entry.bytes).into_owned());
            }
        }
    }

    entries
        .iter()
        .find(|e| {
            e.name.ends_with(".xml")
                && !e.name.starts_with("META-INF/")
                && !e.name.starts_with("__MACOSX/")
        })
        .map(|e| String::from_utf8_lossy(&e.bytes).into_owned())
}

/// Read `rootfile/@full-path` out of the manifest, if it parses at all.
fn rootfile_path(manifest: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(manifest);
    let doc = roxmltree::Document::parse(&text).ok()?;
    doc.descendants()
        .find(|n| n.has_tag_name("rootfile"))
        .and_then(|n| n.attribute("full-path"))
        .map(str::to_owned)
}

/// Last-resort recovery: scan the raw (possibly still-compressed) input for
/// an XML prolog and cut at the first score end tag, inclusive.
fn pattern_fallback(bytes: &[u8]) -> Option<String> {
    let window = &bytes[..bytes.len().min(FALLBACK_SCAN_WINDOW)];
    let start = find_bytes(window, XML_PROLOG)?;
    let text = String::from_utf8_lossy(&window[start..]);

    SCORE_END_TAGS
        .iter()
        .filter_map(|tag| text.find(tag).map(|pos| pos + tag.len()))
        .min()
        .map(|end| text[..end].to_owned())
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
