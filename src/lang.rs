//! Language-code normalization for audio and subtitle selections.

use crate::disc::DiscInfo;

/// Selection placeholder meaning "use this track's own disc-reported code".
pub const UNDEFINED_SENTINEL: &str = "undefined";

/// Code lsdvd uses for tracks carrying several languages at once.
const MULTI_LANGUAGE_MARKER: &str = "xx";

/// Canonical ISO 639-2 codes for "multiple languages" and "undetermined".
const MULTIPLE: &str = "mul";
const UNDETERMINED: &str = "und";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Subtitle,
}

/// Resolves a candidate language code to a final 3-letter code.
///
/// Total over all inputs: the sentinel is replaced by the disc's own code for
/// the addressed track (an unknown track resolves as absent), the disc's
/// multi-language marker becomes "mul", anything empty becomes "und", and
/// every other code passes through unchanged. Must be called right before
/// the code is used in a synthesized command, never earlier.
pub fn resolve_langcode(
    disc: &DiscInfo,
    kind: TrackKind,
    title_idx: usize,
    track_idx: usize,
    candidate: &str,
) -> String {
    let code = if candidate == UNDEFINED_SENTINEL {
        disc_langcode(disc, kind, title_idx, track_idx)
    } else {
        candidate.to_string()
    };

    if code == MULTI_LANGUAGE_MARKER {
        MULTIPLE.to_string()
    } else if code.is_empty() {
        UNDETERMINED.to_string()
    } else {
        code
    }
}

fn disc_langcode(disc: &DiscInfo, kind: TrackKind, title_idx: usize, track_idx: usize) -> String {
    let Ok(title) = disc.title(title_idx) else {
        return String::new();
    };

    let index = track_idx.wrapping_sub(1);
    match kind {
        TrackKind::Audio => title
            .audio
            .get(index)
            .map(|t| t.langcode.clone())
            .unwrap_or_default(),
        TrackKind::Subtitle => title
            .subp
            .get(index)
            .map(|t| t.langcode.clone())
            .unwrap_or_default(),
    }
}
