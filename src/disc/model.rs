use crate::utils::{Error, Result};

/// Titles shorter than this are menu stubs or padding, not playable content.
const MIN_PLAYABLE_LENGTH_SECS: f64 = 1.0;

/// Placeholder lsdvd reports when the disc carries no usable volume name.
const UNKNOWN_DISC_TITLE: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub ix: usize,
    pub langcode: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleTrack {
    pub ix: usize,
    pub langcode: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub ix: usize,
    pub length: f64,
}

/// One playable DVD title with its audio, subtitle and chapter layout.
///
/// Indices are 1-based, exactly as lsdvd reports them.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub ix: usize,
    pub length: f64,
    pub audio: Vec<AudioTrack>,
    pub subp: Vec<SubtitleTrack>,
    pub chapter: Vec<Chapter>,
}

/// Disc-level metadata parsed from the lsdvd dump.
///
/// Built once at session start and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscInfo {
    pub device: String,
    pub title: String,
    pub track: Vec<Title>,
    pub longest_track: usize,
}

impl DiscInfo {
    /// Ordered indices of all titles long enough to be playable content.
    pub fn all_playable_title_indices(&self) -> Vec<usize> {
        self.track
            .iter()
            .filter(|t| t.length >= MIN_PLAYABLE_LENGTH_SECS)
            .map(|t| t.ix)
            .collect()
    }

    /// The longest-track index exactly as the source tool reported it.
    /// Never recomputed from the track lengths.
    pub fn longest_title_index(&self) -> usize {
        self.longest_track
    }

    /// 1-based access to a title.
    pub fn title(&self, title_idx: usize) -> Result<&Title> {
        title_idx
            .checked_sub(1)
            .and_then(|i| self.track.get(i))
            .ok_or_else(|| {
                Error::index_out_of_range(format!(
                    "title {} (disc has {} titles)",
                    title_idx,
                    self.track.len()
                ))
            })
    }

    /// File-name prefix for every produced artifact: the disc title unless it
    /// is empty or the literal "unknown" placeholder. The comparison is exact
    /// and case-sensitive on purpose.
    pub fn file_prefix(&self) -> &str {
        if !self.title.is_empty() && self.title != UNKNOWN_DISC_TITLE {
            &self.title
        } else {
            "dvd"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disc() -> DiscInfo {
        DiscInfo {
            device: ".".to_string(),
            title: "TEST_DVD".to_string(),
            track: vec![
                Title {
                    ix: 1,
                    length: 3600.0,
                    audio: vec![],
                    subp: vec![],
                    chapter: vec![],
                },
                Title {
                    ix: 2,
                    length: 600.0,
                    audio: vec![],
                    subp: vec![],
                    chapter: vec![],
                },
                Title {
                    ix: 3,
                    length: 0.1,
                    audio: vec![],
                    subp: vec![],
                    chapter: vec![],
                },
            ],
            longest_track: 1,
        }
    }

    #[test]
    fn test_playable_titles_exclude_short_stubs() {
        assert_eq!(disc().all_playable_title_indices(), vec![1, 2]);
    }

    #[test]
    fn test_playable_titles_empty_disc() {
        let mut d = disc();
        d.track.clear();
        assert!(d.all_playable_title_indices().is_empty());
    }

    #[test]
    fn test_longest_title_is_taken_verbatim() {
        // Deliberately inconsistent with the actual lengths: the reported
        // value wins.
        let mut d = disc();
        d.longest_track = 2;
        assert_eq!(d.longest_title_index(), 2);
    }

    #[test]
    fn test_title_access_is_one_based() {
        let d = disc();
        assert_eq!(d.title(1).unwrap().ix, 1);
        assert_eq!(d.title(3).unwrap().ix, 3);
        assert!(d.title(0).is_err());
        assert!(d.title(4).is_err());
    }

    #[test]
    fn test_file_prefix_uses_disc_title() {
        assert_eq!(disc().file_prefix(), "TEST_DVD");
    }

    #[test]
    fn test_file_prefix_placeholder_and_empty() {
        let mut d = disc();
        d.title = "unknown".to_string();
        assert_eq!(d.file_prefix(), "dvd");
        d.title = String::new();
        assert_eq!(d.file_prefix(), "dvd");
        // Exact-match only: a differently cased placeholder is a real name.
        d.title = "Unknown".to_string();
        assert_eq!(d.file_prefix(), "Unknown");
    }
}
