//! Pure construction of external-tool argument vectors and artifact text.
//!
//! Nothing in here touches the filesystem or spawns processes; the
//! orchestrator owns all side effects. Argument order is contractual: the
//! mkvmerge vector and its `--track-order` string are covered by golden
//! tests and must stay byte-for-byte stable.

use crate::config::ToolsConfig;
use crate::disc::DiscInfo;
use crate::utils::Result;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::path::{Path, PathBuf};

/// mencoder tags extracted VobSub tracks with an empty id; every such line
/// gets the resolved language code patched in.
static VOBSUB_EMPTY_LANG: Lazy<Regex> = Lazy::new(|| Regex::new("id: , index").unwrap());

/// One selected track: a 1-based stream-local index plus a language code
/// that has already been through the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSelection {
    pub ix: usize,
    pub langcode: String,
}

impl TrackSelection {
    pub fn new(ix: usize, langcode: impl Into<String>) -> Self {
        Self {
            ix,
            langcode: langcode.into(),
        }
    }
}

/// Inputs for one mkvmerge invocation.
#[derive(Debug, Clone)]
pub struct MergeRequest<'a> {
    pub title_idx: usize,
    pub audio: &'a [TrackSelection],
    /// Whether the audio list came from the caller rather than the disc
    /// defaults. Only explicit selections restrict the muxed audio tracks.
    pub audio_explicit: bool,
    pub subs: &'a [TrackSelection],
    pub outdir: &'a Path,
}

/// Stateless builder of commands and artifact names for one disc session.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    device: String,
    file_prefix: String,
    tools: ToolsConfig,
    tmp_dir: PathBuf,
    aspect_ratio: Option<String>,
    split_chapters: bool,
}

impl CommandSynthesizer {
    pub fn new(
        device: String,
        file_prefix: String,
        tools: ToolsConfig,
        tmp_dir: PathBuf,
        aspect_ratio: Option<String>,
        split_chapters: bool,
    ) -> Self {
        Self {
            device,
            file_prefix,
            tools,
            tmp_dir,
            aspect_ratio,
            split_chapters,
        }
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    // Artifact names. All deterministic; the remux of a title always maps to
    // the same set of files. Dump-only actions place them in the output
    // directory, the full remux in the temp directory.

    pub fn stream_filename(&self, title_idx: usize, dir: &Path) -> PathBuf {
        dir.join(format!("{}_{}_video.vob", self.file_prefix, title_idx))
    }

    pub fn vobsub_basename(
        &self,
        title_idx: usize,
        sub_idx: usize,
        langcode: &str,
        dir: &Path,
    ) -> PathBuf {
        dir.join(format!(
            "{}_{}_vobsub_{}_{}",
            self.file_prefix, title_idx, sub_idx, langcode
        ))
    }

    pub fn vobsub_filenames(
        &self,
        title_idx: usize,
        sub_idx: usize,
        langcode: &str,
        dir: &Path,
    ) -> (PathBuf, PathBuf, PathBuf) {
        let base = self.vobsub_basename(title_idx, sub_idx, langcode, dir);
        let idx = base.with_extension("idx");
        let sub = base.with_extension("sub");
        (base, idx, sub)
    }

    pub fn chapters_filename(&self, title_idx: usize, dir: &Path) -> PathBuf {
        dir.join(format!("{}_{}_chapters.txt", self.file_prefix, title_idx))
    }

    pub fn output_filename(&self, title_idx: usize, outdir: &Path) -> PathBuf {
        outdir.join(format!("{}_{}.DVDRemux.mkv", self.file_prefix, title_idx))
    }

    /// mplayer invocation dumping the whole title (video plus all audio) into
    /// a single elementary stream file.
    pub fn dumpstream_cmd(&self, title_idx: usize, dir: &Path) -> Vec<String> {
        let outfile = self.stream_filename(title_idx, dir);

        vec![
            self.tools.mplayer.clone(),
            "-dvd-device".to_string(),
            self.device.clone(),
            format!("dvd://{}", title_idx),
            "-dumpstream".to_string(),
            "-dumpfile".to_string(),
            path_arg(&outfile),
        ]
    }

    /// mencoder invocation extracting one VobSub track into an idx/sub
    /// sidecar pair next to `basename`.
    pub fn dumpvobsub_cmd(&self, title_idx: usize, sub_idx: usize, basename: &Path) -> Vec<String> {
        vec![
            self.tools.mencoder.clone(),
            "-dvd-device".to_string(),
            self.device.clone(),
            format!("dvd://{}", title_idx),
            "-vobsubout".to_string(),
            path_arg(basename),
            "-vobsuboutindex".to_string(),
            sub_idx.to_string(),
            "-sid".to_string(),
            (sub_idx - 1).to_string(),
            "-ovc".to_string(),
            "copy".to_string(),
            "-oac".to_string(),
            "copy".to_string(),
            "-nosound".to_string(),
            "-o".to_string(),
            "/dev/null".to_string(),
            "-vf".to_string(),
            "harddup".to_string(),
        ]
    }

    /// Chapter marker text for a title, or `None` when the title has one
    /// chapter at most (a single chapter carries no information worth a
    /// sidecar, and the merge omits `--chapters`).
    pub fn chapter_text(&self, disc: &DiscInfo, title_idx: usize) -> Result<Option<String>> {
        let title = disc.title(title_idx)?;

        if title.chapter.len() <= 1 {
            return Ok(None);
        }

        let mut text = String::new();
        let mut start = 0.0_f64;

        for chapter in &title.chapter {
            text.push_str(&format!(
                "CHAPTER{:02}={}\n",
                chapter.ix,
                convert_seconds_to_hhmmss(start)
            ));
            // Chapter names are not available from the disc; left blank.
            text.push_str(&format!("CHAPTER{:02}NAME=\n", chapter.ix));

            start += chapter.length;
        }

        Ok(Some(text))
    }

    /// The mkvmerge invocation. Construction order is contractual:
    /// output, per-audio language tags, the optional audio restriction,
    /// the optional aspect ratio, the stream dump file, per-subtitle
    /// language tag plus idx file, chapters, split mode, track order.
    pub fn merge_cmd(&self, disc: &DiscInfo, request: &MergeRequest<'_>) -> Result<Vec<String>> {
        let outfile = self.output_filename(request.title_idx, request.outdir);

        let mut args = vec![
            self.tools.mkvmerge.clone(),
            "--output".to_string(),
            path_arg(&outfile),
        ];

        // File 0 is the stream dump carrying video and all audio.
        let mut in_file_number = 0usize;
        let mut track_order = format!("{}:0", in_file_number);

        let mut audio_tracks = Vec::new();

        for audio in request.audio {
            audio_tracks.push(audio.ix.to_string());

            args.push("--language".to_string());
            args.push(format!("{}:{}", audio.ix, audio.langcode));

            // Audio tracks follow the video inside file 0.
            track_order.push_str(&format!(",{}:{}", in_file_number, audio.ix));
        }

        // Defaulting means "mux everything the stream dump contains", which
        // needs no restriction directive.
        if request.audio_explicit && !audio_tracks.is_empty() {
            args.push("--audio-tracks".to_string());
            args.push(audio_tracks.join(","));
        }

        if let Some(aspect_ratio) = &self.aspect_ratio {
            args.push("--aspect-ratio".to_string());
            args.push(format!("0:{}", aspect_ratio));
        }

        args.push(path_arg(&self.stream_filename(request.title_idx, &self.tmp_dir)));

        for sub in request.subs {
            // Every subtitle travels in its own input file.
            in_file_number += 1;

            let (_, idx_file, _) =
                self.vobsub_filenames(request.title_idx, sub.ix, &sub.langcode, &self.tmp_dir);

            args.push("--language".to_string());
            args.push(format!("0:{}", sub.langcode));
            args.push(path_arg(&idx_file));

            track_order.push_str(&format!(",{}:0", in_file_number));
        }

        if disc.title(request.title_idx)?.chapter.len() > 1 {
            args.push("--chapters".to_string());
            args.push(path_arg(&self.chapters_filename(request.title_idx, &self.tmp_dir)));
        }

        if self.split_chapters {
            args.push("--split".to_string());
            args.push("chapters:all".to_string());
        }

        args.push("--track-order".to_string());
        args.push(track_order);

        Ok(args)
    }
}

/// Rewrites every `id: , index` occurrence in a VobSub index sidecar to
/// carry the resolved language code. Repairs a known gap in mencoder's own
/// language tagging.
pub fn fix_vobsub_lang_id(content: &str, langcode: &str) -> String {
    let replacement = format!("id: {}, index", langcode);
    VOBSUB_EMPTY_LANG
        .replace_all(content, NoExpand(&replacement))
        .to_string()
}

/// Renders a second offset as `HH:MM:SS.mmm`, the format chapter markers
/// and log output use. The offset is carried at microsecond precision and
/// truncated, not rounded, to milliseconds.
pub fn convert_seconds_to_hhmmss(seconds: f64) -> String {
    let micros = (seconds * 1_000_000.0).round().max(0.0) as i64;
    let at_offset = DateTime::<Utc>::UNIX_EPOCH + Duration::microseconds(micros);
    // %.3f truncates the sub-second field to three digits.
    at_offset.format("%H:%M:%S%.3f").to_string()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::disc::parse_disc_info;
    use crate::disc::parser::LSDVD_OUTPUT;
    use pretty_assertions::assert_eq;

    fn synthesizer(aspect_ratio: Option<&str>, split_chapters: bool) -> CommandSynthesizer {
        CommandSynthesizer::new(
            ".".to_string(),
            "TEST_DVD".to_string(),
            Config::default().tools,
            PathBuf::from("/tmp/work"),
            aspect_ratio.map(str::to_string),
            split_chapters,
        )
    }

    fn disc() -> DiscInfo {
        parse_disc_info(LSDVD_OUTPUT).unwrap()
    }

    fn default_audio() -> Vec<TrackSelection> {
        vec![TrackSelection::new(1, "en"), TrackSelection::new(2, "ru")]
    }

    fn default_subs() -> Vec<TrackSelection> {
        vec![TrackSelection::new(1, "ru")]
    }

    #[test]
    fn test_merge_cmd_basic() {
        let audio = default_audio();
        let subs = default_subs();
        let cmd = synthesizer(None, false)
            .merge_cmd(
                &disc(),
                &MergeRequest {
                    title_idx: 1,
                    audio: &audio,
                    audio_explicit: false,
                    subs: &subs,
                    outdir: Path::new("/out"),
                },
            )
            .unwrap();

        assert_eq!(
            cmd,
            vec![
                "mkvmerge",
                "--output",
                "/out/TEST_DVD_1.DVDRemux.mkv",
                "--language",
                "1:en",
                "--language",
                "2:ru",
                "/tmp/work/TEST_DVD_1_video.vob",
                "--language",
                "0:ru",
                "/tmp/work/TEST_DVD_1_vobsub_1_ru.idx",
                "--chapters",
                "/tmp/work/TEST_DVD_1_chapters.txt",
                "--track-order",
                "0:0,0:1,0:2,1:0",
            ]
        );
    }

    #[test]
    fn test_merge_cmd_with_aspect_ratio() {
        let audio = default_audio();
        let subs = default_subs();
        let cmd = synthesizer(Some("16/9"), false)
            .merge_cmd(
                &disc(),
                &MergeRequest {
                    title_idx: 1,
                    audio: &audio,
                    audio_explicit: false,
                    subs: &subs,
                    outdir: Path::new("/out"),
                },
            )
            .unwrap();

        let aspect_pos = cmd.iter().position(|a| a == "--aspect-ratio").unwrap();
        assert_eq!(cmd[aspect_pos + 1], "0:16/9");
        // The aspect directive sits between the audio tags and the stream file.
        assert_eq!(cmd[aspect_pos + 2], "/tmp/work/TEST_DVD_1_video.vob");
    }

    #[test]
    fn test_merge_cmd_with_split_chapters() {
        let audio = default_audio();
        let subs = default_subs();
        let cmd = synthesizer(None, true)
            .merge_cmd(
                &disc(),
                &MergeRequest {
                    title_idx: 1,
                    audio: &audio,
                    audio_explicit: false,
                    subs: &subs,
                    outdir: Path::new("/out"),
                },
            )
            .unwrap();

        let split_pos = cmd.iter().position(|a| a == "--split").unwrap();
        assert_eq!(cmd[split_pos + 1], "chapters:all");
        assert_eq!(cmd[split_pos + 2], "--track-order");
    }

    #[test]
    fn test_merge_cmd_explicit_audio_restricts_and_reorders() {
        let audio = vec![TrackSelection::new(2, "ru"), TrackSelection::new(1, "en")];
        let subs = default_subs();
        let cmd = synthesizer(None, false)
            .merge_cmd(
                &disc(),
                &MergeRequest {
                    title_idx: 1,
                    audio: &audio,
                    audio_explicit: true,
                    subs: &subs,
                    outdir: Path::new("/out"),
                },
            )
            .unwrap();

        assert_eq!(
            cmd,
            vec![
                "mkvmerge",
                "--output",
                "/out/TEST_DVD_1.DVDRemux.mkv",
                "--language",
                "2:ru",
                "--language",
                "1:en",
                "--audio-tracks",
                "2,1",
                "/tmp/work/TEST_DVD_1_video.vob",
                "--language",
                "0:ru",
                "/tmp/work/TEST_DVD_1_vobsub_1_ru.idx",
                "--chapters",
                "/tmp/work/TEST_DVD_1_chapters.txt",
                "--track-order",
                "0:0,0:2,0:1,1:0",
            ]
        );
    }

    #[test]
    fn test_merge_cmd_no_chapters_directive_for_single_chapter() {
        let mut disc = disc();
        disc.track[0].chapter.clear();

        let audio = default_audio();
        let subs = default_subs();
        let cmd = synthesizer(None, false)
            .merge_cmd(
                &disc,
                &MergeRequest {
                    title_idx: 1,
                    audio: &audio,
                    audio_explicit: false,
                    subs: &subs,
                    outdir: Path::new("/out"),
                },
            )
            .unwrap();

        assert!(!cmd.iter().any(|a| a == "--chapters"));
    }

    #[test]
    fn test_dumpstream_cmd() {
        let synth = synthesizer(None, false);
        let cmd = synth.dumpstream_cmd(1, synth.tmp_dir());
        assert_eq!(
            cmd,
            vec![
                "mplayer",
                "-dvd-device",
                ".",
                "dvd://1",
                "-dumpstream",
                "-dumpfile",
                "/tmp/work/TEST_DVD_1_video.vob",
            ]
        );
    }

    #[test]
    fn test_dumpvobsub_cmd() {
        let synth = synthesizer(None, false);
        let (base, idx, sub) = synth.vobsub_filenames(1, 2, "fr", Path::new("/tmp/work"));
        assert_eq!(base, PathBuf::from("/tmp/work/TEST_DVD_1_vobsub_2_fr"));
        assert_eq!(idx, PathBuf::from("/tmp/work/TEST_DVD_1_vobsub_2_fr.idx"));
        assert_eq!(sub, PathBuf::from("/tmp/work/TEST_DVD_1_vobsub_2_fr.sub"));

        let cmd = synth.dumpvobsub_cmd(1, 2, &base);
        assert_eq!(
            cmd,
            vec![
                "mencoder",
                "-dvd-device",
                ".",
                "dvd://1",
                "-vobsubout",
                "/tmp/work/TEST_DVD_1_vobsub_2_fr",
                "-vobsuboutindex",
                "2",
                "-sid",
                "1",
                "-ovc",
                "copy",
                "-oac",
                "copy",
                "-nosound",
                "-o",
                "/dev/null",
                "-vf",
                "harddup",
            ]
        );
    }

    #[test]
    fn test_chapter_text_golden() {
        let expected = "CHAPTER01=00:00:00.000\n\
                        CHAPTER01NAME=\n\
                        CHAPTER02=00:01:40.880\n\
                        CHAPTER02NAME=\n\
                        CHAPTER03=00:02:50.040\n\
                        CHAPTER03NAME=\n";

        let text = synthesizer(None, false)
            .chapter_text(&disc(), 1)
            .unwrap()
            .unwrap();
        assert_eq!(text, expected);
    }

    #[test]
    fn test_chapter_text_is_deterministic() {
        let synth = synthesizer(None, false);
        let disc = disc();
        let first = synth.chapter_text(&disc, 1).unwrap();
        let second = synth.chapter_text(&disc, 1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_chapter_text_absent_for_single_chapter() {
        let mut disc = disc();
        assert!(synthesizer(None, false)
            .chapter_text(&disc, 2)
            .unwrap()
            .is_none());

        disc.track[0].chapter.truncate(1);
        assert!(synthesizer(None, false)
            .chapter_text(&disc, 1)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_convert_seconds_to_hhmmss() {
        assert_eq!(
            convert_seconds_to_hhmmss((3600 + 23 * 60 + 45) as f64),
            "01:23:45.000"
        );
        assert_eq!(convert_seconds_to_hhmmss(0.0), "00:00:00.000");
        assert_eq!(convert_seconds_to_hhmmss(100.88), "00:01:40.880");
    }

    #[test]
    fn test_convert_seconds_truncates_sub_millisecond_precision() {
        assert_eq!(convert_seconds_to_hhmmss(1.0005), "00:00:01.000");
        assert_eq!(convert_seconds_to_hhmmss(1.0009), "00:00:01.000");
        assert_eq!(convert_seconds_to_hhmmss(1.001), "00:00:01.001");
    }

    #[test]
    fn test_fix_vobsub_lang_id_patches_every_line() {
        let content = "# VobSub index file\n\
                       id: , index: 0\n\
                       timestamp: 00:00:01:000\n\
                       id: , index: 1\n";

        let fixed = fix_vobsub_lang_id(content, "ru");
        assert_eq!(
            fixed,
            "# VobSub index file\n\
             id: ru, index: 0\n\
             timestamp: 00:00:01:000\n\
             id: ru, index: 1\n"
        );
    }

    #[test]
    fn test_fix_vobsub_lang_id_leaves_tagged_lines() {
        let content = "id: en, index: 0\n";
        assert_eq!(fix_vobsub_lang_id(content, "ru"), content);
    }
}
