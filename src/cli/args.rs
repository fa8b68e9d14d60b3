use crate::lang::UNDEFINED_SENTINEL;
use crate::remux::command::TrackSelection;
use crate::remux::service::Action;
use crate::utils::{Error, Result};
use clap::Parser;
use std::path::PathBuf;

/// Title indices parsed from the `1-3,5,7` range grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleList(pub Vec<usize>);

/// Track selections parsed from the `2:ru,1,3:en` grammar. A selection
/// without a language code carries the `undefined` sentinel, meaning "use
/// the disc's own code for this track".
#[derive(Debug, Clone, PartialEq)]
pub struct TrackParams(pub Vec<TrackSelection>);

#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(name = "dvd-remuxer")]
#[command(about = "DVD title remuxing automation driving lsdvd, mplayer, mencoder and mkvmerge")]
#[command(long_about = "
Remuxes DVD titles into Matroska files without re-encoding: the elementary
stream is dumped with mplayer, VobSub subtitles are extracted with mencoder,
and everything is merged with mkvmerge using the layout lsdvd reports.

EXAMPLES:
  # Remux the longest title of the disc in the current directory
  dvd-remuxer /dev/dvd

  # Remux titles 1 to 3 and 5 with a fixed audio order
  dvd-remuxer --dvd-title 1-3,5 --audio 2:ru,1 /path/to/VIDEO_TS

  # Only dump chapter files for all titles
  dvd-remuxer --all --action chapters disc.iso

Utility programs: lsdvd, mplayer, mencoder, mkvmerge
")]
pub struct CliArgs {
    /// Directory with VIDEO_TS, ISO image or DVD device
    #[arg(value_name = "PATH")]
    pub dvd: PathBuf,

    /// Title(s) to process, e.g. '1', '1,2,3', '1-5', '1-3,5,7,10-12'
    #[arg(long = "dvd-title", value_name = "TITLES", value_parser = parse_title_list)]
    pub title_idx: Option<TitleList>,

    /// Process all playable titles
    #[arg(long = "all")]
    pub all_titles: bool,

    /// One of the actions (default: remux_to_mkv)
    #[arg(long, value_enum, default_value = "remux_to_mkv")]
    pub action: Action,

    /// Audio id with optional langcode in the wanted order (e.g. 2:ru,1,3:en)
    #[arg(long, value_name = "AUDIO_ID[:LANGCODE],...", value_parser = parse_track_params)]
    pub audio: Option<TrackParams>,

    /// Subtitle id with optional langcode in the wanted order (e.g. 2:ru,1)
    #[arg(long, value_name = "SUB_ID[:LANGCODE],...", value_parser = parse_track_params)]
    pub subs: Option<TrackParams>,

    /// Keep additional subtitle languages besides the configured defaults
    #[arg(long, value_name = "LANGCODE", value_delimiter = ',')]
    pub add_sub_langcode: Option<Vec<String>>,

    /// Video aspect ratio override: 16/9, 4/3
    #[arg(long, value_name = "RATIO")]
    pub aspect_ratio: Option<String>,

    /// Split the output video by chapters
    #[arg(long)]
    pub split_chapters: bool,

    /// Show DVD info and exit
    #[arg(long)]
    pub info: bool,

    /// Store temp files in a managed system temp directory
    #[arg(long)]
    pub use_sys_tmp_dir: bool,

    /// Keep temp files (has no effect with --use-sys-tmp-dir)
    #[arg(long)]
    pub keep: bool,

    /// Rewrite existing dump files
    #[arg(long)]
    pub rewrite: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print the commands that would be executed
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file path
    #[arg(long, default_value = "dvd-remuxer.yaml", value_name = "FILE")]
    pub config: PathBuf,
}

impl CliArgs {
    pub fn device_string(&self) -> String {
        self.dvd.to_string_lossy().to_string()
    }

    pub fn get_log_level<'a>(&self, config_level: &'a str) -> &'a str {
        if self.verbose {
            "debug"
        } else {
            config_level
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dvd.exists() {
            return Err(Error::validation(format!(
                "The path {} does not exist",
                self.dvd.display()
            )));
        }

        Ok(())
    }
}

fn parse_title_list(input: &str) -> std::result::Result<TitleList, String> {
    let mut titles = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if let Some((start, stop)) = part.split_once('-') {
            let start: usize = start
                .trim()
                .parse()
                .map_err(|_| format!("invalid title range '{}'", part))?;
            let stop: usize = stop
                .trim()
                .parse()
                .map_err(|_| format!("invalid title range '{}'", part))?;
            if stop < start {
                return Err(format!("invalid title range '{}'", part));
            }
            titles.extend(start..=stop);
        } else {
            titles.push(
                part.parse()
                    .map_err(|_| format!("invalid title index '{}'", part))?,
            );
        }
    }

    Ok(TitleList(titles))
}

fn parse_track_params(input: &str) -> std::result::Result<TrackParams, String> {
    let mut params = Vec::new();

    for item in input.split(',') {
        let item = item.trim();
        let (ix, langcode) = match item.split_once(':') {
            Some((ix, langcode)) => (ix, langcode),
            None => (item, UNDEFINED_SENTINEL),
        };

        let ix: usize = ix
            .trim()
            .parse()
            .map_err(|_| format!("invalid track id '{}'", item))?;
        // Track ids are 1-based everywhere, exactly as lsdvd reports them.
        if ix == 0 {
            return Err(format!("invalid track id '{}': track ids start at 1", item));
        }

        params.push(TrackSelection::new(ix, langcode.trim()));
    }

    Ok(TrackParams(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_title_list_single_and_ranges() {
        assert_eq!(parse_title_list("1").unwrap(), TitleList(vec![1]));
        assert_eq!(parse_title_list("1,2,3").unwrap(), TitleList(vec![1, 2, 3]));
        assert_eq!(
            parse_title_list("1-3,5,7,10-12").unwrap(),
            TitleList(vec![1, 2, 3, 5, 7, 10, 11, 12])
        );
    }

    #[test]
    fn test_parse_title_list_rejects_garbage() {
        assert!(parse_title_list("a").is_err());
        assert!(parse_title_list("3-1").is_err());
        assert!(parse_title_list("1,").is_err());
    }

    #[test]
    fn test_parse_track_params() {
        assert_eq!(
            parse_track_params("2:ru,1,3:en").unwrap(),
            TrackParams(vec![
                TrackSelection::new(2, "ru"),
                TrackSelection::new(1, "undefined"),
                TrackSelection::new(3, "en"),
            ])
        );
    }

    #[test]
    fn test_parse_track_params_rejects_garbage() {
        assert!(parse_track_params("x:ru").is_err());
        assert!(parse_track_params("").is_err());
    }

    #[test]
    fn test_parse_track_params_rejects_zero_index() {
        // Index 0 would address a track that cannot exist and underflow the
        // 0-based conversion downstream.
        assert!(parse_track_params("0:ru").is_err());
        assert!(parse_track_params("0").is_err());
        assert!(parse_track_params("1,0:en").is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = CliArgs::parse_from(["dvd-remuxer", "."]);
        assert_eq!(args.action, Action::RemuxToMkv);
        assert!(!args.dry_run);
        assert!(args.title_idx.is_none());
        assert!(args.audio.is_none());
    }

    #[test]
    fn test_args_action_names_are_snake_case() {
        let args = CliArgs::parse_from(["dvd-remuxer", "--action", "remux_to_mkv", "."]);
        assert_eq!(args.action, Action::RemuxToMkv);
        let args = CliArgs::parse_from(["dvd-remuxer", "--action", "chapters", "."]);
        assert_eq!(args.action, Action::Chapters);
    }

    #[test]
    fn test_args_add_sub_langcode_is_comma_separated() {
        let args = CliArgs::parse_from(["dvd-remuxer", "--add-sub-langcode", "fr,de", "."]);
        assert_eq!(
            args.add_sub_langcode,
            Some(vec!["fr".to_string(), "de".to_string()])
        );
    }

    #[test]
    fn test_validate_missing_path() {
        let args = CliArgs::parse_from(["dvd-remuxer", "/definitely/not/here"]);
        assert!(args.validate().is_err());
    }
}
