//! Action dispatch and per-title batch driving.

use crate::cli::CliArgs;
use crate::config::Config;
use crate::disc::DiscInfo;
use crate::lang::{resolve_langcode, TrackKind};
use crate::remux::command::TrackSelection;
use crate::remux::orchestrator::{RemuxOptions, Remuxer};
use crate::utils::{Error, Result};
use std::path::PathBuf;
use tracing::{error, info};

/// The closed set of things a session can do. Dump-only actions reuse the
/// remux pipeline's per-artifact builders without the merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Action {
    RemuxToMkv,
    Stream,
    Subs,
    Chapters,
}

/// Ties the parsed disc, the configuration and the caller's selections
/// together and runs the requested action over every selected title.
pub struct RemuxService {
    disc: DiscInfo,
    config: Config,
    args: CliArgs,
    /// Subtitle languages kept when no explicit subtitle selection is given.
    langcodes: Vec<String>,
    outdir: PathBuf,
}

impl RemuxService {
    pub fn new(disc: DiscInfo, config: Config, args: CliArgs) -> Result<Self> {
        let mut langcodes = config.remux.sub_langcodes.clone();
        if let Some(extra) = &args.add_sub_langcode {
            langcodes.extend(extra.iter().cloned());
        }

        let outdir = std::env::current_dir()?;

        Ok(Self {
            disc,
            config,
            args,
            langcodes,
            outdir,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let options = RemuxOptions {
            dry_run: self.args.dry_run,
            keep_temp_files: self.args.keep,
            rewrite: self.args.rewrite,
            use_sys_tmp_dir: self.args.use_sys_tmp_dir,
            aspect_ratio: self.args.aspect_ratio.clone(),
            split_chapters: self.args.split_chapters,
            work_dir: self.outdir.clone(),
        };

        let mut remuxer = Remuxer::new(
            &self.disc,
            self.args.device_string(),
            self.config.tools.clone(),
            options,
        )?;

        let titles = self.select_titles();
        let mut successful = 0usize;
        let mut failed: Vec<(usize, String)> = Vec::new();

        // One title fully processed before the next; a failing title never
        // takes the rest of the batch down with it.
        for title_idx in &titles {
            match self.run_action(&mut remuxer, *title_idx).await {
                Ok(()) => successful += 1,
                Err(e) => {
                    error!("title #{} failed: {}", title_idx, e);
                    failed.push((*title_idx, e.to_string()));
                }
            }
        }

        if titles.len() > 1 {
            info!(
                "Processing complete: {} successful, {} failed",
                successful,
                failed.len()
            );
            for (title_idx, message) in &failed {
                info!("  - title #{}: {}", title_idx, message);
            }
        }

        if successful == 0 && !failed.is_empty() {
            return Err(Error::tool("All requested titles failed"));
        }

        Ok(())
    }

    async fn run_action(&self, remuxer: &mut Remuxer<'_>, title_idx: usize) -> Result<()> {
        match self.args.action {
            Action::RemuxToMkv => {
                let audio = self.audio_params(title_idx)?;
                let subs = self.subs_params(title_idx)?;
                remuxer
                    .remux_to_mkv(
                        title_idx,
                        &audio,
                        self.args.audio.is_some(),
                        &subs,
                        &self.outdir,
                    )
                    .await?;
            }
            Action::Stream => {
                remuxer.dump_stream(title_idx, &self.outdir).await?;
            }
            Action::Subs => {
                remuxer
                    .dump_vobsubs(title_idx, &self.outdir, &self.langcodes)
                    .await?;
            }
            Action::Chapters => {
                remuxer.dump_chapters(title_idx, &self.outdir)?;
            }
        }

        Ok(())
    }

    /// Explicit titles win; `--all` selects every playable title; otherwise
    /// the source-reported longest title is used.
    fn select_titles(&self) -> Vec<usize> {
        if let Some(titles) = &self.args.title_idx {
            return titles.0.clone();
        }

        if self.args.all_titles {
            info!("Remuxing all titles");
            return self.disc.all_playable_title_indices();
        }

        let longest = self.disc.longest_title_index();
        info!("No titles specified. Using longest title #{}", longest);
        vec![longest]
    }

    /// Explicit audio selection, or every audio track of the title. Either
    /// way the language codes go through the resolver right here, just
    /// before they reach any command.
    fn audio_params(&self, title_idx: usize) -> Result<Vec<TrackSelection>> {
        let raw: Vec<TrackSelection> = match &self.args.audio {
            Some(params) => params.0.clone(),
            None => self
                .disc
                .title(title_idx)?
                .audio
                .iter()
                .map(|a| TrackSelection::new(a.ix, a.langcode.clone()))
                .collect(),
        };

        Ok(self.normalize(raw, TrackKind::Audio, title_idx))
    }

    /// Explicit subtitle selection, or the title's subtitles whose raw disc
    /// code is in the kept-language set.
    fn subs_params(&self, title_idx: usize) -> Result<Vec<TrackSelection>> {
        let raw: Vec<TrackSelection> = match &self.args.subs {
            Some(params) => params.0.clone(),
            None => self
                .disc
                .title(title_idx)?
                .subp
                .iter()
                .filter(|s| self.langcodes.contains(&s.langcode))
                .map(|s| TrackSelection::new(s.ix, s.langcode.clone()))
                .collect(),
        };

        Ok(self.normalize(raw, TrackKind::Subtitle, title_idx))
    }

    fn normalize(
        &self,
        selections: Vec<TrackSelection>,
        kind: TrackKind,
        title_idx: usize,
    ) -> Vec<TrackSelection> {
        selections
            .into_iter()
            .map(|s| {
                let langcode = resolve_langcode(&self.disc, kind, title_idx, s.ix, &s.langcode);
                TrackSelection::new(s.ix, langcode)
            })
            .collect()
    }
}
