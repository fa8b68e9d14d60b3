//! Per-title remux pipeline and temp-file lifecycle.

use crate::config::ToolsConfig;
use crate::disc::DiscInfo;
use crate::remux::command::{
    convert_seconds_to_hhmmss, fix_vobsub_lang_id, CommandSynthesizer, MergeRequest,
    TrackSelection,
};
use crate::utils::{FsOps, Result, ToolRunner};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct RemuxOptions {
    pub dry_run: bool,
    pub keep_temp_files: bool,
    pub rewrite: bool,
    pub use_sys_tmp_dir: bool,
    pub aspect_ratio: Option<String>,
    pub split_chapters: bool,
    /// Where intermediate files live when no system temp directory is used.
    pub work_dir: PathBuf,
}

/// Drives one remux per requested title: dump the stream, extract the
/// selected subtitles, synthesize chapters, merge, clean up.
///
/// Execution is strictly sequential; the optical source does not tolerate
/// concurrent readers. The temp-file list is append-only and drained only by
/// [`Remuxer::remove_temp_files`].
pub struct Remuxer<'a> {
    disc: &'a DiscInfo,
    synthesizer: CommandSynthesizer,
    runner: ToolRunner,
    fsops: FsOps,
    keep_temp_files: bool,
    rewrite: bool,
    tmp_dir: PathBuf,
    // Owning the guard keeps the directory alive; dropping it removes the
    // directory and everything inside.
    tmp_dir_guard: Option<TempDir>,
    temp_files: Vec<PathBuf>,
}

impl<'a> Remuxer<'a> {
    pub fn new(
        disc: &'a DiscInfo,
        device: String,
        tools: ToolsConfig,
        options: RemuxOptions,
    ) -> Result<Self> {
        let (tmp_dir_guard, tmp_dir) = if options.use_sys_tmp_dir {
            let guard = tempfile::Builder::new().prefix("dvdremux_").tempdir()?;
            let path = guard.path().to_path_buf();
            (Some(guard), path)
        } else {
            (None, options.work_dir.clone())
        };

        let synthesizer = CommandSynthesizer::new(
            device,
            disc.file_prefix().to_string(),
            tools,
            tmp_dir.clone(),
            options.aspect_ratio.clone(),
            options.split_chapters,
        );

        Ok(Self {
            disc,
            synthesizer,
            runner: ToolRunner::new(options.dry_run),
            fsops: FsOps::new(options.dry_run),
            keep_temp_files: options.keep_temp_files,
            rewrite: options.rewrite,
            tmp_dir,
            tmp_dir_guard,
            temp_files: Vec::new(),
        })
    }

    /// Full pipeline for one title. Returns the output file path (which, in
    /// dry-run mode, is where the file would have been written).
    pub async fn remux_to_mkv(
        &mut self,
        title_idx: usize,
        audio: &[TrackSelection],
        audio_explicit: bool,
        subs: &[TrackSelection],
        outdir: &Path,
    ) -> Result<PathBuf> {
        let title = self.disc.title(title_idx)?;
        info!(
            "remuxing title #{} ({})",
            title_idx,
            convert_seconds_to_hhmmss(title.length)
        );
        debug!("Temp directory: {}", self.tmp_dir.display());

        let outfile = self.synthesizer.output_filename(title_idx, outdir);

        // Built up front so an invalid selection fails before any tool runs.
        let merge_cmd = self.synthesizer.merge_cmd(
            self.disc,
            &MergeRequest {
                title_idx,
                audio,
                audio_explicit,
                subs,
                outdir,
            },
        )?;

        let tmp_dir = self.tmp_dir.clone();

        // Cleanup must run no matter where the pipeline stops: every dump
        // recorded so far stays on the temp list until the retention policy
        // says otherwise.
        let pipeline_result = self
            .run_pipeline(title_idx, subs, &tmp_dir, &merge_cmd)
            .await;

        if let Err(e) = &pipeline_result {
            error!("remux of title #{} failed: {}", title_idx, e);
        }

        // A failed merge can leave a zero-byte output behind; never keep it.
        self.fsops.remove_if_empty(&outfile);

        if !self.retains_temp_files() {
            info!("remove temp files");
            self.remove_temp_files();
        }

        pipeline_result?;
        Ok(outfile)
    }

    async fn run_pipeline(
        &mut self,
        title_idx: usize,
        subs: &[TrackSelection],
        tmp_dir: &Path,
        merge_cmd: &[String],
    ) -> Result<()> {
        let file_stream = self.dump_stream(title_idx, tmp_dir).await?;
        self.temp_files.push(file_stream);

        for sub in subs {
            let (idx_file, sub_file) = self
                .dump_vobsub(title_idx, sub.ix, &sub.langcode, tmp_dir)
                .await?;
            self.temp_files.push(idx_file);
            self.temp_files.push(sub_file);
        }

        if let Some(file_chapters) = self.dump_chapters(title_idx, tmp_dir)? {
            self.temp_files.push(file_chapters);
        }

        info!("merge tracks");
        self.runner.run(merge_cmd, false).await
    }

    /// Dumps the title's elementary stream. Skipped when the target already
    /// exists and rewrite was not requested.
    pub async fn dump_stream(&mut self, title_idx: usize, outdir: &Path) -> Result<PathBuf> {
        self.disc.title(title_idx)?;

        let outfile = self.synthesizer.stream_filename(title_idx, outdir);
        let dump_cmd = self.synthesizer.dumpstream_cmd(title_idx, outdir);

        if outfile.exists() && !self.rewrite {
            info!(
                "stream file exists, skipping dump: {} (use --rewrite to redo)",
                outfile.display()
            );
            return Ok(outfile);
        }

        info!("dump stream");
        self.runner.run(&dump_cmd, true).await?;

        Ok(outfile)
    }

    /// Extracts every subtitle track of the title whose disc-reported
    /// language is in the kept set.
    pub async fn dump_vobsubs(
        &mut self,
        title_idx: usize,
        outdir: &Path,
        kept_langcodes: &[String],
    ) -> Result<Vec<(PathBuf, PathBuf)>> {
        let subs: Vec<(usize, String)> = self
            .disc
            .title(title_idx)?
            .subp
            .iter()
            .filter(|s| kept_langcodes.contains(&s.langcode))
            .map(|s| (s.ix, s.langcode.clone()))
            .collect();

        let mut output_files = Vec::new();
        for (sub_idx, langcode) in subs {
            output_files.push(
                self.dump_vobsub(title_idx, sub_idx, &langcode, outdir)
                    .await?,
            );
        }

        Ok(output_files)
    }

    /// Extracts one VobSub track and patches the language tag the extractor
    /// leaves empty in the index sidecar.
    pub async fn dump_vobsub(
        &mut self,
        title_idx: usize,
        sub_idx: usize,
        langcode: &str,
        outdir: &Path,
    ) -> Result<(PathBuf, PathBuf)> {
        info!("extracting subtitle {} lang {}", sub_idx, langcode);

        let (basename, idx_file, sub_file) =
            self.synthesizer
                .vobsub_filenames(title_idx, sub_idx, langcode, outdir);

        if idx_file.exists() || sub_file.exists() {
            if self.rewrite {
                self.fsops.truncate(&idx_file)?;
                self.fsops.truncate(&sub_file)?;
            } else {
                info!(
                    "VobSub files exist, skipping extraction: {}, {} (use --rewrite to redo)",
                    idx_file.display(),
                    sub_file.display()
                );
                return Ok((idx_file, sub_file));
            }
        }

        let dump_cmd = self.synthesizer.dumpvobsub_cmd(title_idx, sub_idx, &basename);
        self.runner.run(&dump_cmd, true).await?;

        self.fix_vobsub_file(&idx_file, langcode)?;

        Ok((idx_file, sub_file))
    }

    /// Writes the chapter marker file for a title, or returns `None` for
    /// titles with one chapter at most.
    pub fn dump_chapters(&mut self, title_idx: usize, outdir: &Path) -> Result<Option<PathBuf>> {
        let Some(chapters) = self.synthesizer.chapter_text(self.disc, title_idx)? else {
            debug!("title {} has no chapters worth a marker file", title_idx);
            return Ok(None);
        };

        info!("dump chapters");
        let outfile = self.synthesizer.chapters_filename(title_idx, outdir);

        if outfile.exists() && !self.rewrite {
            info!(
                "chapter file exists, skipping: {} (use --rewrite to redo)",
                outfile.display()
            );
        } else {
            self.fsops.write_text(&outfile, &chapters)?;
        }

        Ok(Some(outfile))
    }

    fn fix_vobsub_file(&self, idx_file: &Path, langcode: &str) -> Result<()> {
        if self.runner.is_dry_run() {
            return Ok(());
        }

        let content = std::fs::read_to_string(idx_file)?;
        let patched = fix_vobsub_lang_id(&content, langcode);

        if patched != content {
            self.fsops.write_text(idx_file, &patched)?;
        }

        Ok(())
    }

    /// Temp files survive the session when the caller asked for them or when
    /// a managed temp directory owns them (its guard removes the whole
    /// directory on drop, so per-file deletion is not this component's job).
    pub fn retains_temp_files(&self) -> bool {
        self.keep_temp_files || self.tmp_dir_guard.is_some()
    }

    /// Best-effort removal of recorded temp files. A file that cannot be
    /// removed is reported and does not stop the rest of the cleanup.
    pub fn remove_temp_files(&mut self) {
        for file in self.temp_files.drain(..) {
            if let Err(e) = self.fsops.remove_file(&file) {
                warn!("Could not remove temp file {}: {}", file.display(), e);
            }
        }
    }

    #[cfg(test)]
    fn temp_files(&self) -> &[PathBuf] {
        &self.temp_files
    }
}
