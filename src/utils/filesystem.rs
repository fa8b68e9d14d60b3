use crate::utils::Result;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Dry-run-aware filesystem primitives.
///
/// Every mutating operation consults the dry-run flag first and logs the
/// action instead of performing it, so a dry run leaves the disk untouched
/// while the callers still see the same paths a real run would produce.
#[derive(Debug, Clone)]
pub struct FsOps {
    dry_run: bool,
}

impl FsOps {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        if self.dry_run {
            info!("dry-run: write {}", path.display());
            return Ok(());
        }

        fs::write(path, text)?;
        Ok(())
    }

    pub fn truncate(&self, path: &Path) -> Result<()> {
        if self.dry_run {
            info!("dry-run: truncate {}", path.display());
            return Ok(());
        }

        fs::File::create(path)?;
        Ok(())
    }

    pub fn remove_file(&self, path: &Path) -> Result<()> {
        if self.dry_run {
            info!("dry-run: remove {}", path.display());
            return Ok(());
        }

        fs::remove_file(path)?;
        Ok(())
    }

    /// Deletes `path` when it exists with a size of zero bytes. Used to clean
    /// up after a multiplexer run that failed leaving an empty output file.
    pub fn remove_if_empty(&self, path: &Path) {
        if self.dry_run {
            return;
        }

        match fs::metadata(path) {
            Ok(meta) if meta.len() == 0 => {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Could not remove empty file {}: {}", path.display(), e);
                }
            }
            Ok(_) => {}
            Err(_) => {}
        }
    }
}
