use crate::disc::model::DiscInfo;
use crate::disc::parser::parse_disc_info;
use crate::utils::{Error, Result};
use tokio::process::Command;
use tracing::{debug, warn};

/// Collaborator wrapping the lsdvd binary.
///
/// The disc is read exactly once per session; everything downstream works on
/// the parsed [`DiscInfo`].
#[derive(Debug, Clone)]
pub struct LsdvdTool {
    path: String,
}

impl LsdvdTool {
    pub fn new(path: String) -> Self {
        Self { path }
    }

    /// Reads and parses the disc layout from `device`.
    pub async fn read(&self, device: &str) -> Result<DiscInfo> {
        let output = self.read_output(device).await?;
        parse_disc_info(&output)
    }

    /// Raw `lsdvd -x -Oy` output. The exit status is not authoritative here;
    /// the literal parser decides whether the dump is usable.
    pub async fn read_output(&self, device: &str) -> Result<String> {
        debug!("Reading disc info: {} -x -Oy {}", self.path, device);

        let output = Command::new(&self.path)
            .args(["-x", "-Oy", device])
            .output()
            .await
            .map_err(|e| Error::tool(format!("Failed to run {}: {}", self.path, e)))?;

        if !output.status.success() {
            warn!("lsdvd exited with status {}", output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Prints the human-readable `lsdvd -x` report straight to the terminal.
    pub async fn print_disc_info(&self, device: &str) -> Result<()> {
        let status = Command::new(&self.path)
            .args(["-x", device])
            .status()
            .await
            .map_err(|e| Error::tool(format!("Failed to run {}: {}", self.path, e)))?;

        if !status.success() {
            return Err(Error::tool(format!(
                "{} failed with exit status {}",
                self.path, status
            )));
        }

        Ok(())
    }
}
