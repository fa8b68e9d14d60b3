use crate::utils::{Error, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Executes synthesized argument vectors, one process at a time.
///
/// In dry-run mode the command line is printed instead of executed; callers
/// still receive `Ok(())` so the surrounding pipeline shape stays identical.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    dry_run: bool,
}

impl ToolRunner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn run(&self, argv: &[String], quiet: bool) -> Result<()> {
        let rendered = argv.join(" ");

        if self.dry_run {
            info!("dry-run: {}", rendered);
            return Ok(());
        }

        debug!("Running: {}", rendered);

        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::tool("Empty command vector"))?;

        let mut command = Command::new(program);
        command.args(args);

        if quiet {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let status = command
            .status()
            .await
            .map_err(|e| Error::tool(format!("Failed to spawn {}: {}", program, e)))?;

        if !status.success() {
            error!("{} failed with exit status: {}", program, status);
            return Err(Error::tool(format!(
                "{} failed with exit status {}",
                program, status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_skips_execution() {
        let runner = ToolRunner::new(true);
        // A program that does not exist must still succeed in dry-run mode.
        let argv = vec!["definitely-not-a-real-binary".to_string()];
        assert!(runner.run(&argv, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        let runner = ToolRunner::new(false);
        assert!(runner.run(&[], false).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_reports_tool_error() {
        let runner = ToolRunner::new(false);
        let argv = vec!["definitely-not-a-real-binary".to_string()];
        match runner.run(&argv, true).await {
            Err(Error::Tool { .. }) => {}
            other => panic!("expected tool error, got {:?}", other.err()),
        }
    }
}
