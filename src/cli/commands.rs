use crate::{cli::CliArgs, config::Config, disc::LsdvdTool, utils::Result};

/// Handles commands that consume the whole run. Returns `Ok(true)` when one
/// of them ran and nothing else should happen.
pub async fn handle_commands(args: &CliArgs, config: &Config) -> Result<bool> {
    if args.info {
        let lsdvd = LsdvdTool::new(config.tools.lsdvd.clone());
        lsdvd.print_disc_info(&args.device_string()).await?;
        return Ok(true);
    }

    Ok(false)
}
