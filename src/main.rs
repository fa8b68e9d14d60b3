use clap::Parser;
use tracing::debug;

use dvd_remuxer::{
    cli::{handle_commands, CliArgs},
    config::Config,
    disc::LsdvdTool,
    remux::RemuxService,
    utils::{setup_logging, Result},
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    args.validate()?;

    let config = Config::load_with_fallback(&args.config)?;

    setup_logging(
        args.get_log_level(&config.logging.level),
        config.logging.show_timestamps,
        config.logging.colored_output,
    )?;

    debug!("Run with arguments: {:?}", args);

    if handle_commands(&args, &config).await? {
        return Ok(());
    }

    let lsdvd = LsdvdTool::new(config.tools.lsdvd.clone());
    let disc = lsdvd.read(&args.device_string()).await?;

    let service = RemuxService::new(disc, config, args)?;
    service.run().await
}
