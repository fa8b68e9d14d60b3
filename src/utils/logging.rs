use crate::utils::Result;
use tracing_subscriber::EnvFilter;

pub fn setup_logging(level: &str, show_timestamps: bool, colored_output: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(colored_output);

    if show_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }

    Ok(())
}
