pub mod error;
pub mod filesystem;
pub mod logging;
pub mod tool_runner;

pub use error::{Error, Result};
pub use filesystem::FsOps;
pub use logging::setup_logging;
pub use tool_runner::ToolRunner;
