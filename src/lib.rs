pub mod cli;
pub mod config;
pub mod disc;
pub mod lang;
pub mod remux;
pub mod utils;

pub use config::Config;
pub use disc::{parse_disc_info, DiscInfo, LsdvdTool, Title};
pub use lang::{resolve_langcode, TrackKind};
pub use remux::{Action, CommandSynthesizer, MergeRequest, RemuxService, Remuxer, TrackSelection};
pub use utils::{setup_logging, Error, FsOps, Result, ToolRunner};
