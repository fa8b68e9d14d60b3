pub mod command;
pub mod orchestrator;
pub mod service;

pub use command::{
    convert_seconds_to_hhmmss, fix_vobsub_lang_id, CommandSynthesizer, MergeRequest,
    TrackSelection,
};
pub use orchestrator::{RemuxOptions, Remuxer};
pub use service::{Action, RemuxService};
