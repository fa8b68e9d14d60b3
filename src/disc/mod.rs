pub mod model;
pub mod parser;
pub mod reader;

pub use model::{AudioTrack, Chapter, DiscInfo, SubtitleTrack, Title};
pub use parser::parse_disc_info;
pub use reader::LsdvdTool;
