mod command;
mod ytdl;

pub use command::{assert_success_command, run_command, run_command_cancellable, Capture};
pub use ytdl::{FetchResult, SubtitleFetcher, VideoSource, Ytdl};
