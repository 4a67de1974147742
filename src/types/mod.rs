mod language;
mod metadata;
mod outcome;
mod progress;
mod video_id;

pub use language::{LanguageCode, LanguagePreferences};
pub use metadata::{VideoRecord, UNKNOWN_TITLE};
pub use outcome::{FailureReason, SkipReason, SubtitleOutcome};
pub use progress::DownloadProgress;
pub use video_id::{VideoId, VIDEO_ID_LEN};
