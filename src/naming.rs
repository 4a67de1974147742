use tracing::debug;

use crate::types::{LanguageCode, VideoId, UNKNOWN_TITLE};

/// Characters that are not allowed in filenames on at least one platform
const FORBIDDEN_CHARS: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Maximum number of characters kept from the video title
pub const MAX_TITLE_LEN: usize = 100;

/// Interface for naming the subtitle files in the output directory.
///
/// The video ID **must** appear in the name in a way the
/// output scanner can find it back, or videos will be downloaded again on every run.
pub trait FilenameGenerator {
    /// Generate the filename (without directory) of a subtitle.
    ///
    /// `index` is the 1-based position of the video in the channel listing.
    fn generate(
        &self,
        index: Option<usize>,
        video_id: &VideoId,
        title: &str,
        language: &LanguageCode,
        extension: &str,
    ) -> String;
}

/// `[NNNN_]<id>_<title>.<lang>.<ext>`
#[derive(Debug, Clone, Copy)]
pub struct ConventionalNames {
    numbering: bool,
}

impl ConventionalNames {
    pub fn new(numbering: bool) -> Self {
        Self { numbering }
    }
}

impl FilenameGenerator for ConventionalNames {
    fn generate(
        &self,
        index: Option<usize>,
        video_id: &VideoId,
        title: &str,
        language: &LanguageCode,
        extension: &str,
    ) -> String {
        let title = sanitize_title(title);
        let name = match index.filter(|_| self.numbering) {
            Some(index) => format!("{index:04}_{video_id}_{title}.{language}.{extension}"),
            None => format!("{video_id}_{title}.{language}.{extension}"),
        };

        debug!("Generated filename for {video_id}: {name}");
        name
    }
}

/// Remove the forbidden characters, trim and truncate the title
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect();
    let truncated: String = cleaned.trim().chars().take(MAX_TITLE_LEN).collect();
    let truncated = truncated.trim_end();

    if truncated.is_empty() {
        UNKNOWN_TITLE.to_owned()
    } else {
        truncated.to_owned()
    }
}
