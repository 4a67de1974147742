use super::VideoId;

/// Title used when the real one could not be retrieved or is empty after sanitization
pub const UNKNOWN_TITLE: &str = "UnknownTitle";

/// Metadata of a video, only fetched when a filename must be generated
#[derive(Debug, Clone)]
pub struct VideoRecord {
    pub id: VideoId,
    pub title: String,
    pub duration: Option<u64>,
    pub channel: Option<String>,
}

impl VideoRecord {
    /// Placeholder record for when the metadata lookup failed
    pub fn untitled(id: VideoId) -> Self {
        Self {
            id,
            title: UNKNOWN_TITLE.to_owned(),
            duration: None,
            channel: None,
        }
    }
}
