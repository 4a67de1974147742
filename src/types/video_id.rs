use std::{fmt::Display, str::FromStr};

use crate::result::{Error, Result};

/// Number of characters of a video ID
pub const VIDEO_ID_LEN: usize = 11;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Opaque identifier of a video on the platform.
///
/// Always exactly [`VIDEO_ID_LEN`] characters of `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let valid_shape = raw.len() == VIDEO_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

        if valid_shape {
            Ok(Self(raw.to_owned()))
        } else {
            Err(Error::InvalidIdentifier(raw.to_owned()))
        }
    }

    /// The watch page URL of the video
    pub fn url(&self) -> String {
        format!("{WATCH_URL}{}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VideoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
