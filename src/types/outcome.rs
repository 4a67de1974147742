use std::{fmt::Display, path::PathBuf};

use super::LanguageCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A subtitle for this video is already in the output directory
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Download(String),
    Cleanup(String),
    Cancelled,
}

/// Result of the handling of one video during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleOutcome {
    Downloaded {
        language: LanguageCode,
        path: PathBuf,
    },
    Skipped(SkipReason),
    /// None of the wanted languages is available for this video
    NotAvailable,
    Failed(FailureReason),
}

impl SubtitleOutcome {
    /// Whether this outcome counts as a failure in the statistics
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::NotAvailable | Self::Failed(_))
    }
}

impl Display for SubtitleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Downloaded { language, path } => {
                let name = path.file_name().unwrap_or(path.as_os_str());
                write!(f, "downloaded [{language}] {}", name.to_string_lossy())
            }
            Self::Skipped(SkipReason::AlreadyExists) => write!(f, "skipped (already downloaded)"),
            Self::NotAvailable => write!(f, "no subtitle in any wanted language"),
            Self::Failed(FailureReason::Download(msg)) => write!(f, "failed: {msg}"),
            Self::Failed(FailureReason::Cleanup(msg)) => write!(f, "cleanup failed: {msg}"),
            Self::Failed(FailureReason::Cancelled) => write!(f, "cancelled"),
        }
    }
}
