use std::{fmt::Display, path::PathBuf};

use miette::miette;

#[derive(Debug)]
pub enum Error {
    /// The token does not have the shape of a video ID
    InvalidIdentifier(String),

    /// The token does not have the shape of a language code
    InvalidLanguage(String),

    /// The minimum wait is above the maximum one (or one of them is not a valid duration)
    InvalidRange { min: f64, max: f64 },

    /// Invalid option or option combination, detected before any work started
    Configuration(String),

    /// The channel videos could not be listed
    ListingUnavailable(String),

    /// The cache file exists but could not be read
    CacheCorrupt(PathBuf),

    /// The output directory could not be created or scanned
    OutputDirUnavailable(PathBuf),

    /// The download of one video failed
    DownloadFailed(String),

    /// The plain-text conversion of a downloaded track failed
    CleanupFailed(String),

    /// The user asked to stop
    Cancelled,

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Miette(miette::Report::msg(err.to_string()))
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidIdentifier(raw) => miette!("Invalid video ID: {raw:?}"),
            Error::InvalidLanguage(raw) => miette!("Invalid language code: {raw:?}"),
            Error::InvalidRange { min, max } => {
                miette!("Invalid wait range: min ({min}) must be <= max ({max}) and both >= 0")
            }
            Error::Configuration(msg) => miette!("Configuration error: {msg}"),
            Error::ListingUnavailable(msg) => miette!("Could not list the channel videos: {msg}"),
            Error::CacheCorrupt(path) => miette!("Could not read cache file {}", path.display()),
            Error::OutputDirUnavailable(path) => {
                miette!("Output directory {} is unavailable", path.display())
            }
            Error::DownloadFailed(msg) => miette!("Download failed: {msg}"),
            Error::CleanupFailed(msg) => miette!("Text cleanup failed: {msg}"),
            Error::Cancelled => miette!("Cancelled by the user"),
            Error::Miette(err) => err,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Miette(report) => write!(f, "{report}"),
            Error::InvalidIdentifier(raw) => write!(f, "invalid video ID {raw:?}"),
            Error::InvalidLanguage(raw) => write!(f, "invalid language code {raw:?}"),
            Error::InvalidRange { min, max } => write!(f, "invalid wait range [{min}, {max}]"),
            Error::Configuration(msg) => write!(f, "{msg}"),
            Error::ListingUnavailable(msg) => write!(f, "listing unavailable: {msg}"),
            Error::CacheCorrupt(path) => write!(f, "cache {} unreadable", path.display()),
            Error::OutputDirUnavailable(path) => {
                write!(f, "output directory {} unavailable", path.display())
            }
            Error::DownloadFailed(msg) => write!(f, "{msg}"),
            Error::CleanupFailed(msg) => write!(f, "{msg}"),
            Error::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Return early with a plain message error
pub fn bail<T, D>(msg: D) -> Result<T>
where
    D: Display + std::fmt::Debug + Send + Sync + 'static,
{
    Err(Error::Miette(miette::Report::msg(msg)))
}
