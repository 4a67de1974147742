use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

use serde::Deserialize;
use tracing::{debug, warn};

use super::command::{
    assert_success_command, run_command_cancellable, Capture, YT_DL, YT_DLP,
};
use crate::{
    cancel::Cancellation,
    result::{Error, Result},
    types::{LanguageCode, VideoId, VideoRecord, UNKNOWN_TITLE},
};

/// Interface for discovering the videos of a channel and their metadata
pub trait VideoSource {
    /// Get the channel's video IDs, in the order given by the platform.
    ///
    /// Fail with [`Error::ListingUnavailable`] if the listing cannot be obtained.
    fn list_channel_videos(&self, channel_url: &str, cancel: &Cancellation)
        -> Result<Vec<VideoId>>;

    /// Get the video metadata
    fn get_metadata(&self, video_id: &VideoId, cancel: &Cancellation) -> Result<VideoRecord>;
}

/// What came out of a subtitle request for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The track was written at this path
    Downloaded(PathBuf),
    /// The video has no track in this language
    LanguageUnavailable,
}

/// Interface for downloading one subtitle track
pub trait SubtitleFetcher {
    /// Download the auto-generated track of the given language into `dest_dir`.
    ///
    /// Any other problem than the language being unavailable is an error,
    /// [`Error::Cancelled`] if `cancel` fired during the download.
    fn fetch_subtitle(
        &self,
        video_id: &VideoId,
        language: &LanguageCode,
        dest_dir: &Path,
        cancel: &Cancellation,
    ) -> Result<FetchResult>;
}

/// Interface for the [yt-dlp](https://github.com/yt-dlp/yt-dlp) program
#[derive(Debug, Clone)]
pub struct Ytdl {
    program: &'static str,
    cookies_from_browser: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    title: Option<String>,
    duration: Option<f64>,
    channel: Option<String>,
    uploader: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSubtitleInfo {
    ext: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDownloadInfo {
    requested_subtitles: Option<std::collections::HashMap<String, RawSubtitleInfo>>,
}

impl Ytdl {
    /// Verify that the `yt-dlp` or `youtube-dl` binaries are reachable
    pub fn new(cookies_from_browser: Option<String>) -> Result<Self> {
        let program = if assert_success_command(YT_DLP, |cmd| cmd.arg("--version")).is_ok() {
            YT_DLP
        } else if assert_success_command(YT_DL, |cmd| cmd.arg("--version")).is_ok() {
            YT_DL
        } else {
            return Err(Error::Configuration(format!(
                "Neither {YT_DLP} nor {YT_DL} could be found"
            )));
        };

        debug!("Using {program} as download tool");
        check_cookies_support(program, cookies_from_browser.as_deref())?;
        Ok(Self {
            program,
            cookies_from_browser,
        })
    }

    fn with_cookies<'c>(&self, cmd: &'c mut Command) -> &'c mut Command {
        match &self.cookies_from_browser {
            Some(browser) => cmd.args(["--cookies-from-browser", browser]),
            None => cmd,
        }
    }
}

/// Flat listing of a channel, one ID per line, understood by both tools
const LISTING_ARGS: [&str; 3] = ["-q", "--flat-playlist", "--get-id"];

/// Only `yt-dlp` can read the browser cookies
fn check_cookies_support(program: &str, cookies_from_browser: Option<&str>) -> Result<()> {
    match cookies_from_browser {
        Some(_) if program != YT_DLP => Err(Error::Configuration(format!(
            "--cookies-from-browser requires {YT_DLP}, only {program} was found"
        ))),
        _ => Ok(()),
    }
}

/// Options asking for the auto-generated track of one language.
/// `youtube-dl` only knows the singular spellings.
fn auto_subtitle_flags(program: &str) -> [&'static str; 2] {
    if program == YT_DLP {
        ["--write-auto-subs", "--sub-langs"]
    } else {
        ["--write-auto-sub", "--sub-lang"]
    }
}

/// The most relevant line of the tool's stderr
fn error_summary(stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    stderr
        .lines()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().find(|line| !line.trim().is_empty()))
        .map(|line| line.trim().to_owned())
        .unwrap_or_else(|| "no error output".to_owned())
}

/// The tool prints one JSON object per line, the last one is the wanted one
fn last_json_line(stdout: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .rev()
        .find(|line| line.trim_start().starts_with('{'))
        .map(str::to_owned)
}

fn parse_channel_listing(stdout: &[u8]) -> Vec<VideoId> {
    String::from_utf8_lossy(stdout)
        .split_whitespace()
        .filter_map(|raw| match VideoId::parse(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Ignoring listing entry that is not a video ID: {raw:?}");
                None
            }
        })
        .collect()
}

fn parse_metadata(video_id: &VideoId, stdout: &[u8]) -> Result<VideoRecord> {
    let line = last_json_line(stdout)
        .ok_or_else(|| miette::miette!("No JSON in metadata output of {video_id}"))?;
    let raw: RawMetadata = serde_json::from_str(&line)
        .map_err(|err| miette::miette!("Could not parse metadata JSON of {video_id}: {err}"))?;

    Ok(VideoRecord {
        id: video_id.clone(),
        title: raw.title.unwrap_or_else(|| UNKNOWN_TITLE.to_owned()),
        duration: raw.duration.map(|d| d.round() as u64),
        channel: raw.channel.or(raw.uploader),
    })
}

/// Find which file the tool wrote, given its JSON report.
/// `None` when the language is not in the requested subtitles.
fn requested_subtitle_ext(stdout: &[u8], language: &LanguageCode) -> Result<Option<String>> {
    let Some(line) = last_json_line(stdout) else {
        return Err(Error::DownloadFailed("no JSON report in tool output".to_owned()));
    };
    let info: RawDownloadInfo = serde_json::from_str(&line)
        .map_err(|err| Error::DownloadFailed(format!("could not parse JSON report: {err}")))?;

    Ok(info
        .requested_subtitles
        .and_then(|mut subs| subs.remove(language.as_str()))
        .map(|sub| sub.ext.unwrap_or_else(|| "vtt".to_owned())))
}

impl VideoSource for Ytdl {
    fn list_channel_videos(
        &self,
        channel_url: &str,
        cancel: &Cancellation,
    ) -> Result<Vec<VideoId>> {
        let res = run_command_cancellable(
            self.program,
            |cmd| {
                self.with_cookies(cmd.args(LISTING_ARGS))
                    .arg("--")
                    .arg(channel_url)
            },
            Capture::STDOUT | Capture::STDERR,
            cancel,
        )
        .map_err(|err| match err {
            Error::Cancelled => Error::Cancelled,
            err => Error::ListingUnavailable(err.to_string()),
        })?;

        if !res.status.success() {
            return Err(Error::ListingUnavailable(error_summary(&res.stderr)));
        }

        Ok(parse_channel_listing(&res.stdout))
    }

    fn get_metadata(&self, video_id: &VideoId, cancel: &Cancellation) -> Result<VideoRecord> {
        let url = video_id.url();
        let res = run_command_cancellable(
            self.program,
            |cmd| {
                self.with_cookies(cmd.arg("-q").arg("--skip-download").arg("--dump-json"))
                    .arg("--")
                    .arg(&url)
            },
            Capture::STDOUT | Capture::STDERR,
            cancel,
        )?;

        if !res.status.success() {
            return Err(Error::DownloadFailed(error_summary(&res.stderr)));
        }

        parse_metadata(video_id, &res.stdout)
    }
}

impl SubtitleFetcher for Ytdl {
    fn fetch_subtitle(
        &self,
        video_id: &VideoId,
        language: &LanguageCode,
        dest_dir: &Path,
        cancel: &Cancellation,
    ) -> Result<FetchResult> {
        // The tool appends `.<lang>.<ext>` to the template
        let template = dest_dir.join(video_id.as_str());
        let url = video_id.url();
        let [write_flag, lang_flag] = auto_subtitle_flags(self.program);

        let res = run_command_cancellable(
            self.program,
            |cmd| {
                self.with_cookies(
                    cmd.arg(write_flag)
                        .args([lang_flag, language.as_str()])
                        .arg("--skip-download")
                        .arg("--no-warnings")
                        .args([OsStr::new("-o"), template.as_os_str()])
                        .arg("--print-json"),
                )
                .arg("--")
                .arg(&url)
            },
            Capture::STDOUT | Capture::STDERR,
            cancel,
        )?;

        if !res.status.success() {
            return Err(Error::DownloadFailed(error_summary(&res.stderr)));
        }

        let Some(ext) = requested_subtitle_ext(&res.stdout, language)? else {
            debug!("No '{language}' subtitle for {video_id}");
            return Ok(FetchResult::LanguageUnavailable);
        };

        let path = dest_dir.join(format!("{video_id}.{language}.{ext}"));
        if path.is_file() {
            Ok(FetchResult::Downloaded(path))
        } else {
            Err(Error::DownloadFailed(format!(
                "subtitle reported as written but {} does not exist",
                path.display()
            )))
        }
    }
}
