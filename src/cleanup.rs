use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use tracing::{debug, info};

use crate::{
    io::write_atomic,
    result::{Error, Result},
};

/// Extension of the cleaned files
pub const TEXT_EXTENSION: &str = "txt";

/// Header lines of a WebVTT file
const HEADER_PREFIXES: [&str; 3] = ["WEBVTT", "Kind:", "Language:"];

static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static pattern is valid"))
}

/// Turn a raw subtitle track into plain text.
///
/// Header, cue numbers, timing lines, and markup tags are removed.
/// Consecutive identical lines are only kept once, as auto-captions
/// repeat the same text across overlapping cues.
/// Never fails: unexpected content is passed through.
pub fn clean(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();

        if line.is_empty()
            || line.contains("-->")
            || line.bytes().all(|b| b.is_ascii_digit())
            || HEADER_PREFIXES.iter().any(|p| line.starts_with(p))
        {
            continue;
        }

        let text = decode_entities(tag_re().replace_all(line, "").trim());
        if text.is_empty() {
            continue;
        }

        if lines.last() != Some(&text) {
            lines.push(text);
        }
    }

    lines.join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Post-processing step applied on a downloaded subtitle file
pub trait TextCleanup {
    /// Write the cleaned version of `input` and return its path.
    ///
    /// On error, `input` **must** be left untouched.
    fn clean_file(&self, input: &Path) -> Result<PathBuf>;
}

/// Convert a subtitle file into a `.txt` sibling and remove the original
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextCleanup;

impl TextCleanup for PlainTextCleanup {
    fn clean_file(&self, input: &Path) -> Result<PathBuf> {
        let fail = |err: std::io::Error| {
            Error::CleanupFailed(format!("{}: {err}", input.display()))
        };

        let raw = std::fs::read(input).map_err(fail)?;
        let text = clean(&String::from_utf8_lossy(&raw));

        let output = input.with_extension(TEXT_EXTENSION);
        write_atomic(&output, text.as_bytes())
            .map_err(|err| Error::CleanupFailed(format!("{}: {err}", output.display())))?;

        // The raw track is only dropped once the text is safely written
        if output != input {
            std::fs::remove_file(input).map_err(fail)?;
        }

        info!("Cleaned subtitle into {}", output.display());
        debug!("{} bytes of raw track, {} bytes of text", raw.len(), text.len());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    const SAMPLE: &str = indoc! {"
        WEBVTT
        Kind: captions
        Language: en

        1
        00:00:00.000 --> 00:00:02.000 align:start position:0%
        hello<00:00:00.500><c> world</c>

        2
        00:00:02.000 --> 00:00:02.010
        hello world

        00:00:02.010 --> 00:00:04.000
        hello world
        this is &gt;&gt; a test

        00:00:04.000 --> 00:00:05.000
        hello world
    "};

    #[test]
    fn strips_header_timings_tags_and_repeats() {
        assert_eq!(
            clean(SAMPLE),
            "hello world\nthis is >> a test\nhello world"
        );
    }

    #[test]
    fn unexpected_content_passes_through() {
        assert_eq!(clean("just some text\nmore"), "just some text\nmore");
        assert_eq!(clean(""), "");
        assert_eq!(clean("<<<>>>"), ">>");
    }

    #[test]
    fn clean_file_replaces_raw_track() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("0001_dQw4w9WgXcQ_Title.en.vtt");
        std::fs::write(&raw, SAMPLE).unwrap();

        let out = PlainTextCleanup.clean_file(&raw).unwrap();

        assert_eq!(out, dir.path().join("0001_dQw4w9WgXcQ_Title.en.txt"));
        assert!(!raw.exists());
        assert!(std::fs::read_to_string(out).unwrap().starts_with("hello world"));
    }

    #[test]
    fn clean_file_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.en.vtt");
        assert!(matches!(
            PlainTextCleanup.clean_file(&missing),
            Err(Error::CleanupFailed(_))
        ));
    }
}
