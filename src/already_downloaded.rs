use std::{collections::BTreeSet, path::Path, sync::OnceLock};

use regex::Regex;
use tracing::{debug, trace};

use crate::{
    result::{Error, Result},
    types::VideoId,
};

/// Optional sequence number, then the video ID, then the rest of the name.
/// e.g. `0042_dQw4w9WgXcQ_My Title.en.vtt` or `dQw4w9WgXcQ_My Title.en.txt`
const FILENAME_PATTERN: &str = r"^(?:\d+_)?([A-Za-z0-9_-]{11})_";

static FILENAME_RE: OnceLock<Regex> = OnceLock::new();

fn filename_re() -> &'static Regex {
    FILENAME_RE.get_or_init(|| Regex::new(FILENAME_PATTERN).expect("static pattern is valid"))
}

/// Extract the video ID embedded in an output filename
pub fn id_from_filename(name: &str) -> Option<VideoId> {
    let caps = filename_re().captures(name)?;
    VideoId::parse(caps.get(1)?.as_str()).ok()
}

/// List the videos that already have a subtitle file in the output directory.
///
/// Only regular files directly inside the directory are considered.
/// A file whose name does not follow the naming convention is simply ignored,
/// at worst the video is downloaded again.
pub fn scan_existing(out_dir: &Path) -> Result<BTreeSet<VideoId>> {
    let unavailable = |err: std::io::Error| {
        debug!("Could not scan {}: {err}", out_dir.display());
        Error::OutputDirUnavailable(out_dir.to_path_buf())
    };

    let mut ids = BTreeSet::new();
    for entry in out_dir.read_dir().map_err(unavailable)? {
        let entry = entry.map_err(unavailable)?;
        if !entry.file_type().map_err(unavailable)?.is_file() {
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();
        match id_from_filename(&name) {
            Some(id) => {
                trace!("Found existing subtitle for {id}: {name}");
                ids.insert(id);
            }
            None => trace!("Ignoring file not following the naming convention: {name}"),
        }
    }

    debug!("{} videos already downloaded in {}", ids.len(), out_dir.display());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_with_and_without_index() {
        let expected = VideoId::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(
            id_from_filename("0042_dQw4w9WgXcQ_Never Gonna.en.vtt"),
            Some(expected.clone())
        );
        assert_eq!(
            id_from_filename("dQw4w9WgXcQ_Never Gonna.hi.txt"),
            Some(expected)
        );
    }

    #[test]
    fn ids_with_underscores_and_dashes() {
        assert_eq!(
            id_from_filename("0001_a_b-c_d-e_f_Title.en.vtt"),
            Some(VideoId::parse("a_b-c_d-e_f").unwrap())
        );
    }

    #[test]
    fn unrelated_names_are_ignored() {
        assert_eq!(id_from_filename("notes.txt"), None);
        assert_eq!(id_from_filename("0001_short_Title.en.vtt"), None);
    }

    #[test]
    fn scan_only_looks_at_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0001_AAAAAAAAAAA_First.en.vtt"), "").unwrap();
        std::fs::write(dir.path().join("BBBBBBBBBBB_Second.hi.txt"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();
        std::fs::create_dir(dir.path().join("CCCCCCCCCCC_dir")).unwrap();

        let ids = scan_existing(dir.path()).unwrap();
        let ids: Vec<&str> = ids.iter().map(VideoId::as_str).collect();
        assert_eq!(ids, ["AAAAAAAAAAA", "BBBBBBBBBBB"]);
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            scan_existing(&dir.path().join("nope")),
            Err(Error::OutputDirUnavailable(_))
        ));
    }
}
