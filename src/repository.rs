use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    already_downloaded::{id_from_filename, scan_existing},
    io::move_file,
    result::Result,
    types::VideoId,
};

/// Interface for the place where the finished subtitles are stored
pub trait SubtitleRepository {
    /// All the videos that already have a stored subtitle
    fn downloaded_ids(&self) -> Result<BTreeSet<VideoId>>;

    /// Whether at least one subtitle is stored for the video
    fn exists(&self, video_id: &VideoId) -> Result<bool>;

    /// Move the downloaded artifact into place under its final filename.
    /// Return the final path.
    fn persist(&self, video_id: &VideoId, artifact: &Path, filename: &str) -> Result<PathBuf>;
}

/// Subtitles stored as files directly in an output directory
#[derive(Debug, Clone)]
pub struct FsSubtitleRepository {
    out_dir: PathBuf,
}

impl FsSubtitleRepository {
    pub fn new<P: Into<PathBuf>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl SubtitleRepository for FsSubtitleRepository {
    fn downloaded_ids(&self) -> Result<BTreeSet<VideoId>> {
        scan_existing(&self.out_dir)
    }

    fn exists(&self, video_id: &VideoId) -> Result<bool> {
        for entry in self.out_dir.read_dir()? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if id_from_filename(&entry.file_name().to_string_lossy()).as_ref() == Some(video_id) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn persist(&self, video_id: &VideoId, artifact: &Path, filename: &str) -> Result<PathBuf> {
        let target = self.out_dir.join(filename);
        if target.exists() {
            debug!("Overwriting {}", target.display());
        }

        move_file(artifact, &target)
            .map_err(|err| err.wrap_err_with(|| format!("Could not store subtitle of {video_id}")))?;
        debug!("Stored subtitle of {video_id} as {}", target.display());
        Ok(target)
    }
}
