use std::{collections::HashSet, path::Path};

use tracing::{debug, warn};

use crate::{
    io::write_atomic,
    result::{Error, Result},
    types::VideoId,
};

/// Ordered list of the channel videos known from previous runs.
///
/// Stored as a plain UTF-8 text file, one video ID per line, in discovery order.
pub struct VideoCache;

impl VideoCache {
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Read the cached IDs in file order.
    ///
    /// Lines that are not valid IDs are skipped with a warning.
    /// A file that exists but cannot be read is reported as [`Error::CacheCorrupt`].
    pub fn load(path: &Path) -> Result<Vec<VideoId>> {
        let content = std::fs::read(path).map_err(|err| {
            warn!("Could not read cache file {}: {err}", path.display());
            Error::CacheCorrupt(path.to_path_buf())
        })?;
        let content = String::from_utf8_lossy(&content);

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for (line_idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match VideoId::parse(line) {
                Ok(id) => {
                    if seen.insert(id.clone()) {
                        ids.push(id);
                    }
                }
                Err(_) => warn!(
                    "Ignoring invalid line {} of cache file {}: {line:?}",
                    line_idx + 1,
                    path.display()
                ),
            }
        }

        debug!("{} IDs loaded from cache {}", ids.len(), path.display());
        Ok(ids)
    }

    /// Overwrite the cache with the given IDs, atomically
    pub fn save(path: &Path, ids: &[VideoId]) -> Result<()> {
        let mut content = String::with_capacity(ids.len() * 12);
        for id in ids {
            content.push_str(id.as_str());
            content.push('\n');
        }

        write_atomic(path, content.as_bytes())
            .map_err(|err| err.wrap_err_with(|| format!("Could not write cache {}", path.display())))?;
        debug!("{} IDs saved to cache {}", ids.len(), path.display());
        Ok(())
    }
}

/// Union of two ID lists, keeping the order of `prior` then appending the new IDs of `discovered`
pub fn merge_ids(prior: &[VideoId], discovered: &[VideoId]) -> Vec<VideoId> {
    let mut seen: HashSet<&VideoId> = HashSet::with_capacity(prior.len() + discovered.len());
    let mut merged = Vec::with_capacity(prior.len() + discovered.len());

    for id in prior.iter().chain(discovered) {
        if seen.insert(id) {
            merged.push(id.clone());
        }
    }
    merged
}
