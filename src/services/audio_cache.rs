//! On-disk cache of downloaded audio, keyed by video id

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Suffixes left behind by interrupted downloads
pub const PARTIAL_CACHE_SUFFIXES: [&str; 4] = [".part", ".ytdl", ".tmp", ".temp"];

/// Flat directory of `<video_id>.<ext>` files
#[derive(Debug, Clone)]
pub struct AudioCache {
    dir: PathBuf,
}

fn is_partial(path: &Path) -> bool {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().to_lowercase(),
        None => return false,
    };
    PARTIAL_CACHE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

impl AudioCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if it does not exist yet
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Output template handed to the extractor, `<dir>/<id>.%(ext)s`
    pub fn output_template(&self, video_id: &str) -> String {
        self.dir
            .join(format!("{}.%(ext)s", video_id))
            .to_string_lossy()
            .into_owned()
    }

    /// Regular files in the cache directory whose name starts with `<video_id>.`, sorted by name
    fn files_for(&self, video_id: &str) -> Vec<PathBuf> {
        let prefix = format!("{}.", video_id);
        let mut matches: Vec<PathBuf> = self
            .regular_files()
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().starts_with(&prefix))
                    .unwrap_or(false)
            })
            .collect();
        matches.sort();
        matches
    }

    fn regular_files(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot read cache directory {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect()
    }

    /// First complete cached file for the video, as an absolute path
    pub fn find_cached_audio(&self, video_id: &str) -> Option<PathBuf> {
        let found = self
            .files_for(video_id)
            .into_iter()
            .find(|path| !is_partial(path))?;

        debug!("Cache hit for {}: {}", video_id, found.display());
        Some(fs::canonicalize(&found).unwrap_or(found))
    }

    /// Remove leftover partial downloads for one video. Failures are ignored.
    pub fn cleanup_partial_cache_files(&self, video_id: &str) {
        for path in self.files_for(video_id).into_iter().filter(|p| is_partial(p)) {
            remove_quietly(&path);
        }
    }

    /// Remove every partial download in the cache. Run once at startup, before
    /// any download is accepted, so it cannot race an in-flight fetch.
    pub fn cleanup_all_partial_cache_files(&self) -> usize {
        let mut removed = 0;
        for path in self.regular_files().into_iter().filter(|p| is_partial(p)) {
            if remove_quietly(&path) {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Removed {} partial download(s) from {}", removed, self.dir.display());
        }
        removed
    }
}

fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed partial cache file {}", path.display());
            true
        }
        Err(e) => {
            debug!("Could not remove {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ID: &str = "dQw4w9WgXcQ";

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"audio").unwrap();
        path
    }

    #[test]
    fn find_ignores_partial_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &format!("{}.part", ID));
        touch(temp.path(), &format!("{}.m4a", ID));
        let cache = AudioCache::new(temp.path());

        let found = cache.find_cached_audio(ID).unwrap();
        assert_eq!(found.file_name().unwrap(), "dQw4w9WgXcQ.m4a");
        assert!(found.is_absolute());
    }

    #[test]
    fn find_returns_first_by_name() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &format!("{}.webm", ID));
        touch(temp.path(), &format!("{}.m4a", ID));
        let cache = AudioCache::new(temp.path());

        let found = cache.find_cached_audio(ID).unwrap();
        assert_eq!(found.file_name().unwrap(), "dQw4w9WgXcQ.m4a");
    }

    #[test]
    fn find_misses_on_only_partials_or_other_ids() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), &format!("{}.webm.PART", ID));
        touch(temp.path(), &format!("{}.ytdl", ID));
        touch(temp.path(), "aaaaaaaaaaa.m4a");
        fs::create_dir(temp.path().join(format!("{}.dir", ID))).unwrap();
        let cache = AudioCache::new(temp.path());

        assert!(cache.find_cached_audio(ID).is_none());
    }

    #[test]
    fn find_on_missing_directory_is_none() {
        let temp = TempDir::new().unwrap();
        let cache = AudioCache::new(temp.path().join("absent"));
        assert!(cache.find_cached_audio(ID).is_none());
    }

    #[test]
    fn cleanup_for_id_only_touches_that_id() {
        let temp = TempDir::new().unwrap();
        let partial = touch(temp.path(), &format!("{}.m4a.part", ID));
        let complete = touch(temp.path(), &format!("{}.m4a", ID));
        let other = touch(temp.path(), "aaaaaaaaaaa.tmp");
        let cache = AudioCache::new(temp.path());

        cache.cleanup_partial_cache_files(ID);

        assert!(!partial.exists());
        assert!(complete.exists());
        assert!(other.exists());
    }

    #[test]
    fn cleanup_all_removes_every_partial() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "aaaaaaaaaaa.tmp");
        touch(temp.path(), "bbbbbbbbbbb.temp");
        let keep = touch(temp.path(), "ccccccccccc.opus");
        let cache = AudioCache::new(temp.path());

        assert_eq!(cache.cleanup_all_partial_cache_files(), 2);
        assert!(keep.exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn output_template_uses_extractor_placeholder() {
        let cache = AudioCache::new("/data/cache");
        assert_eq!(cache.output_template(ID), "/data/cache/dQw4w9WgXcQ.%(ext)s");
    }
}
