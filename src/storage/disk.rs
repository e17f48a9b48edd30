use crate::storage::traits::{CachedResponse, ResponseCache, StorageError, StorageResult};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::Url;

/// On-disk response cache
///
/// Each entry lives in `<dir>/<sha256 hex of the requested URL>`. The first
/// line of the file holds the final URL, the rest is the body. Entries are
/// written to a temporary file and renamed into place, so readers never see a
/// partial entry.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Opens (and creates if needed) a cache directory
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding the cache entries
    ///
    /// # Returns
    ///
    /// * `Ok(DiskCache)` - The directory exists and is usable
    /// * `Err(StorageError)` - The directory could not be created
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, url: &Url) -> PathBuf {
        let digest = Sha256::digest(url.as_str().as_bytes());
        self.dir.join(hex::encode(digest))
    }
}

impl ResponseCache for DiskCache {
    fn get(&self, url: &Url) -> StorageResult<Option<CachedResponse>> {
        let content = match std::fs::read_to_string(self.entry_path(url)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let corrupt = |reason: String| StorageError::Corrupt {
            url: url.to_string(),
            reason,
        };

        let (first_line, body) = content
            .split_once('\n')
            .ok_or_else(|| corrupt("missing header line".to_string()))?;
        let final_url = Url::parse(first_line).map_err(|e| corrupt(e.to_string()))?;

        Ok(Some(CachedResponse {
            final_url,
            body: body.to_string(),
        }))
    }

    fn put(&self, url: &Url, response: &CachedResponse) -> StorageResult<()> {
        let path = self.entry_path(url);
        let tmp = path.with_extension(format!("tmp{}", std::process::id()));

        let mut content = String::with_capacity(response.body.len() + 128);
        content.push_str(response.final_url.as_str());
        content.push('\n');
        content.push_str(&response.body);

        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
