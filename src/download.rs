use crate::error::RerollError;
use crate::utils::debug_log;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Download a patch file into `dest_dir`, named after the last path segment
/// of the URL. The file is re-opened after the write; if that fails the
/// download is treated as failed.
pub fn download_patch(url_str: &str, dest_dir: &Path) -> Result<PathBuf, RerollError> {
    let url = Url::parse(url_str)
        .map_err(|e| RerollError::Generic(format!("Invalid patch URL {}: {}", url_str, e)))?;

    let filename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| {
            RerollError::Generic(format!("Cannot derive a filename from {}", url_str))
        })?
        .to_string();

    let dest = dest_dir.join(&filename);
    debug_log(&format!("downloading {} -> {}", url_str, dest.display()));

    let response = ureq::get(url_str).timeout(DOWNLOAD_TIMEOUT).call()?;
    let mut reader = response.into_reader();
    let mut file = fs::File::create(&dest)?;
    std::io::copy(&mut reader, &mut file)?;

    // Confirm the download actually landed on disk.
    fs::File::open(&dest)
        .map_err(|e| RerollError::Generic(format!("Download failed: {}: {}", dest.display(), e)))?;

    Ok(dest)
}
