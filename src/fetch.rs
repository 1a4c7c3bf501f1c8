use crate::error::{BuilderError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Cache location for `url`: its last path segment inside `cache_dir`
pub fn cached_file_path(cache_dir: &Path, url: &str) -> Result<PathBuf> {
    let file_name = url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BuilderError::download(url, "URL has no file name"))?;
    Ok(cache_dir.join(file_name))
}

/// Download `url` into `cache_dir` unless a file of the same name is already there
///
/// A cache hit is by file name only. Downloads land in a `.part` file first and
/// are moved into place once complete, so an interrupted transfer never looks
/// like a cache hit on the next run.
pub fn download_to_cache<W: Write>(cache_dir: &Path, url: &str, log: &mut W) -> Result<PathBuf> {
    fs::create_dir_all(cache_dir)?;
    let file = cached_file_path(cache_dir, url)?;

    if file.exists() {
        writeln!(
            log,
            "Using cached {} (instead of downloading {})",
            file.display(),
            url
        )?;
        return Ok(file);
    }

    writeln!(log, "Fetching {} (from {})", file.display(), url)?;
    download(url, &file)?;
    Ok(file)
}

/// Fetch `url` into `destination` through a sibling `.part` file
pub fn download(url: &str, destination: &Path) -> Result<()> {
    let mut partial = destination.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let result = fetch_into(url, &partial);
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result?;

    fs::rename(&partial, destination)?;
    tracing::info!("downloaded {} to {}", url, destination.display());
    Ok(())
}

fn fetch_into(url: &str, path: &Path) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("ruby-builder/", env!("CARGO_PKG_VERSION")))
        .timeout(None)
        .build()
        .map_err(|e| BuilderError::download(url, e))?;

    let mut response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(|e| BuilderError::download(url, e))?;

    let mut dest = fs::File::create(path)?;
    response
        .copy_to(&mut dest)
        .map_err(|e| BuilderError::download(url, e))?;
    dest.flush()?;

    Ok(())
}
