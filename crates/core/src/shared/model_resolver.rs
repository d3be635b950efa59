use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model override does not exist: {0}")]
    MissingOverride(PathBuf),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// A downloadable model: file name in the cache plus its source URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub url: &'static str,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

const DOWNLOAD_CHUNK: usize = 256 * 1024;

/// Resolve a model file, downloading it into the user cache if needed.
///
/// Resolution order:
/// 1. Explicit override path (must exist)
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory (development / pre-packaged installs)
/// 4. Download from the model URL into the cache
pub fn resolve(
    spec: ModelSpec,
    override_path: Option<&Path>,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = override_path {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::MissingOverride(path.to_path_buf()))
        };
    }
    resolve_in(&model_cache_dir()?, spec, bundled_dir, progress)
}

/// Same as [`resolve`] without an override, against an explicit cache dir.
pub fn resolve_in(
    cache_dir: &Path,
    spec: ModelSpec,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(spec.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    if let Some(dir) = bundled_dir {
        let bundled_path = dir.join(spec.name);
        if bundled_path.exists() {
            return Ok(bundled_path);
        }
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {}", spec.name, spec.url);
    download(spec.url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Moodscope/models/`
/// - Linux: `$XDG_CACHE_HOME/Moodscope/models/` or `~/.cache/Moodscope/models/`
/// - Windows: `%LOCALAPPDATA%/Moodscope/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("Moodscope").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;

    let total = response.content_length().unwrap_or(0);
    let temp_path = dest.with_extension("part");
    let write_err = |source: std::io::Error| ModelResolveError::Write {
        path: temp_path.clone(),
        source,
    };

    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    let mut buf = vec![0u8; DOWNLOAD_CHUNK];
    let mut downloaded: u64 = 0;
    loop {
        let n = match response.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&temp_path);
                return Err(write_err(e));
            }
        };
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SPEC: ModelSpec = ModelSpec {
        name: "test_model.onnx",
        url: "http://invalid.nonexistent.example.com/model.onnx",
    };

    #[test]
    fn test_override_path_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.onnx");
        fs::write(&path, b"custom").unwrap();

        let resolved = resolve(SPEC, Some(&path), None, None).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_missing_override_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.onnx");
        let err = resolve(SPEC, Some(&path), None, None).unwrap_err();
        assert!(matches!(err, ModelResolveError::MissingOverride(_)));
    }

    #[test]
    fn test_resolve_in_finds_cached_file() {
        let tmp = TempDir::new().unwrap();
        let cached = tmp.path().join(SPEC.name);
        fs::write(&cached, b"cached").unwrap();

        assert_eq!(resolve_in(tmp.path(), SPEC, None, None).unwrap(), cached);
    }

    #[test]
    fn test_resolve_in_falls_back_to_bundled() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join(SPEC.name), b"bundled").unwrap();

        let resolved = resolve_in(&cache, SPEC, Some(&bundled), None).unwrap();
        assert_eq!(resolved, bundled.join(SPEC.name));
    }

    #[test]
    fn test_model_cache_dir_is_branded() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Moodscope"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_download_failure_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download(SPEC.url, &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
