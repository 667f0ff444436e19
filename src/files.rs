//! File access helpers
//!
//! Static content is resolved against one root directory; requests that try
//! to climb out of it are treated as missing.

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs::File;

use crate::error::{Error, Result};

/// A file resolved under a root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Full path on disk
    pub path: PathBuf,
    /// Extension including the dot, e.g. `.html`; empty when absent
    pub extension: String,
}

/// Resolve `requested` under `root` and check that it exists
pub async fn resolve(root: &Path, requested: &str) -> Result<FileInfo> {
    let relative = Path::new(requested.trim_start_matches('/'));

    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::NotFound(requested.to_string()));
    }

    let path = root.join(relative);
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(Error::NotFound(requested.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound(requested.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    Ok(FileInfo { path, extension })
}

/// Open `path` for streaming reads
pub async fn open_read_stream(path: &Path) -> Result<File> {
    File::open(path).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Io(e),
    })
}

/// MIME type for an extension as returned by [`resolve`]
pub fn content_type(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        ".html" => Some("text/html"),
        ".css" => Some("text/css"),
        ".js" => Some("text/javascript"),
        ".mp3" => Some("audio/mpeg"),
        _ => None,
    }
}
