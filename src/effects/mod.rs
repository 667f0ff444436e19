//! Sound effects
//!
//! Effects live as plain files in one directory and are looked up by a
//! case-insensitive substring of their file name. Lookups are not cached;
//! every trigger scans the directory again.

pub mod mixer;

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub use mixer::EffectMixer;

/// Resolve `name` to the first effect file whose name contains it
///
/// Entries are scanned in lexical order so the match is stable.
pub async fn resolve_effect(fx_dir: &Path, name: &str) -> Result<PathBuf> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return Err(Error::NotFound("empty effect name".into()));
    }

    let mut entries = match tokio::fs::read_dir(fx_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!(
                "effects directory {}",
                fx_dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name());
        }
    }
    names.sort();

    names
        .into_iter()
        .find(|file| file.to_string_lossy().to_lowercase().contains(&wanted))
        .map(|file| fx_dir.join(file))
        .ok_or_else(|| Error::NotFound(format!("the effect {} was not found", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Applause Sound Effect.mp3", "Boo! Sound Effect.mp3", "Fart.mp3"] {
            std::fs::write(dir.path().join(name), b"fx").unwrap();
        }
        std::fs::create_dir(dir.path().join("applause-archive")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_case_insensitive_substring() {
        let dir = fx_dir();

        let path = resolve_effect(dir.path(), "applause").await.unwrap();
        assert_eq!(path, dir.path().join("Applause Sound Effect.mp3"));

        let path = resolve_effect(dir.path(), "BOO").await.unwrap();
        assert_eq!(path, dir.path().join("Boo! Sound Effect.mp3"));
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let dir = fx_dir();

        let path = resolve_effect(dir.path(), "sound effect").await.unwrap();
        assert_eq!(path, dir.path().join("Applause Sound Effect.mp3"));
    }

    #[tokio::test]
    async fn test_missing_effect() {
        let dir = fx_dir();

        let err = resolve_effect(dir.path(), "missingfx").await.unwrap_err();
        assert!(err.is_not_found());

        let err = resolve_effect(dir.path(), "   ").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();

        let err = resolve_effect(&dir.path().join("nope"), "boo").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
