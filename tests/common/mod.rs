//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use radio_rs::registry::ClientStream;
use radio_rs::EngineConfig;
use tempfile::TempDir;

pub const SONG_LEN: usize = 64_000;

/// Stand-in for sox: reports 800k and passes audio through unchanged
pub const PASSTHROUGH_TOOL: &str = r#"
if [ "$1" = "--i" ]; then
    echo "800k"
    exit 0
fi
exec cat
"#;

/// On-disk layout of a radio root
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Song, two effects and a public directory with both pages
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let songs = root.join("audio/songs");
        let fx = root.join("audio/fx");
        std::fs::create_dir_all(&songs).unwrap();
        std::fs::create_dir_all(&fx).unwrap();
        std::fs::write(songs.join("conversation.mp3"), song_bytes()).unwrap();
        std::fs::write(fx.join("Applause Sound Effect.mp3"), b"clap").unwrap();
        std::fs::write(fx.join("Boo! Sound Effect.mp3"), b"boo").unwrap();

        let public = root.join("public");
        std::fs::create_dir_all(public.join("home/css")).unwrap();
        std::fs::create_dir_all(public.join("controller")).unwrap();
        std::fs::write(public.join("home/index.html"), b"<h1>home</h1>").unwrap();
        std::fs::write(public.join("home/css/index.css"), b"body {}").unwrap();
        std::fs::write(public.join("controller/index.html"), b"<h1>controller</h1>").unwrap();

        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Config whose audio tool does not exist, so probing falls back
    pub fn config(&self) -> EngineConfig {
        EngineConfig::with_root(self.root()).audio_tool(self.root().join("no-such-sox"))
    }

    /// Config running [`PASSTHROUGH_TOOL`] through `sh`
    pub fn passthrough_config(&self) -> EngineConfig {
        let script = self.write_tool("sox.sh", PASSTHROUGH_TOOL);
        EngineConfig::with_root(self.root())
            .audio_tool("sh")
            .audio_tool_args([script.to_string_lossy().into_owned()])
    }

    pub fn write_tool(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }
}

/// Deterministic, non-repeating-looking song content
pub fn song_bytes() -> Vec<u8> {
    (0..SONG_LEN).map(|i| (i * 31 % 251) as u8).collect()
}

/// Collect chunks until `len` bytes arrived, the stream ended, or `limit` passed
pub async fn collect(stream: &mut ClientStream, len: usize, limit: Duration) -> Vec<u8> {
    let mut out = Vec::new();
    let _ = tokio::time::timeout(limit, async {
        while out.len() < len {
            match stream.recv().await {
                Some(chunk) => out.extend_from_slice(&chunk),
                None => break,
            }
        }
    })
    .await;
    out
}
