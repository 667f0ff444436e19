//! Engine configuration

use std::path::{Path, PathBuf};

/// Default external audio tool
pub const DEFAULT_AUDIO_TOOL: &str = "sox";

/// Default song played on `start`
pub const DEFAULT_SONG: &str = "conversation.mp3";

/// Bitrate used when probing fails (bits/sec)
pub const FALLBACK_BITRATE: u64 = 128_000;

/// Divisor turning bits/sec into bytes/sec
pub const BITRATE_DIVISOR: u64 = 8;

/// Engine configuration options
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// External audio tool used for probing and mixing
    pub audio_tool: PathBuf,

    /// Arguments placed before every tool invocation (e.g. `-q`)
    pub audio_tool_args: Vec<String>,

    /// Directory holding the songs
    pub songs_dir: PathBuf,

    /// Directory holding the sound effects
    pub fx_dir: PathBuf,

    /// Directory served as static content
    pub public_dir: PathBuf,

    /// Song opened by `start`
    pub current_song: PathBuf,

    /// Media type passed to the tool with `-t`
    pub media_type: String,

    /// Volume of the main source inside a mix
    pub song_volume: String,

    /// Volume of the effect inside a mix
    pub fx_volume: String,

    /// Bitrate substituted when probing fails (bits/sec)
    pub fallback_bitrate: u64,

    /// Divisor turning the probed bitrate into bytes/sec
    pub bitrate_divisor: u64,

    /// Chunks buffered per client before it is considered gone
    pub client_buffer_capacity: usize,

    /// Chunks buffered between the throttle and the broadcaster
    pub feed_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_root(".")
    }
}

impl EngineConfig {
    /// Create a config laid out under `root`
    ///
    /// ```text
    /// root/
    ///   audio/songs/conversation.mp3
    ///   audio/fx/
    ///   public/
    /// ```
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let audio_dir = root.join("audio");
        let songs_dir = audio_dir.join("songs");

        Self {
            audio_tool: PathBuf::from(DEFAULT_AUDIO_TOOL),
            audio_tool_args: Vec::new(),
            current_song: songs_dir.join(DEFAULT_SONG),
            songs_dir,
            fx_dir: audio_dir.join("fx"),
            public_dir: root.join("public"),
            media_type: "mp3".to_string(),
            song_volume: "0.99".to_string(),
            fx_volume: "0.1".to_string(),
            fallback_bitrate: FALLBACK_BITRATE,
            bitrate_divisor: BITRATE_DIVISOR,
            client_buffer_capacity: 1024,
            feed_capacity: 16,
        }
    }

    /// Set the external audio tool
    pub fn audio_tool(mut self, program: impl Into<PathBuf>) -> Self {
        self.audio_tool = program.into();
        self
    }

    /// Set the arguments placed before every tool invocation
    pub fn audio_tool_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audio_tool_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the song opened by `start`
    pub fn song(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_song = path.into();
        self
    }

    /// Set the effects directory
    pub fn fx_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fx_dir = dir.into();
        self
    }

    /// Set the static content directory
    pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }

    /// Set the fallback bitrate (bits/sec)
    pub fn fallback_bitrate(mut self, bitrate: u64) -> Self {
        self.fallback_bitrate = bitrate;
        self
    }

    /// Set the mix volumes
    pub fn volumes(mut self, song: impl Into<String>, fx: impl Into<String>) -> Self {
        self.song_volume = song.into();
        self.fx_volume = fx.into();
        self
    }

    /// Set the per-client buffer capacity, in chunks (minimum 1)
    pub fn client_buffer_capacity(mut self, chunks: usize) -> Self {
        self.client_buffer_capacity = chunks.max(1);
        self
    }

    /// Convert a probed bitrate (bits/sec) into the pacing rate (bytes/sec)
    pub fn pacing_rate(&self, bits_per_sec: u64) -> u64 {
        (bits_per_sec / self.bitrate_divisor.max(1)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = EngineConfig::with_root("/srv/radio");

        assert_eq!(config.songs_dir, PathBuf::from("/srv/radio/audio/songs"));
        assert_eq!(config.fx_dir, PathBuf::from("/srv/radio/audio/fx"));
        assert_eq!(config.public_dir, PathBuf::from("/srv/radio/public"));
        assert_eq!(
            config.current_song,
            PathBuf::from("/srv/radio/audio/songs/conversation.mp3")
        );
        assert_eq!(config.audio_tool, PathBuf::from("sox"));
        assert!(config.audio_tool_args.is_empty());
        assert_eq!(config.fallback_bitrate, 128_000);
        assert_eq!(config.media_type, "mp3");
    }

    #[test]
    fn test_builder_chaining() {
        let config = EngineConfig::default()
            .audio_tool("/usr/local/bin/sox")
            .audio_tool_args(["-q"])
            .song("/tmp/song.mp3")
            .fx_dir("/tmp/fx")
            .fallback_bitrate(64_000)
            .volumes("0.8", "0.3")
            .client_buffer_capacity(0);

        assert_eq!(config.audio_tool, PathBuf::from("/usr/local/bin/sox"));
        assert_eq!(config.audio_tool_args, vec!["-q".to_string()]);
        assert_eq!(config.current_song, PathBuf::from("/tmp/song.mp3"));
        assert_eq!(config.fx_dir, PathBuf::from("/tmp/fx"));
        assert_eq!(config.fallback_bitrate, 64_000);
        assert_eq!(config.song_volume, "0.8");
        assert_eq!(config.fx_volume, "0.3");
        assert_eq!(config.client_buffer_capacity, 1);
    }

    #[test]
    fn test_pacing_rate() {
        let config = EngineConfig::default();

        assert_eq!(config.pacing_rate(128_000), 16_000);
        assert_eq!(config.pacing_rate(0), 1);
    }
}
