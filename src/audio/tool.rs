//! External audio tool invocations
//!
//! Two invocations of the tool are used:
//!
//! - probe: `sox --i -B <path>` prints the encoded bitrate, e.g. `128k`
//! - mix: `sox -t mp3 -v 0.99 -m - -t mp3 -v 0.1 <fx> -t mp3 -` reads the
//!   main audio on stdin and writes the merged stream on stdout
//!
//! Both run as child processes driven by `tokio::process`, so waiting on
//! them never blocks the runtime.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::bitrate::parse_bitrate;
use crate::engine::EngineConfig;
use crate::error::{Error, Result};
use crate::pipeline::Upstream;

/// Settings for a mix invocation
#[derive(Debug, Clone)]
pub struct MixSettings {
    /// Media type passed with `-t`
    pub media_type: String,
    /// Volume of the main source
    pub song_volume: String,
    /// Volume of the effect
    pub fx_volume: String,
}

impl MixSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            media_type: config.media_type.clone(),
            song_volume: config.song_volume.clone(),
            fx_volume: config.fx_volume.clone(),
        }
    }

    /// Arguments merging stdin with `effect` onto stdout
    pub fn args(&self, effect: &Path) -> Vec<OsString> {
        let t = &self.media_type;
        vec![
            "-t".into(),
            t.into(),
            "-v".into(),
            (&self.song_volume).into(),
            "-m".into(),
            "-".into(),
            "-t".into(),
            t.into(),
            "-v".into(),
            (&self.fx_volume).into(),
            effect.as_os_str().to_owned(),
            "-t".into(),
            t.into(),
            "-".into(),
        ]
    }
}

/// Handle to the external audio tool
#[derive(Debug, Clone)]
pub struct AudioTool {
    program: PathBuf,
    leading_args: Vec<OsString>,
    fallback_bitrate: u64,
}

impl AudioTool {
    /// Create a tool handle for `program`, falling back to `fallback_bitrate`
    pub fn new(program: impl Into<PathBuf>, fallback_bitrate: u64) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            fallback_bitrate,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.audio_tool, config.fallback_bitrate)
            .leading_args(config.audio_tool_args.iter().map(OsString::from))
    }

    /// Arguments placed before every invocation
    pub fn leading_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        self.leading_args = args.into_iter().collect();
        self
    }

    /// Program path
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        cmd
    }

    /// Probe the encoded bitrate of `path` in bits/sec
    ///
    /// Never fails: if the tool cannot run, writes anything to stderr, or
    /// prints something unparseable, the fallback bitrate is returned.
    pub async fn probe(&self, path: &Path) -> u64 {
        match self.try_probe(path).await {
            Ok(bitrate) => {
                tracing::debug!(path = %path.display(), bitrate, "Bitrate probed");
                bitrate
            }
            Err(reason) => {
                tracing::error!(
                    path = %path.display(),
                    fallback = self.fallback_bitrate,
                    "Error on bitrate: {}",
                    reason
                );
                self.fallback_bitrate
            }
        }
    }

    async fn try_probe(&self, path: &Path) -> std::result::Result<u64, String> {
        let output = self
            .command()
            .arg("--i")
            .arg("-B")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.program.display(), e))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            return Err(stderr.trim().to_string());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_bitrate(&stdout).ok_or_else(|| format!("unrecognized bitrate {:?}", stdout.trim()))
    }

    /// Launch a mix of stdin with `effect`
    ///
    /// Nothing is read or written yet; pass the main source to
    /// [`MixProcess::pipe`] to start the mix.
    pub fn spawn_mix(&self, effect: &Path, settings: &MixSettings) -> Result<MixProcess> {
        let mut child = self
            .command()
            .args(settings.args(effect))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.start_kill();
                return Err(Error::Pipe("mixer stdio not captured".into()));
            }
        };

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(target: "radio_rs::mixer", "{}", line);
                }
            });
        }

        tracing::debug!(
            program = %self.program.display(),
            effect = %effect.display(),
            pid = ?child.id(),
            "Mixer spawned"
        );

        Ok(MixProcess {
            child,
            stdin,
            stdout,
        })
    }
}

/// A running mixer process that has not been fed yet
#[derive(Debug)]
pub struct MixProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
}

impl MixProcess {
    /// Feed `main` into the mixer and return its merged output
    ///
    /// The copy into stdin and the reaping of the process run as background
    /// tasks. When the consumer of the returned stream goes away the mixer
    /// hits a broken pipe and exits on its own.
    pub fn pipe(self, mut main: Upstream) -> Upstream {
        let MixProcess {
            mut child,
            mut stdin,
            stdout,
        } = self;

        tokio::spawn(async move {
            match tokio::io::copy(&mut main, &mut stdin).await {
                Ok(bytes) => tracing::debug!(bytes, "Main source fully fed to mixer"),
                Err(e) => tracing::debug!(error = %e, "Mixer input closed"),
            }
            // Dropping stdin signals end of input
        });

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => tracing::debug!("Mixer exited"),
                Ok(status) => tracing::warn!(%status, "Mixer exited with failure"),
                Err(e) => tracing::warn!(error = %e, "Failed to reap mixer"),
            }
        });

        Box::new(stdout)
    }

    /// Abandon the mix without feeding it
    pub fn abort(mut self) {
        let _ = self.child.start_kill();
        tokio::spawn(async move {
            let _ = self.child.wait().await;
        });
    }
}
