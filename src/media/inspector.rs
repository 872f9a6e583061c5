use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Post-download gate over a written media file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Whether the file contains at least one audio stream.
    ///
    /// A probe that cannot run at all is an `Err`; a clean run that finds
    /// no audio (or a file ffprobe refuses to parse) is `Ok(false)`.
    async fn has_audio_stream(&self, path: &Path) -> Result<bool>;
}

/// `ffprobe`-backed probe: lists stream codec types and looks for an
/// audio-typed entry.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe;

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn has_audio_stream(&self, path: &Path) -> Result<bool> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "stream=codec_type",
                "-of",
                "default=noprint_wrappers=1",
            ])
            .arg(path)
            .output()
            .await?;
        if !output.status.success() {
            debug!(
                "inspector: ffprobe exited {:?} for {:?}",
                output.status.code(),
                path
            );
            return Ok(false);
        }
        Ok(contains_audio_stream(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}

// One `codec_type=<type>` line per stream.
fn contains_audio_stream(stdout: &str) -> bool {
    stdout.lines().any(|line| line.trim() == "codec_type=audio")
}
