// Audio concatenation backends

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Joins per-batch audio files into one narration.
///
/// Implementations must keep the input order and must not leave a partial
/// file at `output` when they fail.
#[async_trait]
pub trait AudioConcatenator: Send + Sync {
    async fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;

    /// Backend name
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcatenatorKind {
    #[default]
    Ffmpeg,
    Frames,
}

impl std::str::FromStr for ConcatenatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ffmpeg" => Ok(ConcatenatorKind::Ffmpeg),
            "frames" => Ok(ConcatenatorKind::Frames),
            other => Err(format!(
                "unknown audio concatenator: {} (available: ffmpeg, frames)",
                other
            )),
        }
    }
}

/// Create a concatenator for the configured backend
pub fn create_concatenator(kind: ConcatenatorKind, ffmpeg_path: &str) -> Box<dyn AudioConcatenator> {
    match kind {
        ConcatenatorKind::Ffmpeg => Box::new(FfmpegConcatenator::new(ffmpeg_path)),
        ConcatenatorKind::Frames => Box::new(Mp3FrameConcatenator),
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    output.with_file_name(name)
}

/// Re-encodes through ffmpeg's concat demuxer (libmp3lame)
pub struct FfmpegConcatenator {
    ffmpeg_path: String,
}

impl FfmpegConcatenator {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Contents of a concat demuxer list file
    fn concat_list(inputs: &[PathBuf]) -> String {
        inputs
            .iter()
            .map(|path| {
                let escaped = path.to_string_lossy().replace('\'', r"'\''");
                format!("file '{}'\n", escaped)
            })
            .collect()
    }
}

#[async_trait]
impl AudioConcatenator for FfmpegConcatenator {
    async fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            bail!("No audio files were generated for concatenation");
        }

        let list_path = output.with_extension("concat.txt");
        tokio::fs::write(&list_path, Self::concat_list(inputs))
            .await
            .with_context(|| format!("Failed to write concat list {}", list_path.display()))?;

        let partial = partial_path(output);
        let result = Command::new(&self.ffmpeg_path)
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c:a", "libmp3lame", "-f", "mp3"])
            .arg(&partial)
            .output()
            .await;

        let _ = tokio::fs::remove_file(&list_path).await;

        let output_status = result.context("Failed to run ffmpeg. Is ffmpeg installed?")?;
        if !output_status.status.success() {
            let _ = tokio::fs::remove_file(&partial).await;
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            bail!("ffmpeg concatenation failed: {}", stderr.trim());
        }

        tokio::fs::rename(&partial, output)
            .await
            .with_context(|| format!("Failed to move concatenated audio to {}", output.display()))?;

        tracing::debug!(
            inputs = inputs.len(),
            output = %output.display(),
            "ffmpeg concatenation finished"
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Appends MP3 frames back to back without re-encoding.
///
/// ID3v2 tags of every file after the first are dropped so players do not
/// stop at an embedded header.
pub struct Mp3FrameConcatenator;

impl Mp3FrameConcatenator {
    /// Length of a leading ID3v2 tag, header and footer included
    fn id3v2_len(data: &[u8]) -> usize {
        if data.len() < 10 || &data[..3] != b"ID3" {
            return 0;
        }
        let size = data[6..10]
            .iter()
            .fold(0usize, |acc, byte| (acc << 7) | usize::from(byte & 0x7f));
        let footer = if data[5] & 0x10 != 0 { 10 } else { 0 };
        (10 + size + footer).min(data.len())
    }
}

#[async_trait]
impl AudioConcatenator for Mp3FrameConcatenator {
    async fn concatenate(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            bail!("No audio files were generated for concatenation");
        }

        let mut merged = Vec::new();
        for (index, input) in inputs.iter().enumerate() {
            let data = tokio::fs::read(input)
                .await
                .with_context(|| format!("Failed to read audio chunk {}", input.display()))?;
            let skip = if index == 0 { 0 } else { Self::id3v2_len(&data) };
            merged.extend_from_slice(&data[skip..]);
        }

        let partial = partial_path(output);
        if let Err(e) = tokio::fs::write(&partial, &merged).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e).with_context(|| format!("Failed to write {}", partial.display()));
        }
        tokio::fs::rename(&partial, output)
            .await
            .with_context(|| format!("Failed to move concatenated audio to {}", output.display()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "frames"
    }
}
