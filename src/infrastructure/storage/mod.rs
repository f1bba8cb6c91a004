use crate::domain::dialogue::AudioArtifact;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where narration audio lives on disk: a scratch namespace per run under
/// `temp_dir`, and published narrations under `output_dir`.
pub struct ArtifactStore {
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(temp_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Create the output and scratch directories if missing
    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create output dir {}", self.output_dir.display()))?;
        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .with_context(|| format!("Failed to create temp dir {}", self.temp_dir.display()))?;
        Ok(())
    }

    /// Open the scratch namespace for one run
    pub async fn begin_run(&self, run_id: Uuid) -> Result<RunArtifacts> {
        let dir = self.temp_dir.join(format!("dialogcast-{}", run_id));
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create run dir {}", dir.display()))?;
        Ok(RunArtifacts {
            dir,
            written: Mutex::new(Vec::new()),
        })
    }

    /// Move a finished narration into the output directory
    pub async fn publish(&self, source: &Path, file_name: &str) -> Result<PathBuf> {
        let target = self.output_dir.join(file_name);
        if tokio::fs::rename(source, &target).await.is_err() {
            // rename fails across filesystems; fall back to copy + remove
            tokio::fs::copy(source, &target)
                .await
                .with_context(|| format!("Failed to publish narration to {}", target.display()))?;
            tokio::fs::remove_file(source)
                .await
                .with_context(|| format!("Failed to remove {}", source.display()))?;
        }
        Ok(target)
    }

    /// Path of a published narration, if the name is safe and the file exists
    pub async fn resolve_download(&self, file_name: &str) -> Option<PathBuf> {
        if !is_safe_file_name(file_name) {
            return None;
        }
        let path = self.output_dir.join(file_name);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Some(path),
            _ => None,
        }
    }

    /// Whether the output directory accepts new files
    pub async fn check_writable(&self) -> bool {
        let marker = self.output_dir.join(format!(".marker-{}", Uuid::new_v4()));
        match tokio::fs::write(&marker, b"").await {
            Ok(()) => tokio::fs::remove_file(&marker).await.is_ok(),
            Err(_) => false,
        }
    }
}

/// Published names are generated by the service; anything else is refused
pub fn is_safe_file_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.starts_with('.')
        && file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Scratch files of a single run.
///
/// Files are registered before they are written so cleanup also catches
/// partially written chunks and chunks finished by in-flight batches after
/// the run already failed.
#[derive(Debug)]
pub struct RunArtifacts {
    dir: PathBuf,
    written: Mutex<Vec<PathBuf>>,
}

impl RunArtifacts {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target for the concatenated narration before it is published
    pub fn concat_target(&self) -> PathBuf {
        self.dir.join("final_output.mp3")
    }

    pub async fn write_chunk(
        &self,
        batch_index: usize,
        sub_index: usize,
        audio: &[u8],
    ) -> Result<AudioArtifact> {
        let path = self
            .dir
            .join(format!("chunk_{}_{}.mp3", batch_index, sub_index));
        self.written.lock().push(path.clone());

        tokio::fs::write(&path, audio)
            .await
            .with_context(|| format!("Failed to write audio chunk {}", path.display()))?;

        Ok(AudioArtifact {
            batch_index,
            sub_index,
            path,
        })
    }

    pub fn written(&self) -> Vec<PathBuf> {
        self.written.lock().clone()
    }

    /// Remove every chunk and the run directory.
    ///
    /// Best effort: returns the paths that could not be removed with the reason.
    pub async fn cleanup(&self) -> Vec<(PathBuf, String)> {
        let paths = std::mem::take(&mut *self.written.lock());
        let mut failures = Vec::new();

        for path in paths {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => failures.push((path, e.to_string())),
            }
        }

        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => failures.push((self.dir.clone(), e.to_string())),
        }

        failures
    }
}
