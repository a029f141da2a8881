//! Media conversion: resolved video URL to a short looping GIF.
//!
//! ffmpeg is a black box behind the `MediaTranscoder` trait; the rest of the
//! system only supplies a URL and duration/size budgets and deletes the
//! returned file once it has been sent.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const ENCODE_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors inside one conversion attempt. These never escape the trait
/// boundary; `to_short_clip` folds them all into `None`.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffmpeg timed out after {0:?}")]
    Timeout(Duration),

    #[error("ffmpeg exited with {code}: {stderr}")]
    Encoder { code: i32, stderr: String },
}

/// Encoder settings for one attempt.
#[derive(Debug, Clone, Copy)]
struct QualityPass {
    fps: u32,
    width: u32,
}

/// Full quality first, then one retry at reduced settings when the output
/// blows the size budget.
const QUALITY_PASSES: [QualityPass; 2] = [
    QualityPass { fps: 15, width: 480 },
    QualityPass { fps: 10, width: 320 },
];

/// Converts a video URL into a short local animation within a declared
/// duration and size budget.
#[async_trait]
pub trait MediaTranscoder: Send + Sync {
    /// Returns the path of the finished file, or `None` on
    /// failure/oversize/timeout. Callers own the returned file and should
    /// delete it as soon as it has been used.
    async fn to_short_clip(
        &self,
        source_url: &str,
        is_segmented: bool,
        max_duration_secs: u32,
        max_output_bytes: u64,
    ) -> Option<PathBuf>;
}

/// ffmpeg-backed transcoder using a two-pass palette encode.
pub struct FfmpegTranscoder {
    binary_path: String,
    client: reqwest::Client,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::with_binary_path("ffmpeg")
    }

    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Stream a direct file to disk. Playlist URLs skip this and are handed
    /// to ffmpeg directly.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), TranscodeError> {
        let mut response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    async fn run_ffmpeg(&self, args: &[String]) -> Result<(), TranscodeError> {
        let child = Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = timeout(ENCODE_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| TranscodeError::Timeout(ENCODE_TIMEOUT))??;

        if !output.status.success() {
            return Err(TranscodeError::Encoder {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Two-pass palette encode: palette generation, then paletted GIF.
    async fn encode(
        &self,
        input: &str,
        scratch: &Path,
        output: &Path,
        max_duration_secs: u32,
        pass: QualityPass,
    ) -> Result<(), TranscodeError> {
        let palette = scratch.join(format!("palette_{}.png", pass.fps));
        let duration = max_duration_secs.to_string();

        let palette_args = vec![
            "-i".to_string(),
            input.to_string(),
            "-t".to_string(),
            duration.clone(),
            "-vf".to_string(),
            format!(
                "fps={},scale={}:-1:flags=lanczos,palettegen=stats_mode=diff",
                pass.fps, pass.width
            ),
            "-y".to_string(),
            palette.to_string_lossy().to_string(),
        ];
        self.run_ffmpeg(&palette_args).await?;

        let gif_args = vec![
            "-i".to_string(),
            input.to_string(),
            "-i".to_string(),
            palette.to_string_lossy().to_string(),
            "-t".to_string(),
            duration,
            "-lavfi".to_string(),
            format!(
                "fps={fps},scale={w}:-1:flags=lanczos[x];[x][1:v]paletteuse=dither=bayer:bayer_scale=5",
                fps = pass.fps,
                w = pass.width
            ),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ];
        self.run_ffmpeg(&gif_args).await
    }

    async fn convert(
        &self,
        source_url: &str,
        is_segmented: bool,
        max_duration_secs: u32,
        max_output_bytes: u64,
    ) -> Result<Option<PathBuf>, TranscodeError> {
        let scratch = tempfile::tempdir()?;

        let input = if is_segmented {
            source_url.to_string()
        } else {
            let source = scratch.path().join("source.mp4");
            self.download(source_url, &source).await?;
            source.to_string_lossy().to_string()
        };

        let output = std::env::temp_dir().join(format!("dinger_{}.gif", Uuid::new_v4().simple()));

        for pass in QUALITY_PASSES {
            if let Err(e) = self
                .encode(&input, scratch.path(), &output, max_duration_secs, pass)
                .await
            {
                warn!(error = %e, fps = pass.fps, "encode pass failed");
                continue;
            }

            let size = tokio::fs::metadata(&output).await.map(|m| m.len()).unwrap_or(0);
            if size == 0 {
                continue;
            }
            if size <= max_output_bytes {
                info!(path = %output.display(), size, "clip encoded");
                return Ok(Some(output));
            }
            warn!(
                size,
                max_output_bytes,
                fps = pass.fps,
                "clip over size budget, retrying at reduced quality"
            );
        }

        // Nothing under budget; clean up any oversized leftover.
        let _ = tokio::fs::remove_file(&output).await;
        Ok(None)
    }
}

#[async_trait]
impl MediaTranscoder for FfmpegTranscoder {
    async fn to_short_clip(
        &self,
        source_url: &str,
        is_segmented: bool,
        max_duration_secs: u32,
        max_output_bytes: u64,
    ) -> Option<PathBuf> {
        match self
            .convert(source_url, is_segmented, max_duration_secs, max_output_bytes)
            .await
        {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, source_url, "transcode failed");
                None
            }
        }
    }
}
