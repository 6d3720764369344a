//! Transcoding adapter - converts a buffered upload to the archival encoding

use crate::artifact::TempArtifact;
use async_trait::async_trait;
use clipvault_core::{AudioFormat, PipelineError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;

const STDERR_TAIL_LINES: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Unsupported target format: {0}")]
    UnsupportedFormat(AudioFormat),

    #[error("Failed to execute ffmpeg: {0}")]
    Spawn(String),

    #[error("FFmpeg transcode failed ({status}): {stderr_tail}")]
    Failed { status: String, stderr_tail: String },

    #[error("FFmpeg produced an empty output file")]
    EmptyOutput,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<TranscodeError> for PipelineError {
    fn from(err: TranscodeError) -> Self {
        PipelineError::Transcode(err.to_string())
    }
}

/// Converts an input artifact to `target`, returning a new artifact the caller owns.
///
/// Implementations must not touch `input` beyond reading it.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(
        &self,
        input: &TempArtifact,
        source: AudioFormat,
        target: AudioFormat,
    ) -> Result<TempArtifact, TranscodeError>;
}

/// ffmpeg codec and muxer for a target format.
fn codec_for(format: AudioFormat) -> Option<(&'static str, &'static str)> {
    match format {
        AudioFormat::Mp3 => Some(("libmp3lame", "mp3")),
        AudioFormat::Wav => Some(("pcm_s16le", "wav")),
        AudioFormat::Ogg => Some(("libvorbis", "ogg")),
        AudioFormat::Flac => Some(("flac", "flac")),
        AudioFormat::Aac => Some(("aac", "adts")),
        AudioFormat::M4a => Some(("aac", "ipod")),
        AudioFormat::Webm => Some(("libopus", "webm")),
        AudioFormat::Unknown => None,
    }
}

fn build_args(input: &Path, output: &Path, codec: &str, muxer: &str) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vn".to_string(),
        "-acodec".to_string(),
        codec.to_string(),
        "-f".to_string(),
        muxer.to_string(),
        "-y".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// ffmpeg-backed transcoder. Concurrent runs are capped by a semaphore.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    work_dir: PathBuf,
    permits: Arc<Semaphore>,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: String, work_dir: PathBuf, max_concurrent: usize) -> Self {
        Self {
            ffmpeg_path,
            work_dir,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &TempArtifact,
        source: AudioFormat,
        target: AudioFormat,
    ) -> Result<TempArtifact, TranscodeError> {
        let (codec, muxer) = codec_for(target).ok_or(TranscodeError::UnsupportedFormat(target))?;

        let output = TempArtifact::create_in(
            &self.work_dir,
            &format!(".{}", target.extension()),
            "transcoded",
        )
        .await?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| TranscodeError::Spawn(e.to_string()))?;

        let args = build_args(input.path(), output.path(), codec, muxer);
        let start = std::time::Instant::now();

        // kill_on_drop so a timed-out or cancelled submission does not leave ffmpeg running.
        let result = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TranscodeError::Spawn(e.to_string()))?;

        if !result.status.success() {
            let tail = stderr_tail(&result.stderr);
            tracing::error!(
                source = %source,
                target = %target,
                status = %result.status,
                stderr = %tail,
                "FFmpeg transcode failed"
            );
            return Err(TranscodeError::Failed {
                status: result.status.to_string(),
                stderr_tail: tail,
            });
        }

        if output.size().await? == 0 {
            return Err(TranscodeError::EmptyOutput);
        }

        tracing::info!(
            source = %source,
            target = %target,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Audio transcoded"
        );

        Ok(output)
    }
}
