//! ffmpeg invocation for trimming

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::Config;

/// Bytes of ffmpeg stderr kept in error messages
const STDERR_TAIL: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("invalid trim range: {0}")]
    InvalidRange(String),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("ffmpeg trim failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },
}

/// The `[start, end)` window of a trim, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    pub fn new(start: f64, end: f64) -> Result<Self, TranscodeError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(TranscodeError::InvalidRange("start and end must be finite".into()));
        }
        if start < 0.0 {
            return Err(TranscodeError::InvalidRange("start must not be negative".into()));
        }
        if end <= start {
            return Err(TranscodeError::InvalidRange("end must be after start".into()));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone)]
pub struct Transcoder {
    program: String,
    stream_copy: bool,
}

impl Transcoder {
    pub fn new(program: impl Into<String>, stream_copy: bool) -> Self {
        Self {
            program: program.into(),
            stream_copy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.ffmpeg_stream_copy)
    }

    /// `-ss` before `-i` seeks the input; `-t` bounds the output length.
    pub fn trim_args(&self, input: &str, range: TrimRange, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-ss".to_string(),
            range.start.to_string(),
            "-i".to_string(),
            input.to_string(),
            "-t".to_string(),
            range.duration().to_string(),
        ];
        if self.stream_copy {
            args.push("-c".to_string());
            args.push("copy".to_string());
        }
        args.push(output.to_string_lossy().into_owned());
        args
    }

    pub async fn trim(&self, input: &str, range: TrimRange, output: &Path) -> Result<(), TranscodeError> {
        let args = self.trim_args(input, range, output);
        tracing::debug!(program = %self.program, ?args, "Running transcoder");

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail_start = stderr
                .char_indices()
                .rev()
                .nth(STDERR_TAIL.saturating_sub(1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            return Err(TranscodeError::Failed {
                status: result.status.to_string(),
                stderr: stderr[tail_start..].trim().to_string(),
            });
        }

        Ok(())
    }
}
