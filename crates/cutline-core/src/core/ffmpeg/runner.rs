//! FFmpeg Runner Module
//!
//! Executes ffmpeg/ffprobe for probing, thumbnails, frames and transitions.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::args::{self, FrameGeometry, TransitionRequest};
use super::probe::{parse_probe_output, MediaInfo};
use super::{FFmpegError, FFmpegInfo, FFmpegResult};
use crate::core::fs::validate_path_component;
use crate::core::process::tool_command;
use crate::core::{CoreResult, TimeSec};

/// FFmpeg Runner for executing media commands
#[derive(Clone, Debug)]
pub struct FFmpegRunner {
    info: Arc<FFmpegInfo>,
    timeout: Option<Duration>,
}

impl FFmpegRunner {
    pub fn new(info: FFmpegInfo) -> Self {
        Self {
            info: Arc::new(info),
            timeout: None,
        }
    }

    /// Kill any invocation that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn info(&self) -> &FFmpegInfo {
        &self.info
    }

    async fn run(&self, program: &Path, args: &[String]) -> FFmpegResult<Output> {
        debug!("Running {} {}", program.display(), args.join(" "));
        let mut cmd = tool_command(program, args);
        let future = cmd.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, future)
                .await
                .map_err(|_| FFmpegError::Timeout)?,
            None => future.await,
        };
        output.map_err(FFmpegError::ProcessError)
    }

    async fn run_ffmpeg(&self, args: &[String], what: &str) -> FFmpegResult<()> {
        let output = self.run(&self.info.ffmpeg_path, args).await?;
        if !output.status.success() {
            return Err(FFmpegError::ExecutionFailed(format!(
                "{} failed ({}): {}",
                what,
                output.status,
                last_stderr_line(&output.stderr)
            )));
        }
        Ok(())
    }

    /// Probe media file to get information
    pub async fn probe(&self, input: &Path) -> FFmpegResult<MediaInfo> {
        ensure_input(input)?;

        let output = self
            .run(&self.info.ffprobe_path, &args::probe_args(input))
            .await?;
        if !output.status.success() {
            return Err(FFmpegError::ProbeError(format!(
                "ffprobe exited with {}: {}",
                output.status,
                last_stderr_line(&output.stderr)
            )));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    /// Samples about `count` frames evenly across `duration` into
    /// `output_dir` as `thumb-N.jpg`.
    ///
    /// Returns the written files ordered by frame index.
    pub async fn generate_thumbnails(
        &self,
        input: &Path,
        output_dir: &Path,
        duration: TimeSec,
        count: u32,
    ) -> FFmpegResult<Vec<PathBuf>> {
        ensure_input(input)?;
        create_dir(output_dir)?;

        let interval = args::thumbnail_interval(duration, count);
        self.run_ffmpeg(
            &args::thumbnail_args(input, output_dir, interval),
            "Thumbnail generation",
        )
        .await?;

        let files = list_thumbnails(output_dir)?;
        info!(
            "Generated {} thumbnails for {} (every {}s)",
            files.len(),
            input.display(),
            interval
        );
        Ok(files)
    }

    /// Thumbnail strip stored under `root/<video_name>`.
    ///
    /// `video_name` must be a single path component.
    pub async fn thumbnails_for(
        &self,
        input: &Path,
        root: &Path,
        video_name: &str,
        duration: TimeSec,
        count: u32,
    ) -> CoreResult<Vec<PathBuf>> {
        validate_path_component(video_name, "videoName")?;
        let files = self
            .generate_thumbnails(input, &root.join(video_name), duration, count)
            .await?;
        Ok(files)
    }

    /// Extract a single frame at `time` seconds
    pub async fn extract_frame(&self, input: &Path, time: TimeSec, output: &Path) -> FFmpegResult<()> {
        ensure_input(input)?;
        if let Some(parent) = output.parent() {
            create_dir(parent)?;
        }
        self.run_ffmpeg(
            &args::extract_frame_args(input, time, output),
            "Frame extraction",
        )
        .await
    }

    /// Renders `source` blending into `target` with an `xfade` transition.
    ///
    /// Both clips are conformed to the source's frame size and rate. The
    /// output has no audio track.
    pub async fn render_transition(
        &self,
        source: &Path,
        target: &Path,
        request: &TransitionRequest,
        output: &Path,
    ) -> FFmpegResult<()> {
        ensure_input(target)?;
        let media = self.probe(source).await?;

        let geometry = media
            .video
            .as_ref()
            .filter(|v| v.width > 0 && v.height > 0)
            .map(|v| FrameGeometry {
                width: v.width,
                height: v.height,
                fps: v.fps,
            })
            .unwrap_or_default();
        let offset = request.offset_for(media.duration);

        if let Some(parent) = output.parent() {
            create_dir(parent)?;
        }

        let filter = args::transition_filter(request, offset, geometry);
        self.run_ffmpeg(
            &args::transition_args(source, target, &filter, output),
            "Transition render",
        )
        .await?;

        info!(
            "Rendered {} transition ({:.2}s at {:.2}s) to {}",
            request.kind(),
            request.duration(),
            offset,
            output.display()
        );
        Ok(())
    }
}

fn ensure_input(input: &Path) -> FFmpegResult<()> {
    if !input.is_file() {
        return Err(FFmpegError::InvalidInput(format!(
            "Input file does not exist: {}",
            input.display()
        )));
    }
    Ok(())
}

fn create_dir(dir: &Path) -> FFmpegResult<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| {
        FFmpegError::OutputError(format!(
            "Failed to create output directory {}: {}",
            dir.display(),
            e
        ))
    })
}

fn last_stderr_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no output")
        .to_string()
}

/// Index of a `thumb-N.jpg` file name.
fn thumbnail_index(name: &str) -> Option<u64> {
    name.strip_prefix("thumb-")?
        .strip_suffix(".jpg")?
        .parse()
        .ok()
}

fn list_thumbnails(dir: &Path) -> FFmpegResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        FFmpegError::OutputError(format!("Failed to read {}: {}", dir.display(), e))
    })?;

    let mut indexed: Vec<(u64, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let index = thumbnail_index(&entry.file_name().to_string_lossy())?;
            Some((index, entry.path()))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, path)| path).collect())
}
