//! FFmpeg Detection Module
//!
//! Locates and validates the ffmpeg/ffprobe pair, either from explicit
//! paths in [`MediaSettings`] or from the system installation.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::{FFmpegError, FFmpegResult};
use crate::core::process::configure_std_command;
use crate::core::settings::MediaSettings;

#[cfg(target_os = "windows")]
const EXE_SUFFIX: &str = ".exe";
#[cfg(not(target_os = "windows"))]
const EXE_SUFFIX: &str = "";

/// Information about a usable FFmpeg installation
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FFmpegInfo {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Version reported by `ffmpeg -version`
    pub version: String,
}

impl FFmpegInfo {
    /// Builds info from explicit binary paths and queries the version.
    pub fn from_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> FFmpegResult<Self> {
        if !ffmpeg_path.exists() || !ffprobe_path.exists() {
            return Err(FFmpegError::NotFound);
        }
        let version = get_ffmpeg_version(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            ffprobe_path,
            version,
        })
    }
}

/// Resolves FFmpeg from settings, falling back to detection.
///
/// A configured ffmpeg without a configured ffprobe looks for ffprobe next
/// to it first.
pub fn resolve_ffmpeg(media: &MediaSettings) -> FFmpegResult<FFmpegInfo> {
    match (&media.ffmpeg_path, &media.ffprobe_path) {
        (Some(ffmpeg), Some(ffprobe)) => FFmpegInfo::from_paths(ffmpeg.clone(), ffprobe.clone()),
        (Some(ffmpeg), None) => {
            let sibling = ffmpeg.with_file_name(binary_name("ffprobe"));
            let ffprobe = if sibling.exists() {
                sibling
            } else {
                find_binary("ffprobe")?
            };
            FFmpegInfo::from_paths(ffmpeg.clone(), ffprobe)
        }
        _ => detect_system_ffmpeg(),
    }
}

/// Detect FFmpeg from common install directories, then the system PATH.
pub fn detect_system_ffmpeg() -> FFmpegResult<FFmpegInfo> {
    let ffmpeg_path = find_binary("ffmpeg")?;
    let ffprobe_path = find_binary("ffprobe")?;
    let info = FFmpegInfo::from_paths(ffmpeg_path, ffprobe_path)?;
    info!(
        "Detected FFmpeg {} at {}",
        info.version,
        info.ffmpeg_path.display()
    );
    Ok(info)
}

fn binary_name(stem: &str) -> String {
    format!("{stem}{EXE_SUFFIX}")
}

fn find_binary(stem: &str) -> FFmpegResult<PathBuf> {
    let name = binary_name(stem);

    if let Some(path) = common_ffmpeg_dirs()
        .into_iter()
        .map(|dir| dir.join(&name))
        .find(|path| path.exists())
    {
        return Ok(path);
    }

    #[cfg(target_os = "windows")]
    let locator = "where";
    #[cfg(not(target_os = "windows"))]
    let locator = "which";

    let mut cmd = Command::new(locator);
    cmd.arg(stem);
    configure_std_command(&mut cmd);
    let output = cmd.output().map_err(|_| FFmpegError::NotFound)?;

    if !output.status.success() {
        debug!("{} did not find {}", locator, stem);
        return Err(FFmpegError::NotFound);
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
        .ok_or(FFmpegError::NotFound)
}

/// Common FFmpeg installation directories for the current platform
fn common_ffmpeg_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\ffmpeg\bin"));
        dirs.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));
        if let Ok(programdata) = std::env::var("ProgramData") {
            dirs.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }
        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            dirs.push(PathBuf::from(userprofile).join("scoop").join("shims"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/opt/homebrew/bin"));
        dirs.push(PathBuf::from("/usr/local/bin"));
        dirs.push(PathBuf::from("/opt/local/bin"));
    }

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/usr/bin"));
        dirs.push(PathBuf::from("/usr/local/bin"));
        dirs.push(PathBuf::from("/snap/bin"));
    }

    dirs
}

fn run_version(binary: &Path) -> FFmpegResult<String> {
    let mut cmd = Command::new(binary);
    cmd.arg("-version");
    configure_std_command(&mut cmd);
    let output = cmd.output().map_err(FFmpegError::ProcessError)?;

    if !output.status.success() {
        return Err(FFmpegError::ExecutionFailed(format!(
            "{} -version exited with {}",
            binary.display(),
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn get_ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    parse_version_line(&run_version(ffmpeg_path)?)
}

/// Extracts `X.Y.Z` from `ffmpeg version X.Y.Z ...`, or the whole first
/// line when it has another shape.
fn parse_version_line(output: &str) -> FFmpegResult<String> {
    let first_line = output
        .lines()
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| FFmpegError::ParseError("Empty -version output".to_string()))?;

    Ok(first_line
        .strip_prefix("ffmpeg version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(first_line)
        .to_string())
}

/// Validate that both binaries run.
pub fn validate_ffmpeg(info: &FFmpegInfo) -> FFmpegResult<()> {
    run_version(&info.ffmpeg_path)?;
    run_version(&info.ffprobe_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_dirs_not_empty() {
        assert!(!common_ffmpeg_dirs().is_empty());
    }

    #[test]
    fn test_parse_version_line() {
        let out = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023\nbuilt with gcc";
        assert_eq!(parse_version_line(out).unwrap(), "6.1.1-3ubuntu5");
        assert_eq!(parse_version_line("custom build").unwrap(), "custom build");
        assert!(matches!(
            parse_version_line(""),
            Err(FFmpegError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_paths_missing_binary() {
        let result = FFmpegInfo::from_paths(
            PathBuf::from("/nonexistent/ffmpeg"),
            PathBuf::from("/nonexistent/ffprobe"),
        );
        assert!(matches!(result, Err(FFmpegError::NotFound)));
    }

    #[test]
    fn test_resolve_with_missing_configured_paths() {
        let media = MediaSettings {
            ffmpeg_path: Some(PathBuf::from("/nonexistent/ffmpeg")),
            ffprobe_path: Some(PathBuf::from("/nonexistent/ffprobe")),
            ..MediaSettings::default()
        };
        assert!(matches!(resolve_ffmpeg(&media), Err(FFmpegError::NotFound)));
    }

    #[test]
    fn test_detect_system_ffmpeg() {
        // Passes whether or not FFmpeg is installed on the machine
        match detect_system_ffmpeg() {
            Ok(info) => {
                assert!(!info.version.is_empty());
                assert!(validate_ffmpeg(&info).is_ok());
            }
            Err(FFmpegError::NotFound) => {}
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }
}
