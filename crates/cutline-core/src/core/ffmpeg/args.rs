//! Argument builders for ffmpeg/ffprobe invocations.
//!
//! Pure functions only; [`super::FFmpegRunner`] feeds their output to the
//! binaries.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, TimeSec};

/// Encoder options for rendered transitions.
pub const TRANSITION_ENCODER_ARGS: [&str; 6] = ["-c:v", "libx264", "-preset", "fast", "-crf", "22"];

/// File name pattern for thumbnail strips; `%d` is the frame index.
pub const THUMBNAIL_PATTERN: &str = "thumb-%d.jpg";

/// Longest transition accepted, in seconds.
pub const MAX_TRANSITION_SECS: f64 = 60.0;

/// Shape of an `xfade` transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Fade,
    Dissolve,
    WipeLeft,
    WipeRight,
    SlideLeft,
    SlideRight,
    CircleOpen,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 7] = [
        TransitionKind::Fade,
        TransitionKind::Dissolve,
        TransitionKind::WipeLeft,
        TransitionKind::WipeRight,
        TransitionKind::SlideLeft,
        TransitionKind::SlideRight,
        TransitionKind::CircleOpen,
    ];

    /// Name understood by the `xfade` filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Fade => "fade",
            TransitionKind::Dissolve => "dissolve",
            TransitionKind::WipeLeft => "wipeleft",
            TransitionKind::WipeRight => "wiperight",
            TransitionKind::SlideLeft => "slideleft",
            TransitionKind::SlideRight => "slideright",
            TransitionKind::CircleOpen => "circleopen",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        TransitionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown transition kind: {s}")))
    }
}

/// A validated transition between the end of one clip and the start of
/// the next.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    kind: TransitionKind,
    duration: TimeSec,
    offset: Option<TimeSec>,
}

impl TransitionRequest {
    pub fn new(kind: TransitionKind, duration: TimeSec) -> CoreResult<Self> {
        if !duration.is_finite() || duration <= 0.0 || duration > MAX_TRANSITION_SECS {
            return Err(CoreError::ValidationError(format!(
                "Transition duration must be in (0, {MAX_TRANSITION_SECS}] seconds, got {duration}"
            )));
        }
        Ok(Self {
            kind,
            duration,
            offset: None,
        })
    }

    /// Starts the transition at `offset` seconds into the source instead
    /// of at its tail.
    pub fn with_offset(mut self, offset: TimeSec) -> CoreResult<Self> {
        if !offset.is_finite() || offset < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Transition offset must be a non-negative number, got {offset}"
            )));
        }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn duration(&self) -> TimeSec {
        self.duration
    }

    /// Offset into the source; defaults to the last `duration` seconds.
    pub fn offset_for(&self, source_duration: TimeSec) -> TimeSec {
        self.offset
            .unwrap_or_else(|| (source_duration - self.duration).max(0.0))
    }
}

/// Frame geometry both inputs are conformed to before blending.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30.0,
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn probe_args(input: &Path) -> Vec<String> {
    vec![
        "-v".into(),
        "quiet".into(),
        "-print_format".into(),
        "json".into(),
        "-show_format".into(),
        "-show_streams".into(),
        path_arg(input),
    ]
}

/// Seconds between thumbnails so that about `count` frames cover
/// `duration`. Never below one second.
pub fn thumbnail_interval(duration: TimeSec, count: u32) -> u64 {
    if !duration.is_finite() || duration <= 0.0 || count == 0 {
        return 1;
    }
    ((duration / f64::from(count)).ceil() as u64).max(1)
}

pub fn thumbnail_args(input: &Path, output_dir: &Path, interval_secs: u64) -> Vec<String> {
    vec![
        "-i".into(),
        path_arg(input),
        "-vf".into(),
        format!("fps=1/{interval_secs}"),
        "-frame_pts".into(),
        "1".into(),
        "-f".into(),
        "image2".into(),
        "-y".into(),
        path_arg(&output_dir.join(THUMBNAIL_PATTERN)),
    ]
}

/// Seeks before `-i` so the decoder starts at the nearest keyframe.
pub fn extract_frame_args(input: &Path, time: TimeSec, output: &Path) -> Vec<String> {
    vec![
        "-ss".into(),
        format!("{:.3}", time.max(0.0)),
        "-i".into(),
        path_arg(input),
        "-frames:v".into(),
        "1".into(),
        "-q:v".into(),
        "2".into(),
        "-y".into(),
        path_arg(output),
    ]
}

/// Filter graph scaling both inputs to `geometry` and blending them with
/// `xfade`. The result is labelled `[v]`.
pub fn transition_filter(
    request: &TransitionRequest,
    offset: TimeSec,
    geometry: FrameGeometry,
) -> String {
    let conform = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}",
        w = geometry.width,
        h = geometry.height,
        fps = geometry.fps,
    );
    format!(
        "[0:v]{conform}[a];[1:v]{conform}[b];[a][b]xfade=transition={}:duration={:.4}:offset={:.4}[v]",
        request.kind().as_str(),
        request.duration(),
        offset,
    )
}

pub fn transition_args(source: &Path, target: &Path, filter: &str, output: &Path) -> Vec<String> {
    let mut args = vec![
        "-i".into(),
        path_arg(source),
        "-i".into(),
        path_arg(target),
        "-filter_complex".into(),
        filter.to_string(),
        "-map".into(),
        "[v]".into(),
        "-an".into(),
    ];
    args.extend(TRANSITION_ENCODER_ARGS.iter().map(|s| s.to_string()));
    args.push("-y".into());
    args.push(path_arg(output));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_transition_kind_parse() {
        assert_eq!("fade".parse::<TransitionKind>().unwrap(), TransitionKind::Fade);
        assert_eq!(
            "wipe-left".parse::<TransitionKind>().unwrap(),
            TransitionKind::WipeLeft
        );
        assert_eq!(
            "CircleOpen".parse::<TransitionKind>().unwrap(),
            TransitionKind::CircleOpen
        );
        assert!("zoom".parse::<TransitionKind>().is_err());
    }

    #[test]
    fn test_transition_kind_serde_matches_filter_name() {
        for kind in TransitionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_transition_request_validation() {
        assert!(TransitionRequest::new(TransitionKind::Fade, 1.0).is_ok());
        assert!(TransitionRequest::new(TransitionKind::Fade, 0.0).is_err());
        assert!(TransitionRequest::new(TransitionKind::Fade, f64::NAN).is_err());
        assert!(TransitionRequest::new(TransitionKind::Fade, 61.0).is_err());

        let request = TransitionRequest::new(TransitionKind::Fade, 1.0).unwrap();
        assert!(request.with_offset(-1.0).is_err());
    }

    #[test]
    fn test_transition_offset_defaults_to_tail() {
        let request = TransitionRequest::new(TransitionKind::Dissolve, 2.0).unwrap();
        assert_eq!(request.offset_for(10.0), 8.0);
        assert_eq!(request.offset_for(1.0), 0.0);
        assert_eq!(request.with_offset(3.5).unwrap().offset_for(10.0), 3.5);
    }

    #[test]
    fn test_thumbnail_interval() {
        assert_eq!(thumbnail_interval(120.0, 30), 4);
        assert_eq!(thumbnail_interval(100.0, 30), 4);
        assert_eq!(thumbnail_interval(10.0, 30), 1);
        assert_eq!(thumbnail_interval(0.0, 30), 1);
        assert_eq!(thumbnail_interval(f64::INFINITY, 30), 1);
        assert_eq!(thumbnail_interval(60.0, 0), 1);
    }

    #[test]
    fn test_thumbnail_args() {
        let args = thumbnail_args(Path::new("in.mp4"), Path::new("/tmp/thumbs"), 4);
        assert_eq!(args[0..2], ["-i", "in.mp4"]);
        assert!(args.windows(2).any(|w| w == ["-vf", "fps=1/4"]));
        assert!(args.windows(2).any(|w| w == ["-frame_pts", "1"]));
        let expected: String = PathBuf::from("/tmp/thumbs")
            .join("thumb-%d.jpg")
            .to_string_lossy()
            .into_owned();
        assert_eq!(args.last().unwrap(), &expected);
    }

    #[test]
    fn test_extract_frame_args_seek_first() {
        let args = extract_frame_args(Path::new("in.mp4"), 12.3456, Path::new("out.jpg"));
        assert_eq!(args[0..4], ["-ss", "12.346", "-i", "in.mp4"]);
        assert_eq!(args.last().unwrap(), "out.jpg");

        let args = extract_frame_args(Path::new("in.mp4"), -1.0, Path::new("out.jpg"));
        assert_eq!(args[1], "0.000");
    }

    #[test]
    fn test_transition_filter() {
        let request = TransitionRequest::new(TransitionKind::WipeLeft, 1.5).unwrap();
        let filter = transition_filter(
            &request,
            8.5,
            FrameGeometry {
                width: 1280,
                height: 720,
                fps: 25.0,
            },
        );
        assert!(filter.starts_with("[0:v]scale=1280:720"));
        assert!(filter.contains("fps=25[a];[1:v]"));
        assert!(
            filter.ends_with("[a][b]xfade=transition=wipeleft:duration=1.5000:offset=8.5000[v]")
        );
    }

    #[test]
    fn test_transition_args_encoder() {
        let args = transition_args(
            Path::new("a.mp4"),
            Path::new("b.mp4"),
            "FILTER",
            Path::new("out.mp4"),
        );
        assert_eq!(args[0..4], ["-i", "a.mp4", "-i", "b.mp4"]);
        assert!(args.windows(2).any(|w| w == ["-filter_complex", "FILTER"]));
        assert!(args.windows(2).any(|w| w == ["-map", "[v]"]));
        assert!(args
            .windows(6)
            .any(|w| w == ["-c:v", "libx264", "-preset", "fast", "-crf", "22"]));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }
}
