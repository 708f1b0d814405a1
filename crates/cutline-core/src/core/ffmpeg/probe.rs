//! ffprobe JSON parsing.

use serde::{Deserialize, Serialize};

use super::{FFmpegError, FFmpegResult};
use crate::core::TimeSec;

/// Media information extracted by ffprobe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub duration: TimeSec,
    /// Container format, e.g. `mov,mp4,m4a,3gp,3g2,mj2`
    pub format: String,
    pub size_bytes: u64,
    pub video: Option<VideoStreamInfo>,
    pub audio: Option<AudioStreamInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStreamInfo {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub pixel_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioStreamInfo {
    pub codec: String,
    pub sample_rate: u32,
    pub channels: u32,
}

// ffprobe reports most numbers as strings.
#[derive(Deserialize)]
struct RawProbe {
    format: Option<RawFormat>,
    #[serde(default)]
    streams: Vec<RawStream>,
}

#[derive(Deserialize)]
struct RawFormat {
    duration: Option<String>,
    size: Option<String>,
    format_name: Option<String>,
}

#[derive(Deserialize)]
struct RawStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    pix_fmt: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

const DEFAULT_FPS: f64 = 30.0;

/// Parses `ffprobe -print_format json -show_format -show_streams` output.
///
/// Only the first video and first audio stream are kept.
pub fn parse_probe_output(json: &str) -> FFmpegResult<MediaInfo> {
    let raw: RawProbe = serde_json::from_str(json)
        .map_err(|e| FFmpegError::ParseError(format!("Failed to parse ffprobe output: {e}")))?;

    let format = raw
        .format
        .ok_or_else(|| FFmpegError::ParseError("Missing format info".to_string()))?;

    let duration = format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    let video = raw
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .map(|s| VideoStreamInfo {
            codec: codec_name(s),
            width: s.width.unwrap_or(0),
            height: s.height.unwrap_or(0),
            fps: s
                .r_frame_rate
                .as_deref()
                .and_then(parse_frame_rate)
                .unwrap_or(DEFAULT_FPS),
            pixel_format: s.pix_fmt.clone(),
        });

    let audio = raw
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|s| AudioStreamInfo {
            codec: codec_name(s),
            sample_rate: s
                .sample_rate
                .as_deref()
                .and_then(|r| r.parse().ok())
                .unwrap_or(0),
            channels: s.channels.unwrap_or(0),
        });

    Ok(MediaInfo {
        duration,
        format: format.format_name.unwrap_or_else(|| "unknown".to_string()),
        size_bytes: format.size.and_then(|s| s.parse().ok()).unwrap_or(0),
        video,
        audio,
    })
}

fn codec_name(stream: &RawStream) -> String {
    stream
        .codec_name
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}

/// `"30000/1001"` or `"25"` to frames per second. `None` for `0/0`.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "pix_fmt": "yuv420p",
                "r_frame_rate": "30000/1001"
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 2
            },
            {
                "index": 2,
                "codec_name": "mjpeg",
                "codec_type": "video",
                "width": 320,
                "height": 180,
                "r_frame_rate": "90000/1"
            }
        ],
        "format": {
            "filename": "clip.mp4",
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "duration": "12.345000",
            "size": "1048576"
        }
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let info = parse_probe_output(SAMPLE).unwrap();
        assert_eq!(info.duration, 12.345);
        assert_eq!(info.format, "mov,mp4,m4a,3gp,3g2,mj2");
        assert_eq!(info.size_bytes, 1_048_576);

        let video = info.video.unwrap();
        assert_eq!(video.codec, "h264");
        assert_eq!((video.width, video.height), (1920, 1080));
        assert!((video.fps - 29.97).abs() < 0.01);
        assert_eq!(video.pixel_format.as_deref(), Some("yuv420p"));

        let audio = info.audio.unwrap();
        assert_eq!(audio.codec, "aac");
        assert_eq!(audio.sample_rate, 48_000);
        assert_eq!(audio.channels, 2);
    }

    #[test]
    fn test_audio_only_file() {
        let json = r#"{
            "streams": [{ "codec_name": "mp3", "codec_type": "audio", "sample_rate": "44100", "channels": 1 }],
            "format": { "format_name": "mp3", "duration": "3.0" }
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!(info.video.is_none());
        assert_eq!(info.audio.unwrap().channels, 1);
        assert_eq!(info.size_bytes, 0);
    }

    #[test]
    fn test_missing_format_is_error() {
        let err = parse_probe_output(r#"{ "streams": [] }"#).unwrap_err();
        assert!(matches!(err, FFmpegError::ParseError(_)));
        assert!(matches!(
            parse_probe_output("not json"),
            Err(FFmpegError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let info = parse_probe_output(SAMPLE).unwrap();
        let value = serde_json::to_value(&info).unwrap();
        assert!(value.get("sizeBytes").is_some());
        assert!(value["video"].get("pixelFormat").is_some());
        assert!(value["audio"].get("sampleRate").is_some());
    }
}
