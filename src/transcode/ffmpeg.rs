use std::io::ErrorKind;
use std::path::Path;
use std::process::{Output as ProcessOutput, Stdio};

use serde::Deserialize;
use tempfile::TempPath;
use tokio::process::Command;
use tracing::debug;

use crate::config::{ConcatMode, TranscoderConfig};
use crate::error::{TranscodeError, TranscodeResult};
use crate::transcode::types::{AssetMetadata, Clip, Output, ScratchSpace, StillImage, StreamParams};
use crate::transcode::Transcoder;

/// Transcoder backed by the `ffmpeg` and `ffprobe` executables
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
    concat_mode: ConcatMode,
    scratch: ScratchSpace,
}

impl FfmpegTranscoder {
    pub fn new(config: TranscoderConfig, concat_mode: ConcatMode) -> Self {
        let scratch = ScratchSpace::new(config.temp_dir.clone());
        Self { config, concat_mode, scratch }
    }

    /// Make sure both tools can be started
    pub async fn check_available(&self) -> TranscodeResult<()> {
        for tool in [&self.config.ffmpeg_path, &self.config.ffprobe_path] {
            let status = Command::new(tool)
                .arg("-version")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;

            match status {
                Ok(status) if status.success() => debug!("{} is available", tool),
                _ => return Err(TranscodeError::ToolNotFound { tool: tool.clone() }),
            }
        }

        Ok(())
    }

    fn ffmpeg_command(&self) -> Command {
        let mut cmd = Command::new(&self.config.ffmpeg_path);
        cmd.args(["-y", "-loglevel", self.config.log_level.as_str()]);
        cmd
    }

    async fn run(&self, mut cmd: Command) -> TranscodeResult<ProcessOutput> {
        let tool = cmd.as_std().get_program().to_string_lossy().into_owned();
        debug!("Running {:?}", cmd.as_std());

        let output = cmd
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => TranscodeError::ToolNotFound { tool: tool.clone() },
                _ => TranscodeError::Io(e),
            })?;

        if !output.status.success() {
            return Err(TranscodeError::CommandFailed {
                tool,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }

    async fn probe_file(&self, path: &Path) -> TranscodeResult<AssetMetadata> {
        let mut cmd = Command::new(&self.config.ffprobe_path);
        cmd.args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
            "-select_streams", "v:0",
        ])
        .arg(path);

        let output = self.run(cmd).await?;
        parse_probe_output(path, &output.stdout)
    }

    /// Check and measure a freshly written clip
    async fn finish_clip(&self, path: TempPath) -> TranscodeResult<Clip> {
        ensure_artifact(&path).await?;
        let probed = self.probe_file(&path).await?;
        Ok(Clip::new(path, probed.duration).with_stream(probed.stream))
    }

    async fn write_concat_list(&self, clips: &[Clip]) -> TranscodeResult<TempPath> {
        let list = self.scratch.file(".txt")?;
        tokio::fs::write(&list, concat_list(clips)).await?;
        Ok(list)
    }
}

impl Transcoder for FfmpegTranscoder {
    async fn probe(&self, asset: &Path) -> TranscodeResult<AssetMetadata> {
        self.probe_file(asset).await
    }

    async fn extract_subclip(&self, asset: &Path, start: f64, duration: f64) -> TranscodeResult<Clip> {
        let path = self.scratch.file(".mp4")?;

        // Output seeking: slower than input seeking but frame accurate
        let mut cmd = self.ffmpeg_command();
        cmd.arg("-i").arg(asset)
            .arg("-ss").arg(seconds(start))
            .arg("-t").arg(seconds(duration))
            .args(["-an", "-pix_fmt", self.config.pixel_format.as_str()])
            .arg(&*path);

        self.run(cmd).await?;
        self.finish_clip(path).await
    }

    async fn extract_frame(&self, asset: &Path, time: f64) -> TranscodeResult<StillImage> {
        let path = self.scratch.file(".jpg")?;

        let mut cmd = self.ffmpeg_command();
        cmd.arg("-ss").arg(seconds(time))
            .arg("-i").arg(asset)
            .args(["-frames:v", "1"])
            .arg("-q:v").arg(self.config.still_quality.to_string())
            .arg(&*path);

        self.run(cmd).await?;
        ensure_artifact(&path).await?;
        Ok(StillImage::new(path))
    }

    async fn image_to_video(&self, image: &StillImage, duration: f64, frame_rate: f64) -> TranscodeResult<Clip> {
        let path = self.scratch.file(".mp4")?;

        let mut cmd = self.ffmpeg_command();
        cmd.args(["-loop", "1"])
            .arg("-i").arg(image.path())
            .arg("-t").arg(seconds(duration))
            .args(["-pix_fmt", self.config.pixel_format.as_str()])
            .arg("-r").arg(frame_rate.to_string())
            .arg(&*path);

        self.run(cmd).await?;
        self.finish_clip(path).await
    }

    async fn concatenate(&self, clips: &[Clip], output: &Path) -> TranscodeResult<Output> {
        let mut cmd = self.ffmpeg_command();

        // Keeps the list file alive until ffmpeg has read it
        let _list = match self.concat_mode {
            ConcatMode::Demuxer => {
                let list = self.write_concat_list(clips).await?;
                cmd.args(["-f", "concat", "-safe", "0", "-i"])
                    .arg(&*list)
                    .args(["-c", "copy"]);
                Some(list)
            }
            ConcatMode::Filter => {
                for clip in clips {
                    cmd.arg("-i").arg(clip.path());
                }
                cmd.arg("-filter_complex")
                    .arg(format!("concat=n={}:v=1:a=0", clips.len()));
                None
            }
        };
        cmd.arg(output);

        self.run(cmd).await?;
        ensure_artifact(output).await?;

        let probed = self.probe_file(output).await?;
        Ok(Output {
            path: output.to_path_buf(),
            duration: probed.duration,
        })
    }
}

async fn ensure_artifact(path: &Path) -> TranscodeResult<()> {
    let missing = || TranscodeError::MissingArtifact { path: path.display().to_string() };

    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.len() > 0 => Ok(()),
        _ => Err(missing()),
    }
}

fn seconds(value: f64) -> String {
    format!("{:.6}", value)
}

/// Body of a concat demuxer list file
fn concat_list(clips: &[Clip]) -> String {
    clips
        .iter()
        .map(|clip| {
            let absolute = clip
                .path()
                .canonicalize()
                .unwrap_or_else(|_| clip.path().to_path_buf());
            let quoted = absolute.display().to_string().replace('\'', r"'\''");
            format!("file '{}'\n", quoted)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    pix_fmt: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Read frame rate, duration and stream parameters from `ffprobe -print_format json`
fn parse_probe_output(path: &Path, stdout: &[u8]) -> TranscodeResult<AssetMetadata> {
    let failed = |reason: &str| TranscodeError::ProbeFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    let report: ProbeReport = serde_json::from_slice(stdout)
        .map_err(|e| failed(&format!("unreadable ffprobe output: {}", e)))?;
    let stream = report.streams.first().ok_or_else(|| failed("no video stream"))?;

    let frame_rate = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| failed("unknown frame rate"))?;

    let positive = |value: Option<&str>| {
        value
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
    };
    let duration = positive(report.format.as_ref().and_then(|f| f.duration.as_deref()))
        .or_else(|| positive(stream.duration.as_deref()))
        .ok_or_else(|| failed("unknown duration"))?;

    let mut metadata = AssetMetadata::new(frame_rate, duration);
    if let (Some(width), Some(height), Some(pixel_format)) =
        (stream.width, stream.height, stream.pix_fmt.clone())
    {
        metadata = metadata.with_stream(StreamParams { width, height, pixel_format, frame_rate });
    }

    Ok(metadata)
}

/// Parse `30000/1001` or `25` style rates; `0/0` means unknown
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
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

    Some(value).filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PROBE_JSON: &str = r#"{
        "streams": [{
            "index": 0,
            "codec_name": "h264",
            "width": 1920,
            "height": 1080,
            "pix_fmt": "yuv420p",
            "r_frame_rate": "30000/1001",
            "avg_frame_rate": "30000/1001",
            "duration": "12.012000"
        }],
        "format": {
            "filename": "extra.mp4",
            "duration": "12.045000"
        }
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let metadata = parse_probe_output(Path::new("extra.mp4"), PROBE_JSON.as_bytes()).unwrap();
        assert!((metadata.frame_rate - 29.97).abs() < 0.001);
        assert_eq!(metadata.duration, 12.045);

        let stream = metadata.stream.unwrap();
        assert_eq!((stream.width, stream.height), (1920, 1080));
        assert_eq!(stream.pixel_format, "yuv420p");
    }

    #[test]
    fn test_metadata_falls_back_to_stream_values() {
        let json = r#"{
            "streams": [{ "avg_frame_rate": "0/0", "r_frame_rate": "25/1", "duration": "4.0" }],
            "format": { "duration": "N/A" }
        }"#;
        let metadata = parse_probe_output(Path::new("a.webm"), json.as_bytes()).unwrap();
        assert_eq!(metadata.frame_rate, 25.0);
        assert_eq!(metadata.duration, 4.0);
        assert!(metadata.stream.is_none());
    }

    #[test]
    fn test_metadata_without_video_stream() {
        let json = r#"{ "streams": [], "format": { "duration": "3.0" } }"#;
        let result = parse_probe_output(Path::new("audio.wav"), json.as_bytes());
        assert!(matches!(result, Err(TranscodeError::ProbeFailed { .. })));

        let result = parse_probe_output(Path::new("junk"), b"not json");
        assert!(matches!(result, Err(TranscodeError::ProbeFailed { .. })));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("24"), Some(24.0));
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.001);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_concat_list_quotes_paths() {
        let dir = tempdir().unwrap();
        let quoted_dir = dir.path().join("it's here");
        std::fs::create_dir(&quoted_dir).unwrap();
        let scratch = ScratchSpace::new(Some(quoted_dir));

        let clips = vec![
            Clip::new(scratch.file(".mp4").unwrap(), 1.0),
            Clip::new(scratch.file(".mp4").unwrap(), 2.0),
        ];

        let list = concat_list(&clips);
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("file '"));
        assert!(lines[0].contains(r"it'\''s here"));
        assert!(lines[1].ends_with(".mp4'"));
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let config = TranscoderConfig {
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            ..TranscoderConfig::default()
        };
        let transcoder = FfmpegTranscoder::new(config, ConcatMode::Demuxer);

        match transcoder.check_available().await {
            Err(TranscodeError::ToolNotFound { tool }) => assert_eq!(tool, "/nonexistent/ffmpeg"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_extraction_leaves_no_scratch_file() {
        let dir = tempdir().unwrap();
        let config = TranscoderConfig {
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            temp_dir: Some(dir.path().to_path_buf()),
            ..TranscoderConfig::default()
        };
        let transcoder = FfmpegTranscoder::new(config, ConcatMode::Demuxer);

        let result = transcoder.extract_subclip(Path::new("extra.mp4"), 0.0, 1.0).await;
        assert!(matches!(result, Err(TranscodeError::ToolNotFound { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_artifact_is_rejected() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.mp4");
        std::fs::write(&empty, b"").unwrap();

        let result = ensure_artifact(&empty).await;
        assert!(matches!(result, Err(TranscodeError::MissingArtifact { .. })));
        assert!(ensure_artifact(&dir.path().join("absent.mp4")).await.is_err());
    }
}
