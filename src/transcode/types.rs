use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempPath;
use tracing::warn;

const SCRATCH_PREFIX: &str = "record-extra-";

/// What was probed from the extra video; read-only for the rest of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Frames per second (> 0)
    pub frame_rate: f64,

    /// Duration in seconds (> 0)
    pub duration: f64,

    /// Video stream parameters, when the prober reported them
    pub stream: Option<StreamParams>,
}

impl AssetMetadata {
    pub fn new(frame_rate: f64, duration: f64) -> Self {
        Self { frame_rate, duration, stream: None }
    }

    pub fn with_stream(mut self, stream: StreamParams) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Duration of a single frame
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.frame_rate
    }

    /// Timestamp of the last addressable frame
    pub fn last_frame_time(&self) -> f64 {
        self.duration - self.frame_duration()
    }
}

/// Video stream parameters that must match for a stream-copy concatenation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamParams {
    pub width: u32,
    pub height: u32,
    pub pixel_format: String,
    pub frame_rate: f64,
}

impl StreamParams {
    /// Same geometry, pixel format and (to 0.01 fps) frame rate
    pub fn is_compatible_with(&self, other: &StreamParams) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.pixel_format == other.pixel_format
            && (self.frame_rate - other.frame_rate).abs() < 0.01
    }
}

impl fmt::Display for StreamParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {} @{:.3}fps", self.width, self.height, self.pixel_format, self.frame_rate)
    }
}

/// A transient video file produced for one segment
///
/// The backing file is deleted when the clip is dropped.
#[derive(Debug)]
pub struct Clip {
    path: TempPath,
    duration: f64,
    stream: Option<StreamParams>,
}

impl Clip {
    pub fn new(path: TempPath, duration: f64) -> Self {
        Self { path, duration, stream: None }
    }

    pub fn with_stream(mut self, stream: Option<StreamParams>) -> Self {
        self.stream = stream;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Measured duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn stream(&self) -> Option<&StreamParams> {
        self.stream.as_ref()
    }

    /// Delete the backing file now, logging instead of failing
    pub fn release(self) {
        release(self.path);
    }
}

/// A transient frame grabbed from the extra video
///
/// The backing file is deleted when the image is dropped.
#[derive(Debug)]
pub struct StillImage {
    path: TempPath,
}

impl StillImage {
    pub fn new(path: TempPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(self) {
        release(self.path);
    }
}

fn release(path: TempPath) {
    let shown = path.display().to_string();
    if let Err(e) = path.close() {
        warn!("Failed to remove temporary file {}: {}", shown, e);
    }
}

/// The final joined video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    pub path: PathBuf,

    /// Probed duration in seconds
    pub duration: f64,
}

/// Where intermediate files are created
#[derive(Debug, Clone, Default)]
pub struct ScratchSpace {
    dir: Option<PathBuf>,
}

impl ScratchSpace {
    /// Use `dir`, or the system temp dir when `None`
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Reserve a fresh, empty file ending in `suffix`
    pub fn file(&self, suffix: &str) -> io::Result<TempPath> {
        let file = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(suffix)
            .tempfile_in(self.dir())?;
        Ok(file.into_temp_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_clip_file_removed_on_drop() {
        let dir = tempdir().unwrap();
        let scratch = ScratchSpace::new(Some(dir.path().to_path_buf()));

        let clip = Clip::new(scratch.file(".mp4").unwrap(), 1.0);
        let path = clip.path().to_path_buf();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with(SCRATCH_PREFIX));

        drop(clip);
        assert!(!path.exists());
    }

    #[test]
    fn test_still_release() {
        let dir = tempdir().unwrap();
        let scratch = ScratchSpace::new(Some(dir.path().to_path_buf()));

        let still = StillImage::new(scratch.file(".jpg").unwrap());
        let path = still.path().to_path_buf();
        still.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_stream_compatibility() {
        let base = StreamParams {
            width: 1280,
            height: 720,
            pixel_format: "yuv420p".to_string(),
            frame_rate: 29.97,
        };

        let mut close = base.clone();
        close.frame_rate = 29.97002997;
        assert!(base.is_compatible_with(&close));

        let mut resized = base.clone();
        resized.width = 640;
        assert!(!base.is_compatible_with(&resized));

        let mut other_format = base.clone();
        other_format.pixel_format = "yuv444p".to_string();
        assert!(!base.is_compatible_with(&other_format));
    }

    #[test]
    fn test_last_frame_time() {
        let metadata = AssetMetadata::new(25.0, 10.0);
        assert!((metadata.last_frame_time() - 9.96).abs() < 1e-12);
    }
}
