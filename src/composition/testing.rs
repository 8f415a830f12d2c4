//! In-memory transcoder for pipeline tests
//!
//! Writes real (empty-content) scratch files so tests can check that clips are
//! cleaned up, and behaves like ffmpeg where it matters: subclips running past
//! the end of the asset come back short, and there is no frame past the last
//! one.

use std::cell::{Cell, RefCell};
use std::path::Path;

use tempfile::TempDir;

use crate::error::{TranscodeError, TranscodeResult};
use crate::transcode::{AssetMetadata, Clip, Output, ScratchSpace, StillImage, StreamParams, Transcoder};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Probe,
    Subclip { start: f64, duration: f64 },
    Frame { time: f64 },
    Still { duration: f64, frame_rate: f64 },
    Concat { clips: usize },
}

pub struct MockTranscoder {
    pub metadata: AssetMetadata,
    dir: TempDir,
    scratch: ScratchSpace,
    calls: RefCell<Vec<Call>>,
    clip_calls: Cell<usize>,
    fail_on: Option<usize>,
    fail_concat: bool,
    subclip_stream: Option<StreamParams>,
    still_stream: Option<StreamParams>,
}

impl MockTranscoder {
    pub fn new(metadata: AssetMetadata) -> Self {
        let dir = tempfile::tempdir().expect("scratch dir");
        let scratch = ScratchSpace::new(Some(dir.path().to_path_buf()));
        Self {
            metadata,
            dir,
            scratch,
            calls: RefCell::new(Vec::new()),
            clip_calls: Cell::new(0),
            fail_on: None,
            fail_concat: false,
            subclip_stream: None,
            still_stream: None,
        }
    }

    /// Fail the `n`-th (0-based) subclip/frame/still request
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    /// Make the join write a partial output and then fail
    pub fn failing_concat(mut self) -> Self {
        self.fail_concat = true;
        self
    }

    /// Stream parameters reported for subclips and still clips
    pub fn with_streams(mut self, subclip: StreamParams, still: StreamParams) -> Self {
        self.subclip_stream = Some(subclip);
        self.still_stream = Some(still);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Scratch files still on disk
    pub fn live_files(&self) -> usize {
        std::fs::read_dir(self.dir.path()).map(|entries| entries.count()).unwrap_or(0)
    }

    fn record_clip_call(&self, call: Call) -> TranscodeResult<()> {
        self.calls.borrow_mut().push(call);
        let n = self.clip_calls.get();
        self.clip_calls.set(n + 1);

        if self.fail_on == Some(n) {
            return Err(TranscodeError::CommandFailed {
                tool: "mock".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Transcoder for MockTranscoder {
    async fn probe(&self, _asset: &Path) -> TranscodeResult<AssetMetadata> {
        self.calls.borrow_mut().push(Call::Probe);
        Ok(self.metadata.clone())
    }

    async fn extract_subclip(&self, _asset: &Path, start: f64, duration: f64) -> TranscodeResult<Clip> {
        self.record_clip_call(Call::Subclip { start, duration })?;
        let available = (self.metadata.duration - start).clamp(0.0, duration);
        Ok(Clip::new(self.scratch.file(".mp4")?, available).with_stream(self.subclip_stream.clone()))
    }

    async fn extract_frame(&self, asset: &Path, time: f64) -> TranscodeResult<StillImage> {
        self.record_clip_call(Call::Frame { time })?;
        if time > self.metadata.last_frame_time() + 1e-9 {
            return Err(TranscodeError::MissingArtifact { path: asset.display().to_string() });
        }
        Ok(StillImage::new(self.scratch.file(".jpg")?))
    }

    async fn image_to_video(&self, _image: &StillImage, duration: f64, frame_rate: f64) -> TranscodeResult<Clip> {
        self.record_clip_call(Call::Still { duration, frame_rate })?;
        Ok(Clip::new(self.scratch.file(".mp4")?, duration).with_stream(self.still_stream.clone()))
    }

    async fn concatenate(&self, clips: &[Clip], output: &Path) -> TranscodeResult<Output> {
        self.calls.borrow_mut().push(Call::Concat { clips: clips.len() });
        if self.fail_concat {
            std::fs::write(output, b"join")?;
            return Err(TranscodeError::CommandFailed {
                tool: "mock".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "injected failure".to_string(),
            });
        }
        std::fs::write(output, b"joined")?;
        Ok(Output {
            path: output.to_path_buf(),
            duration: clips.iter().map(Clip::duration).sum(),
        })
    }
}
