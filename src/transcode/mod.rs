//! # Transcoding Service
//!
//! The media operations the synchronizer needs from an external engine.
//! [`Transcoder`] is the seam; [`FfmpegTranscoder`] drives the `ffmpeg` and
//! `ffprobe` command-line tools.
//!
//! Every operation either returns a usable artifact or a [`TranscodeError`].
//! A command that exits non-zero, or leaves behind an empty file, is a failure.

pub mod ffmpeg;
pub mod types;

use std::path::Path;

use crate::error::TranscodeResult;

pub use ffmpeg::FfmpegTranscoder;
pub use types::{AssetMetadata, Clip, Output, ScratchSpace, StillImage, StreamParams};

/// Media operations backing the clip synthesizer
///
/// Calls are awaited one at a time by the engine; implementations do not need
/// to be shareable across tasks.
#[allow(async_fn_in_trait)]
pub trait Transcoder {
    /// Read frame rate and duration of `asset`
    async fn probe(&self, asset: &Path) -> TranscodeResult<AssetMetadata>;

    /// Cut `duration` seconds of `asset` starting at `start`
    async fn extract_subclip(&self, asset: &Path, start: f64, duration: f64) -> TranscodeResult<Clip>;

    /// Grab the frame of `asset` shown at `time`
    async fn extract_frame(&self, asset: &Path, time: f64) -> TranscodeResult<StillImage>;

    /// Hold `image` for `duration` seconds at `frame_rate`
    async fn image_to_video(&self, image: &StillImage, duration: f64, frame_rate: f64) -> TranscodeResult<Clip>;

    /// Join `clips`, in order, into `output`
    async fn concatenate(&self, clips: &[Clip], output: &Path) -> TranscodeResult<Output>;
}
