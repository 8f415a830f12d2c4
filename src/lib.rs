//! # record-extra
//!
//! Rebuild the "extra" video track of a recording from the play/pause events
//! captured while it was shown.
//!
//! During a recording the presenter plays, pauses and seeks an extra video.
//! Each action is logged as a token `record_time-action[-extra_time]`. This
//! library turns those tokens into one video that follows the recording
//! timeline: playing stretches become subclips of the extra video, paused
//! stretches become freeze frames.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use record_extra::{
//!     composition::SyncEngine,
//!     config::Config,
//!     transcode::FfmpegTranscoder,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let transcoder = FfmpegTranscoder::new(config.transcoder.clone(), config.concat.mode);
//!
//! let engine = SyncEngine::new(config, transcoder);
//! engine.render(
//!     "extra.mp4",
//!     "output.mp4",
//!     "['0.0-play-0.0', '2.0-pause-2.0', '5.0-play-2.0', '8.0-pause']",
//! ).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`events`] - Token parsing and `extra_time` resolution
//! - [`timeline`] - Segmentation and frame clamping
//! - [`composition`] - Clip synthesis, concatenation and the pipeline engine
//! - [`transcode`] - The transcoding service seam and its ffmpeg implementation
//! - [`config`] - Configuration management
//!
//! ## Custom transcoders
//!
//! Anything implementing [`Transcoder`](transcode::Transcoder) can drive the
//! engine, e.g. a remote rendering service or an in-process encoder.

pub mod composition;
pub mod config;
pub mod error;
pub mod events;
pub mod timeline;
pub mod transcode;

// Re-export commonly used types for convenience
pub use crate::{
    composition::SyncEngine,
    config::Config,
    error::{Result, SyncError},
    transcode::{FfmpegTranscoder, Transcoder},
};
