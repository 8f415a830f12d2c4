//! # Composition
//!
//! Turns a segmented timeline into the final video: plans one clip per
//! segment, has the transcoder produce them in order, then joins them.

pub mod concat;
pub mod engine;
pub mod synthesizer;

#[cfg(test)]
pub(crate) mod testing;

pub use concat::{check_stream_compatibility, concatenate_clips};
pub use engine::{RenderReport, SyncEngine, SyncPlan};
pub use synthesizer::{plan_clips, ClipPlan, ClipSynthesizer};
