//! # Timeline
//!
//! Pairs consecutive resolved events into segments and bounds the frame
//! timestamps requested from the extra video.

pub mod clamp;
pub mod segmenter;

pub use clamp::clamp_frame_time;
pub use segmenter::{segment_events, total_duration, Segment};
