use crate::transcode::AssetMetadata;

/// Bound a pause frame request to the last addressable frame of the asset
///
/// Returns `min(extra_time, duration - 1 / frame_rate)`, never below zero.
/// Only pause segments go through here; play segments keep their start time.
pub fn clamp_frame_time(extra_time: f64, metadata: &AssetMetadata) -> f64 {
    extra_time.min(metadata.last_frame_time()).max(0.0)
}
