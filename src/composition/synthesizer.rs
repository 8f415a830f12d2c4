use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError, TranscodeError, TranscodeResult};
use crate::events::Action;
use crate::timeline::{clamp_frame_time, Segment};
use crate::transcode::{AssetMetadata, Clip, Transcoder};

/// What to ask the transcoder for, for one segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipPlan {
    /// Play the extra video from `start`
    Subclip {
        segment: usize,
        start: f64,
        duration: f64,
    },

    /// Hold the frame at `frame_time`
    Still {
        segment: usize,
        frame_time: f64,
        duration: f64,
        frame_rate: f64,
    },
}

impl ClipPlan {
    /// Index of the segment this clip renders
    pub fn segment(&self) -> usize {
        match *self {
            ClipPlan::Subclip { segment, .. } | ClipPlan::Still { segment, .. } => segment,
        }
    }

    /// Requested clip duration in seconds
    pub fn duration(&self) -> f64 {
        match *self {
            ClipPlan::Subclip { duration, .. } | ClipPlan::Still { duration, .. } => duration,
        }
    }
}

/// Extra video positions closer than this are treated as equal
const TIME_EPSILON: f64 = 1e-9;

/// Decide, segment by segment, which clip has to be produced
///
/// Pause frames are clamped to the last frame of the asset. Play starts are
/// not clamped: a subclip that would run past the end of the asset fails the
/// segment with [`TranscodeError::Truncated`] before anything is transcoded.
/// Zero-length segments are skipped.
pub fn plan_clips(segments: &[Segment], metadata: &AssetMetadata) -> Result<Vec<ClipPlan>> {
    let mut plans = Vec::with_capacity(segments.len());

    for segment in segments {
        if segment.is_degenerate() {
            warn!(
                "Skipping segment {}: events share record time {:.3}s",
                segment.index, segment.start.record_time
            );
            continue;
        }

        let duration = segment.record_duration();
        let plan = match segment.kind() {
            Action::Play => {
                let start = segment.start.extra_time;
                if start + duration > metadata.duration + TIME_EPSILON {
                    warn!(
                        "Segment {} plays {:.3}s..{:.3}s but the extra video ends at {:.3}s",
                        segment.index, start, start + duration, metadata.duration
                    );
                    return Err(SyncError::segment(
                        segment.index,
                        TranscodeError::Truncated {
                            expected: duration,
                            actual: (metadata.duration - start).max(0.0),
                        },
                    ));
                }
                ClipPlan::Subclip { segment: segment.index, start, duration }
            }
            Action::Pause => {
                let frame_time = clamp_frame_time(segment.start.extra_time, metadata);
                if frame_time != segment.start.extra_time {
                    debug!(
                        "Segment {} frame {:.3}s clamped to {:.3}s",
                        segment.index, segment.start.extra_time, frame_time
                    );
                }
                ClipPlan::Still {
                    segment: segment.index,
                    frame_time,
                    duration,
                    frame_rate: metadata.frame_rate,
                }
            }
        };
        plans.push(plan);
    }

    Ok(plans)
}

/// Runs clip plans against a transcoder, in order
pub struct ClipSynthesizer<'a, T: Transcoder> {
    transcoder: &'a T,
    asset: &'a Path,
    tolerance: f64,
}

impl<'a, T: Transcoder> ClipSynthesizer<'a, T> {
    /// `tolerance` is how much shorter than requested a clip may come back
    pub fn new(transcoder: &'a T, asset: &'a Path, tolerance: f64) -> Self {
        Self { transcoder, asset, tolerance }
    }

    /// Produce one clip per plan, in plan order
    ///
    /// The first failure aborts; clips produced so far are dropped, which
    /// deletes their files.
    pub async fn synthesize(&self, plans: &[ClipPlan]) -> Result<Vec<Clip>> {
        let mut clips = Vec::with_capacity(plans.len());

        for (position, plan) in plans.iter().enumerate() {
            let clip = self
                .render(plan)
                .await
                .map_err(|e| SyncError::segment(plan.segment(), e))?;

            info!(
                "   [{}/{}] segment {} -> {:.3}s clip",
                position + 1,
                plans.len(),
                plan.segment(),
                clip.duration()
            );
            clips.push(clip);
        }

        Ok(clips)
    }

    async fn render(&self, plan: &ClipPlan) -> TranscodeResult<Clip> {
        let clip = match *plan {
            ClipPlan::Subclip { start, duration, .. } => {
                debug!("Extracting {:.3}s from {:.3}s", duration, start);
                self.transcoder.extract_subclip(self.asset, start, duration).await?
            }
            ClipPlan::Still { frame_time, duration, frame_rate, .. } => {
                debug!("Freezing frame {:.3}s for {:.3}s", frame_time, duration);
                let still = self.transcoder.extract_frame(self.asset, frame_time).await?;
                let clip = self.transcoder.image_to_video(&still, duration, frame_rate).await;
                still.release();
                clip?
            }
        };

        self.verify(plan, clip)
    }

    fn verify(&self, plan: &ClipPlan, clip: Clip) -> TranscodeResult<Clip> {
        let expected = plan.duration();
        if clip.duration() + self.tolerance < expected {
            return Err(TranscodeError::Truncated {
                expected,
                actual: clip.duration(),
            });
        }
        Ok(clip)
    }
}
