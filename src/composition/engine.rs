use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    composition::{concat::concatenate_clips, plan_clips, ClipPlan, ClipSynthesizer},
    config::Config,
    error::{Result, TranscodeError},
    events::{parse_event_list, ResolvedEvent},
    timeline::{segment_events, total_duration, Segment},
    transcode::{AssetMetadata, Clip, Output, Transcoder},
};

/// Rebuilds the extra video track of a recording from its play/pause events
///
/// The engine follows a strictly sequential pipeline:
/// 1. Event Parsing - Tokenize and resolve the event list
/// 2. Segmentation - Pair consecutive events into segments
/// 3. Asset Probing - Read frame rate and duration of the extra video
/// 4. Clip Synthesis - One subclip or still clip per segment
/// 5. Output Generation - Join the clips in segment order
pub struct SyncEngine<T: Transcoder> {
    config: Config,
    transcoder: T,
}

/// Everything decided before the first clip is produced
#[derive(Debug, Clone, Serialize)]
pub struct SyncPlan {
    pub metadata: AssetMetadata,
    pub segments: Vec<Segment>,
    pub clips: Vec<ClipPlan>,

    /// Length of the recording covered by the events
    pub expected_duration: f64,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub output: Output,
    pub segments: usize,
    pub clips: usize,

    /// Zero-length segments left out of the output
    pub skipped: usize,
    pub expected_duration: f64,
}

impl<T: Transcoder> SyncEngine<T> {
    pub fn new(config: Config, transcoder: T) -> Self {
        Self { config, transcoder }
    }

    pub fn transcoder(&self) -> &T {
        &self.transcoder
    }

    /// Main entry point - rebuild `output` from `asset` and a serialized event list
    ///
    /// # Arguments
    ///
    /// * `asset` - The extra video the events refer to
    /// * `output` - Path of the video to produce
    /// * `event_list` - Tokens such as `['0.0-play-0.0', '3.0-pause']`
    pub async fn render<P: AsRef<Path>>(
        &self,
        asset: P,
        output: P,
        event_list: &str,
    ) -> Result<RenderReport> {
        let events = self.parse_events(event_list)?;
        self.render_events(asset, output, &events).await
    }

    /// Same as [`render`](Self::render), for events that are already resolved
    pub async fn render_events<P: AsRef<Path>>(
        &self,
        asset: P,
        output: P,
        events: &[ResolvedEvent],
    ) -> Result<RenderReport> {
        let asset = asset.as_ref();
        let output = output.as_ref();

        info!("🎬 Rebuilding extra video track");
        info!("   Extra video: {:?}", asset);
        info!("   Output: {:?}", output);

        let plan = self.plan_events(asset, events).await?;

        // Pipeline Step 4: Clip Synthesis
        let clips = self.synthesize_clips(asset, &plan).await?;
        let clip_count = clips.len();

        // Pipeline Step 5: Final Output Generation
        let output = self.generate_final_output(clips, output, plan.expected_duration).await?;

        info!("🎉 Done! Output saved to: {:?}", output.path);
        Ok(RenderReport {
            output,
            segments: plan.segments.len(),
            clips: clip_count,
            skipped: plan.segments.len() - clip_count,
            expected_duration: plan.expected_duration,
        })
    }

    /// Parse, segment and probe without producing any clip
    pub async fn plan<P: AsRef<Path>>(&self, asset: P, event_list: &str) -> Result<SyncPlan> {
        let events = self.parse_events(event_list)?;
        self.plan_events(asset.as_ref(), &events).await
    }

    async fn plan_events(&self, asset: &Path, events: &[ResolvedEvent]) -> Result<SyncPlan> {
        // Pipeline Step 2: Segmentation
        let segments = self.segment_timeline(events)?;

        // Pipeline Step 3: Asset Probing
        let metadata = self.probe_asset(asset).await?;

        let clips = plan_clips(&segments, &metadata)?;
        let expected_duration = total_duration(&segments);

        Ok(SyncPlan { metadata, segments, clips, expected_duration })
    }

    // ==========================================
    // PIPELINE STEP 1: EVENT PARSING
    // ==========================================

    fn parse_events(&self, event_list: &str) -> Result<Vec<ResolvedEvent>> {
        info!("📝 Step 1: Parsing events...");

        let events = parse_event_list(event_list)?;

        info!("   ✅ {} events resolved", events.len());
        Ok(events)
    }

    // ==========================================
    // PIPELINE STEP 2: SEGMENTATION
    // ==========================================

    fn segment_timeline(&self, events: &[ResolvedEvent]) -> Result<Vec<Segment>> {
        info!("⏱️  Step 2: Segmenting timeline...");

        let segments = segment_events(events)?;

        for segment in &segments {
            debug!(
                "      {:02} - {} {:.3}s..{:.3}s from {:.3}s",
                segment.index,
                segment.kind(),
                segment.start.record_time,
                segment.end.record_time,
                segment.start.extra_time
            );
        }

        info!("   ✅ {} segments, {:.3}s of recording", segments.len(), total_duration(&segments));
        Ok(segments)
    }

    // ==========================================
    // PIPELINE STEP 3: ASSET PROBING
    // ==========================================

    async fn probe_asset(&self, asset: &Path) -> Result<AssetMetadata> {
        info!("🔎 Step 3: Probing extra video...");

        let metadata = self.transcoder.probe(asset).await?;

        let usable = |value: f64| value.is_finite() && value > 0.0;
        if !usable(metadata.frame_rate) || !usable(metadata.duration) {
            return Err(TranscodeError::ProbeFailed {
                path: asset.display().to_string(),
                reason: format!(
                    "frame rate {} and duration {} must be positive",
                    metadata.frame_rate, metadata.duration
                ),
            }
            .into());
        }

        info!("   ✅ {:.3}s at {:.3} fps", metadata.duration, metadata.frame_rate);
        Ok(metadata)
    }

    // ==========================================
    // PIPELINE STEP 4: CLIP SYNTHESIS
    // ==========================================

    async fn synthesize_clips(&self, asset: &Path, plan: &SyncPlan) -> Result<Vec<Clip>> {
        info!("🎞️  Step 4: Synthesizing {} clips...", plan.clips.len());

        let synthesizer = ClipSynthesizer::new(
            &self.transcoder,
            asset,
            self.config.timeline.duration_tolerance,
        );
        let clips = synthesizer.synthesize(&plan.clips).await?;

        info!("   ✅ {} clips ready", clips.len());
        Ok(clips)
    }

    // ==========================================
    // PIPELINE STEP 5: OUTPUT GENERATION
    // ==========================================

    async fn generate_final_output(
        &self,
        clips: Vec<Clip>,
        output_path: &Path,
        expected_duration: f64,
    ) -> Result<Output> {
        info!("🎬 Step 5: Generating final output...");

        let output = concatenate_clips(
            &self.transcoder,
            clips,
            output_path,
            self.config.concat.verify_streams,
        )
        .await?;

        if (output.duration - expected_duration).abs() > self.config.timeline.duration_tolerance {
            warn!(
                "Output lasts {:.3}s but the events cover {:.3}s",
                output.duration, expected_duration
            );
        }

        info!("   ✅ Output generation complete:");
        info!("      File saved: {:?}", output.path);
        info!("      Duration: {:.3}s", output.duration);

        Ok(output)
    }
}
