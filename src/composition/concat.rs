use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Result, TimelineError};
use crate::transcode::{Clip, Output, Transcoder};

/// Check that every clip with known stream parameters matches the first one
pub fn check_stream_compatibility(clips: &[Clip]) -> Result<()> {
    let mut known = clips
        .iter()
        .enumerate()
        .filter_map(|(index, clip)| clip.stream().map(|stream| (index, stream)));

    let Some((_, reference)) = known.next() else {
        debug!("No stream parameters reported, skipping compatibility check");
        return Ok(());
    };

    for (index, stream) in known {
        if !reference.is_compatible_with(stream) {
            return Err(TimelineError::IncompatibleStreams {
                index,
                expected: reference.to_string(),
                found: stream.to_string(),
            }
            .into());
        }
    }

    Ok(())
}

/// Join `clips`, in order, into `output`
///
/// Takes ownership of the clips; their files are deleted once the join is
/// done, whether it succeeded or not. A failed join also removes whatever it
/// left at `output`.
pub async fn concatenate_clips<T: Transcoder>(
    transcoder: &T,
    clips: Vec<Clip>,
    output: &Path,
    verify_streams: bool,
) -> Result<Output> {
    if clips.is_empty() {
        return Err(TimelineError::EmptyTimeline.into());
    }

    if verify_streams {
        check_stream_compatibility(&clips)?;
    }

    info!("   Joining {} clips into {:?}", clips.len(), output);
    let joined = transcoder.concatenate(&clips, output).await;

    for clip in clips {
        clip.release();
    }

    if joined.is_err() {
        remove_partial_output(output).await;
    }

    Ok(joined?)
}

async fn remove_partial_output(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => debug!("Removed partial output {:?}", output),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {:?}: {}", output, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::testing::{Call, MockTranscoder};
    use crate::error::{SyncError, TranscodeError};
    use crate::transcode::{AssetMetadata, StreamParams, Transcoder};
    use tempfile::tempdir;

    fn params(width: u32) -> StreamParams {
        StreamParams {
            width,
            height: 720,
            pixel_format: "yuv420p".to_string(),
            frame_rate: 25.0,
        }
    }

    async fn clips(mock: &MockTranscoder) -> Vec<Clip> {
        let asset = Path::new("extra.mp4");
        let still = mock.extract_frame(asset, 1.0).await.unwrap();
        vec![
            mock.extract_subclip(asset, 0.0, 2.0).await.unwrap(),
            mock.image_to_video(&still, 1.5, 25.0).await.unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_empty_timeline() {
        let mock = MockTranscoder::new(AssetMetadata::new(25.0, 10.0));
        let dir = tempdir().unwrap();

        let result = concatenate_clips(&mock, Vec::new(), &dir.path().join("out.mp4"), true).await;
        assert!(matches!(result, Err(SyncError::Timeline(TimelineError::EmptyTimeline))));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_join_consumes_clips() {
        let mock = MockTranscoder::new(AssetMetadata::new(25.0, 10.0))
            .with_streams(params(1280), params(1280));
        let dir = tempdir().unwrap();
        let clips = clips(&mock).await;

        let output = concatenate_clips(&mock, clips, &dir.path().join("out.mp4"), true).await.unwrap();
        assert_eq!(output.duration, 3.5);
        assert!(output.path.exists());
        assert_eq!(mock.calls().last(), Some(&Call::Concat { clips: 2 }));
        assert_eq!(mock.live_files(), 0);
    }

    #[tokio::test]
    async fn test_incompatible_streams_fail_early() {
        let mock = MockTranscoder::new(AssetMetadata::new(25.0, 10.0))
            .with_streams(params(1280), params(640));
        let dir = tempdir().unwrap();
        let clips = clips(&mock).await;

        let result = concatenate_clips(&mock, clips, &dir.path().join("out.mp4"), true).await;
        match result {
            Err(SyncError::Timeline(TimelineError::IncompatibleStreams { index, .. })) => assert_eq!(index, 1),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!mock.calls().contains(&Call::Concat { clips: 2 }));
    }

    #[tokio::test]
    async fn test_verification_can_be_disabled() {
        let mock = MockTranscoder::new(AssetMetadata::new(25.0, 10.0))
            .with_streams(params(1280), params(640));
        let dir = tempdir().unwrap();
        let clips = clips(&mock).await;

        assert!(concatenate_clips(&mock, clips, &dir.path().join("out.mp4"), false).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_join_leaves_no_output() {
        let mock = MockTranscoder::new(AssetMetadata::new(25.0, 10.0)).failing_concat();
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let clips = clips(&mock).await;

        let result = concatenate_clips(&mock, clips, &output, true).await;
        assert!(matches!(
            result,
            Err(SyncError::Transcode(TranscodeError::CommandFailed { .. }))
        ));
        assert!(!output.exists());
        assert_eq!(mock.live_files(), 0);
    }
}
