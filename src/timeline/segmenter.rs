use serde::Serialize;

use crate::error::{EventError, Result, TimelineError};
use crate::events::{Action, ResolvedEvent};

/// The interval between two consecutive events
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    /// Position of the segment in the timeline (index of its starting event)
    pub index: usize,
    pub start: ResolvedEvent,
    pub end: ResolvedEvent,
}

impl Segment {
    /// The starting event's action decides how the segment is rendered
    pub fn kind(&self) -> Action {
        self.start.action
    }

    /// Length of the segment on the recording timeline
    pub fn record_duration(&self) -> f64 {
        self.end.record_time - self.start.record_time
    }

    /// Two events sharing a record time produce nothing to render
    pub fn is_degenerate(&self) -> bool {
        self.record_duration() == 0.0
    }
}

/// Split `N` resolved events into `N - 1` segments
///
/// The last event only closes the final interval; its action and extra time
/// are never read. Record times may repeat but never go backwards.
pub fn segment_events(events: &[ResolvedEvent]) -> Result<Vec<Segment>> {
    if events.len() < 2 {
        return Err(TimelineError::InsufficientEvents { count: events.len() }.into());
    }

    events
        .windows(2)
        .enumerate()
        .map(|(index, pair)| -> Result<Segment> {
            if pair[1].record_time < pair[0].record_time {
                return Err(EventError::NonIncreasing {
                    index: index + 1,
                    previous: pair[0].record_time,
                    current: pair[1].record_time,
                }
                .into());
            }
            Ok(Segment {
                index,
                start: pair[0],
                end: pair[1],
            })
        })
        .collect()
}

/// Summed recording duration of all segments
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::record_duration).sum()
}
