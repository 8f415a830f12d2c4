use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the extra video did at an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// The extra video starts (or keeps) playing
    Play,

    /// The extra video is frozen on a frame
    Pause,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Play => "play",
            Action::Pause => "pause",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" => Ok(Action::Play),
            "pause" => Ok(Action::Pause),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// A raw event as written in a token
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Seconds since the start of the recording
    pub record_time: f64,

    pub action: Action,

    /// Position in the extra video (seconds), if the recorder wrote one
    pub extra_time: Option<f64>,
}

/// An event whose extra video position is known
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    /// Seconds since the start of the recording
    pub record_time: f64,

    pub action: Action,

    /// Position in the extra video (seconds)
    pub extra_time: f64,
}

impl ResolvedEvent {
    pub fn new(record_time: f64, action: Action, extra_time: f64) -> Self {
        Self { record_time, action, extra_time }
    }
}

impl fmt::Display for ResolvedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s {} @{:.3}s", self.record_time, self.action, self.extra_time)
    }
}
