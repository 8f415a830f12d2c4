use tracing::debug;

use crate::error::{EventError, Result};
use crate::events::types::{Action, Event, ResolvedEvent};

const FIELD_SEPARATOR: char = '-';

/// Carry-forward state threaded through the parse
///
/// Holds the last resolved event so that an omitted `extra_time` can be
/// derived from it. A fresh `Resolution` is created for every parse, so
/// separate runs never observe each other's state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Resolution {
    previous: Option<ResolvedEvent>,
}

impl Resolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last event resolved so far
    pub fn previous(&self) -> Option<&ResolvedEvent> {
        self.previous.as_ref()
    }

    /// Resolve the event at `index`, returning the advanced state with it
    ///
    /// An omitted `extra_time` defaults to `0` on the first event and is
    /// otherwise `previous.extra_time + (record_time - previous.record_time)`.
    pub fn resolve(self, index: usize, event: Event) -> Result<(Self, ResolvedEvent)> {
        let extra_time = match (self.previous, event.extra_time) {
            (Some(previous), _) if event.record_time <= previous.record_time => {
                return Err(EventError::NonIncreasing {
                    index,
                    previous: previous.record_time,
                    current: event.record_time,
                }.into());
            }
            (_, Some(extra_time)) => extra_time,
            (Some(previous), None) => {
                previous.extra_time + (event.record_time - previous.record_time)
            }
            (None, None) => 0.0,
        };

        let resolved = ResolvedEvent::new(event.record_time, event.action, extra_time);
        Ok((Self { previous: Some(resolved) }, resolved))
    }
}

/// Tokenize a single `record_time-action[-extra_time]` token
pub fn parse_token(index: usize, token: &str) -> Result<Event> {
    let malformed = |reason: String| EventError::Malformed {
        index,
        token: token.to_string(),
        reason,
    };

    let fields: Vec<&str> = token.trim().split(FIELD_SEPARATOR).map(str::trim).collect();
    if !(2..=3).contains(&fields.len()) {
        return Err(malformed(format!("expected 2 or 3 fields, found {}", fields.len())).into());
    }

    let record_time = parse_seconds(fields[0])
        .map_err(|reason| malformed(format!("record time {}", reason)))?;
    let action = fields[1].parse::<Action>().map_err(malformed)?;
    let extra_time = match fields.get(2) {
        Some(field) => Some(
            parse_seconds(field).map_err(|reason| malformed(format!("extra time {}", reason)))?,
        ),
        None => None,
    };

    Ok(Event { record_time, action, extra_time })
}

fn parse_seconds(field: &str) -> std::result::Result<f64, String> {
    let value = field
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", field))?;

    if !value.is_finite() {
        return Err(format!("'{}' is not finite", field));
    }
    if value < 0.0 {
        return Err(format!("'{}' is negative", field));
    }

    Ok(value)
}

/// Parse and resolve an ordered list of event tokens
pub fn parse_events<I, S>(tokens: I) -> Result<Vec<ResolvedEvent>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (_, events) = tokens.into_iter().enumerate().try_fold(
        (Resolution::new(), Vec::new()),
        |(state, mut events), (index, token)| {
            let event = parse_token(index, token.as_ref())?;
            let (state, resolved) = state.resolve(index, event)?;
            debug!("Event #{}: {}", index, resolved);
            events.push(resolved);
            Ok::<_, crate::error::SyncError>((state, events))
        },
    )?;

    Ok(events)
}

/// Split a serialized event list into its tokens
///
/// Accepts a JSON array (`["0-play-0", "3-pause"]`), a bracketed list with
/// single quotes (`['0-play-0', '3-pause']`) or bare tokens separated by
/// commas and/or whitespace.
pub fn split_event_list(list: &str) -> Vec<String> {
    let trimmed = list.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);

    inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|token| token.trim_matches(|c| c == '\'' || c == '"'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a serialized event list, as received on the command line
pub fn parse_event_list(list: &str) -> Result<Vec<ResolvedEvent>> {
    parse_events(split_event_list(list))
}
