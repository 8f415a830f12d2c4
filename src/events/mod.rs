//! # Event Parsing
//!
//! Turns the play/pause tokens recorded alongside a capture into validated,
//! fully-resolved timeline events.
//!
//! A token reads `record_time-action[-extra_time]`:
//!
//! ```rust
//! use record_extra::events::{parse_events, Action};
//!
//! let events = parse_events(&["0.0-play-0.0", "3.0-pause"]).unwrap();
//! assert_eq!(events[1].action, Action::Pause);
//! assert_eq!(events[1].extra_time, 3.0);
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_event_list, parse_events, parse_token, Resolution};
pub use types::{Action, Event, ResolvedEvent};
