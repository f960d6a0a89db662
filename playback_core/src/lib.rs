//! Client-side playback mixer for narrated stories.
//!
//! An explicit state machine driven by a single event loop: UI events
//! and 1-second timer ticks go in, audio commands come out. Ambient
//! playback is derived state, recomputed after every event, never
//! chased through ad hoc listeners.

mod mixer;

pub use mixer::{Command, Event, Mixer, TrackState};
