use serde::{Deserialize, Serialize};

/// Fade window at the end of a sleep timer, in seconds.
const FADE_WINDOW_SEC: u32 = 30;
/// Ambient level right after the sleep timer fires.
const AMBIENT_AFTERGLOW_VOLUME: f32 = 0.2;
/// How long ambient holds at the afterglow level before tapering.
const AMBIENT_HOLD_SEC: u32 = 180;
/// Per-tick taper step during the ambient wind-down.
const AMBIENT_TAPER_STEP: f32 = 0.01;
/// Below this level the ambient track is paused outright.
const AMBIENT_TAPER_FLOOR: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackState {
    Idle,
    Loaded,
    Playing,
    Paused,
}

/// Inputs to the mixer: UI events plus the 1 Hz timer tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A story screen mounted with a narration track.
    LoadPrimary,
    Play,
    Pause,
    SetAmbientEnabled(bool),
    SelectAmbient(String),
    SetStoryVolume(f32),
    SetAmbientVolume(f32),
    StartSleepTimer { minutes: u32 },
    CancelSleepTimer,
    Tick,
    /// Screen unmount: stop and release everything synchronously.
    Reset,
}

/// Effects for the audio backend. The mixer never touches players
/// directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PlayPrimary,
    PausePrimary,
    SetPrimaryVolume(f32),
    StartAmbient(String),
    StopAmbient(String),
    SetAmbientVolume(f32),
    ReleaseAll,
}

/// Post-timer ambient continuation: hold at a reduced level, then a
/// slow taper to silence.
#[derive(Debug, Clone, Copy, PartialEq)]
enum WindDown {
    Off,
    Hold { remaining: u32 },
    Taper,
}

/// The playback session state machine. Created when a story screen
/// mounts, destroyed on unmount.
#[derive(Debug)]
pub struct Mixer {
    primary: TrackState,
    story_volume: f32,
    ambient_enabled: bool,
    selected_ambient: Option<String>,
    active_ambient: Option<String>,
    ambient_volume: f32,
    sleep_timer_minutes: Option<u32>,
    sleep_timer_remaining: Option<u32>,
    wind_down: WindDown,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            primary: TrackState::Idle,
            story_volume: 1.0,
            ambient_enabled: false,
            selected_ambient: None,
            active_ambient: None,
            ambient_volume: 0.3,
            sleep_timer_minutes: None,
            sleep_timer_remaining: None,
            wind_down: WindDown::Off,
        }
    }

    pub fn primary(&self) -> TrackState {
        self.primary
    }

    pub fn story_volume(&self) -> f32 {
        self.story_volume
    }

    pub fn ambient_volume(&self) -> f32 {
        self.ambient_volume
    }

    pub fn sleep_timer_remaining(&self) -> Option<u32> {
        self.sleep_timer_remaining
    }

    pub fn sleep_timer_active(&self) -> bool {
        self.sleep_timer_remaining.is_some()
    }

    /// The derived-state rule: ambient plays iff it is enabled, the
    /// selected key is the active track, and the primary is playing.
    pub fn ambient_playing(&self) -> bool {
        match self.wind_down {
            WindDown::Off => {
                self.ambient_enabled
                    && self.selected_ambient.is_some()
                    && self.selected_ambient == self.active_ambient
                    && self.primary == TrackState::Playing
            }
            // During the post-timer wind-down the ambient track keeps
            // playing at reduced volume even though the story paused.
            _ => self.ambient_enabled && self.active_ambient.is_some(),
        }
    }

    /// Apply one event and return the commands for the audio backend.
    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        let mut commands = Vec::new();
        match event {
            Event::LoadPrimary => {
                self.primary = TrackState::Loaded;
            }
            Event::Play => {
                self.cancel_wind_down();
                if matches!(self.primary, TrackState::Loaded | TrackState::Paused) {
                    self.primary = TrackState::Playing;
                    commands.push(Command::PlayPrimary);
                }
            }
            Event::Pause => {
                self.cancel_wind_down();
                if self.primary == TrackState::Playing {
                    self.primary = TrackState::Paused;
                    commands.push(Command::PausePrimary);
                }
            }
            Event::SetAmbientEnabled(enabled) => {
                self.cancel_wind_down();
                self.ambient_enabled = enabled;
            }
            Event::SelectAmbient(key) => {
                self.cancel_wind_down();
                self.selected_ambient = Some(key);
            }
            Event::SetStoryVolume(v) => {
                self.story_volume = v.clamp(0.0, 1.0);
                commands.push(Command::SetPrimaryVolume(self.story_volume));
            }
            Event::SetAmbientVolume(v) => {
                self.ambient_volume = v.clamp(0.0, 1.0);
                commands.push(Command::SetAmbientVolume(self.ambient_volume));
            }
            Event::StartSleepTimer { minutes } => {
                self.cancel_wind_down();
                self.sleep_timer_minutes = Some(minutes);
                self.sleep_timer_remaining = Some(minutes * 60);
            }
            Event::CancelSleepTimer => {
                // Leaves current volumes as they are: no snap-back.
                self.sleep_timer_minutes = None;
                self.sleep_timer_remaining = None;
            }
            Event::Tick => {
                self.tick(&mut commands);
            }
            Event::Reset => {
                if let Some(active) = self.active_ambient.take() {
                    commands.push(Command::StopAmbient(active));
                }
                commands.push(Command::ReleaseAll);
                *self = Mixer::new();
                return commands;
            }
        }

        self.sync_ambient(&mut commands);
        commands
    }

    fn cancel_wind_down(&mut self) {
        self.wind_down = WindDown::Off;
    }

    fn tick(&mut self, commands: &mut Vec<Command>) {
        if let Some(remaining) = self.sleep_timer_remaining {
            let remaining = remaining.saturating_sub(1);
            self.sleep_timer_remaining = Some(remaining);

            if remaining == 0 {
                // Timer fires once, then clears itself.
                commands.push(Command::SetPrimaryVolume(0.0));
                if self.primary == TrackState::Playing {
                    self.primary = TrackState::Paused;
                    commands.push(Command::PausePrimary);
                }
                self.sleep_timer_minutes = None;
                self.sleep_timer_remaining = None;
                // Restore full volume on the now-paused player so the
                // next playback is audible. The backend only sees
                // commands, so the reset must be emitted too.
                self.story_volume = 1.0;
                commands.push(Command::SetPrimaryVolume(1.0));

                if self.ambient_enabled && self.active_ambient.is_some() {
                    self.ambient_volume = AMBIENT_AFTERGLOW_VOLUME;
                    commands.push(Command::SetAmbientVolume(self.ambient_volume));
                    self.wind_down = WindDown::Hold {
                        remaining: AMBIENT_HOLD_SEC,
                    };
                }
            } else if remaining <= FADE_WINDOW_SEC && self.primary == TrackState::Playing {
                self.story_volume = remaining as f32 / FADE_WINDOW_SEC as f32;
                commands.push(Command::SetPrimaryVolume(self.story_volume));
            }
            return;
        }

        match self.wind_down {
            WindDown::Off => {}
            WindDown::Hold { remaining } => {
                let remaining = remaining.saturating_sub(1);
                self.wind_down = if remaining == 0 {
                    WindDown::Taper
                } else {
                    WindDown::Hold { remaining }
                };
            }
            WindDown::Taper => {
                if self.ambient_volume > AMBIENT_TAPER_FLOOR {
                    self.ambient_volume = (self.ambient_volume - AMBIENT_TAPER_STEP).max(0.0);
                    commands.push(Command::SetAmbientVolume(self.ambient_volume));
                } else {
                    self.wind_down = WindDown::Off;
                    if let Some(active) = self.active_ambient.take() {
                        commands.push(Command::StopAmbient(active));
                    }
                }
            }
        }
    }

    /// Recompute the derived ambient state and emit the commands that
    /// reconcile the backend with it. Switching keys stops the old
    /// track before starting the new one: no overlap.
    fn sync_ambient(&mut self, commands: &mut Vec<Command>) {
        if !matches!(self.wind_down, WindDown::Off) {
            return;
        }

        let should_play = self.ambient_enabled
            && self.selected_ambient.is_some()
            && self.primary == TrackState::Playing;

        if should_play {
            let selected = self.selected_ambient.clone();
            if self.active_ambient != selected {
                if let Some(old) = self.active_ambient.take() {
                    commands.push(Command::StopAmbient(old));
                }
                if let Some(new) = selected {
                    self.active_ambient = Some(new.clone());
                    commands.push(Command::StartAmbient(new));
                }
            }
        } else if let Some(active) = self.active_ambient.take() {
            commands.push(Command::StopAmbient(active));
        }
    }
}
