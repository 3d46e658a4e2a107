//! The countdown state machine.
//!
//! Remaining time is never decremented per tick. While running the engine only
//! remembers the wall-clock instant the countdown ends at, and every [`tick`]
//! recomputes the remaining seconds from it. Ticks that arrive late, or not at
//! all while the window is minimized, therefore can't make the timer drift: the
//! next tick converges to the correct value.
//!
//! ```text
//! Idle --start--> Running --zero--> Ringing
//!   ^               |                  |
//!   +--pause/reset--+                  |
//!   +------dismiss/reset/switch--------+
//! ```
//!
//! [`tick`]: TimerEngine::tick

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    alarm::{AlarmPlayer, AlarmSource, Notifier, Playback},
    mode::Mode,
};

/// Largest custom duration, 99:59:59.
pub const MAX_CUSTOM_SECS: u64 = 99 * 3600 + 59 * 60 + 59;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Ringing,
}

/// What a command or tick did, for logging and the window title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started { mode: Mode, ends_at: DateTime<Utc> },
    Paused { time_left: u64 },
    Finished { mode: Mode },
    AlarmDismissed,
}

pub struct TimerEngine<P, N> {
    mode: Mode,
    time_left: u64,
    custom_secs: u64,
    /// `Some` exactly while the countdown is running.
    ends_at: Option<DateTime<Utc>>,
    ringing: bool,
    /// Dropping this silences the alarm.
    playback: Option<Playback>,
    source: AlarmSource,
    player: P,
    notifier: N,
}

impl<P, N> std::fmt::Debug for TimerEngine<P, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("mode", &self.mode)
            .field("time_left", &self.time_left)
            .field("custom_secs", &self.custom_secs)
            .field("ends_at", &self.ends_at)
            .field("ringing", &self.ringing)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<P: AlarmPlayer, N: Notifier> TimerEngine<P, N> {
    /// Idle in pomodoro mode with the full 25 minutes left.
    pub fn new(player: P, notifier: N) -> Self {
        let mode = Mode::default();
        Self {
            mode,
            time_left: mode.base_secs().unwrap_or_default(),
            custom_secs: 0,
            ends_at: None,
            ringing: false,
            playback: None,
            source: AlarmSource::default(),
            player,
            notifier,
        }
    }

    // queries

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn time_left(&self) -> u64 {
        self.time_left
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.ends_at.is_some()
    }

    #[must_use]
    pub const fn is_alarm_ringing(&self) -> bool {
        self.ringing
    }

    #[must_use]
    pub const fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    #[must_use]
    pub const fn custom_secs(&self) -> u64 {
        self.custom_secs
    }

    #[must_use]
    pub const fn alarm_source(&self) -> &AlarmSource {
        &self.source
    }

    #[must_use]
    pub const fn state(&self) -> TimerState {
        if self.ringing {
            TimerState::Ringing
        } else if self.ends_at.is_some() {
            TimerState::Running
        } else {
            TimerState::Idle
        }
    }

    /// Duration a fresh countdown of the current mode starts from.
    #[must_use]
    pub fn configured_secs(&self) -> u64 {
        self.mode.base_secs().unwrap_or(self.custom_secs)
    }

    /// 0.0 when a countdown starts, 1.0 when it reaches zero.
    #[must_use]
    pub fn progress(&self) -> f32 {
        let total = self.configured_secs();
        if total == 0 {
            return if self.ringing { 1.0 } else { 0.0 };
        }
        #[allow(clippy::cast_precision_loss)]
        let left = self.time_left.min(total) as f32 / total as f32;
        1.0 - left
    }

    // commands

    /// Stops everything and loads the full duration of `mode`.
    pub fn switch_mode(&mut self, mode: Mode) -> Option<Event> {
        let event = self.dismiss_alarm();
        self.ends_at = None;
        self.mode = mode;
        self.time_left = self.configured_secs();
        event
    }

    /// The primary button: stops a ringing alarm, otherwise starts or pauses.
    pub fn toggle_start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.ringing {
            return self.dismiss_alarm();
        }
        if self.ends_at.take().is_some() {
            // paused at whatever the last tick computed
            return Some(Event::Paused {
                time_left: self.time_left,
            });
        }
        if self.time_left == 0 {
            let duration = self.configured_secs();
            if duration == 0 {
                return None;
            }
            self.time_left = duration;
        }
        let ends_at = now.checked_add_signed(secs(self.time_left))?;
        self.ends_at = Some(ends_at);
        Some(Event::Started {
            mode: self.mode,
            ends_at,
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        let event = self.dismiss_alarm();
        self.ends_at = None;
        self.time_left = self.configured_secs();
        event
    }

    /// Adds `delta` seconds to the custom duration, only while idle in custom mode.
    pub fn adjust_custom_duration(&mut self, delta: i64) {
        if self.mode != Mode::Custom || self.is_active() {
            return;
        }
        self.custom_secs = self
            .custom_secs
            .saturating_add_signed(delta)
            .min(MAX_CUSTOM_SECS);
        self.time_left = self.custom_secs;
    }

    /// Recomputes the remaining time from the end instant and rings when it hits zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let ends_at = self.ends_at?;
        let remaining = remaining_secs(ends_at, now);
        if remaining > 0 {
            self.time_left = remaining;
            return None;
        }
        self.ends_at = None;
        self.time_left = 0;
        self.ring();
        Some(Event::Finished { mode: self.mode })
    }

    /// Called when the window becomes visible again.
    pub fn resync(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.tick(now)
    }

    pub fn dismiss_alarm(&mut self) -> Option<Event> {
        // dropping the handle stops the sound
        self.playback = None;
        if !self.ringing {
            return None;
        }
        self.ringing = false;
        Some(Event::AlarmDismissed)
    }

    /// Sound used the next time the countdown finishes.
    pub fn set_alarm_source(&mut self, source: AlarmSource) {
        self.source = source;
    }

    fn ring(&mut self) {
        self.ringing = true;
        self.playback = None;
        match self.player.play(&self.source) {
            Ok(playback) => self.playback = Some(playback),
            // still ringing so the user can dismiss it
            Err(err) => log::error!("couldn't start alarm {}: {err}", self.source),
        }
        self.notifier
            .notify("Timer Finished!", &format!("{} is over.", self.mode.label()));
    }
}

/// `max(0, ceil((ends_at - now) / 1s))`
fn remaining_secs(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (ends_at - now).num_milliseconds();
    u64::try_from(millis).map_or(0, |millis| millis.div_ceil(1000))
}

fn secs(secs: u64) -> TimeDelta {
    TimeDelta::seconds(i64::try_from(secs.min(MAX_CUSTOM_SECS)).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, MutexGuard};

    use chrono::TimeZone;

    use super::*;
    use crate::error::PlaybackError;

    #[derive(Default)]
    struct Log {
        plays: usize,
        stops: usize,
        notes: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct Fake(Arc<Mutex<Log>>);

    impl Fake {
        fn log(&self) -> MutexGuard<'_, Log> {
            self.0.lock().unwrap()
        }
    }

    impl AlarmPlayer for Fake {
        fn play(&mut self, _source: &AlarmSource) -> Result<Playback, PlaybackError> {
            self.log().plays += 1;
            let log = Arc::clone(&self.0);
            Ok(Playback::new(move || log.lock().unwrap().stops += 1))
        }
    }

    impl Notifier for Fake {
        fn notify(&mut self, title: &str, body: &str) {
            self.log().notes.push(format!("{title}: {body}"));
        }
    }

    struct Broken;

    impl AlarmPlayer for Broken {
        fn play(&mut self, _source: &AlarmSource) -> Result<Playback, PlaybackError> {
            Err(PlaybackError::Disconnected)
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + TimeDelta::seconds(secs)
    }

    fn engine() -> (TimerEngine<Fake, Fake>, Fake) {
        let fake = Fake::default();
        (TimerEngine::new(fake.clone(), fake.clone()), fake)
    }

    #[test]
    fn starts_idle_at_pomodoro() {
        let (engine, _) = engine();
        assert_eq!(engine.mode(), Mode::Pomodoro);
        assert_eq!(engine.time_left(), 1500);
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.ends_at(), None);
    }

    #[test]
    fn start_sets_end_instant_and_pause_keeps_time() {
        let (mut engine, _) = engine();
        assert_eq!(
            engine.toggle_start(t0()),
            Some(Event::Started {
                mode: Mode::Pomodoro,
                ends_at: at(1500)
            })
        );
        assert!(engine.is_active());

        engine.tick(at(100));
        assert_eq!(engine.time_left(), 1400);
        assert_eq!(
            engine.toggle_start(at(100)),
            Some(Event::Paused { time_left: 1400 })
        );
        assert!(!engine.is_active());
        assert_eq!(engine.ends_at(), None);

        // time spent paused doesn't count
        engine.tick(at(5000));
        assert_eq!(engine.time_left(), 1400);
        engine.toggle_start(at(5000));
        assert_eq!(engine.ends_at(), Some(at(6400)));
    }

    #[test]
    fn rounds_partial_seconds_up() {
        let (mut engine, _) = engine();
        engine.switch_mode(Mode::Short);
        engine.toggle_start(t0());
        engine.tick(t0() + TimeDelta::milliseconds(200));
        assert_eq!(engine.time_left(), 300);
        engine.tick(t0() + TimeDelta::milliseconds(1001));
        assert_eq!(engine.time_left(), 299);
    }

    #[test]
    fn missed_ticks_resync_to_wall_clock() {
        let (mut engine, _) = engine();
        engine.toggle_start(t0());
        assert_eq!(engine.resync(at(600)), None);
        assert_eq!(engine.time_left(), 900);
    }

    #[test]
    fn reaching_zero_rings_and_notifies() {
        let (mut engine, fake) = engine();
        engine.switch_mode(Mode::Short);
        engine.toggle_start(t0());
        assert_eq!(
            engine.tick(at(300)),
            Some(Event::Finished { mode: Mode::Short })
        );
        assert_eq!(engine.state(), TimerState::Ringing);
        assert!(!engine.is_active());
        assert_eq!(engine.time_left(), 0);
        assert_eq!(fake.log().plays, 1);
        assert_eq!(
            fake.log().notes,
            vec!["Timer Finished!: Short Break is over.".to_string()]
        );

        // a late tick doesn't ring twice
        assert_eq!(engine.tick(at(400)), None);
        assert_eq!(fake.log().plays, 1);
    }

    #[test]
    fn primary_button_dismisses_ringing_alarm() {
        let (mut engine, fake) = engine();
        engine.switch_mode(Mode::Short);
        engine.toggle_start(t0());
        engine.tick(at(301));
        assert_eq!(engine.toggle_start(at(302)), Some(Event::AlarmDismissed));
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(fake.log().stops, 1);
        // still at zero, not restarted
        assert_eq!(engine.time_left(), 0);
        assert!(!engine.is_active());
    }

    #[test]
    fn start_from_zero_rearms_configured_duration() {
        let (mut engine, _) = engine();
        engine.switch_mode(Mode::Long);
        engine.toggle_start(t0());
        engine.tick(at(900));
        engine.dismiss_alarm();
        engine.toggle_start(at(1000));
        assert_eq!(engine.time_left(), 900);
        assert_eq!(engine.ends_at(), Some(at(1900)));
    }

    #[test]
    fn zero_custom_duration_never_starts() {
        let (mut engine, _) = engine();
        engine.switch_mode(Mode::Custom);
        assert_eq!(engine.time_left(), 0);
        assert_eq!(engine.toggle_start(t0()), None);
        assert!(!engine.is_active());
    }

    #[test]
    fn switching_mode_stops_everything() {
        let (mut engine, fake) = engine();
        engine.switch_mode(Mode::Short);
        engine.toggle_start(t0());
        engine.tick(at(300));
        engine.switch_mode(Mode::Pomodoro);
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.time_left(), 1500);
        assert_eq!(fake.log().stops, 1);
    }

    #[test]
    fn silencing_by_switch_or_reset_is_reported() {
        let (mut engine, fake) = engine();
        engine.switch_mode(Mode::Short);
        engine.toggle_start(t0());
        engine.tick(at(300));
        assert_eq!(engine.reset(), Some(Event::AlarmDismissed));
        assert_eq!(engine.reset(), None);

        engine.toggle_start(at(400));
        engine.tick(at(700));
        assert_eq!(engine.switch_mode(Mode::Long), Some(Event::AlarmDismissed));
        assert_eq!(engine.switch_mode(Mode::Short), None);
        assert_eq!(fake.log().stops, 2);
    }

    #[test]
    fn reset_restores_configured_duration() {
        let (mut engine, _) = engine();
        engine.toggle_start(t0());
        engine.tick(at(42));
        engine.reset();
        assert_eq!(engine.time_left(), 1500);
        assert!(!engine.is_active());
    }

    #[test]
    fn custom_duration_is_kept_across_modes() {
        let (mut engine, _) = engine();
        engine.switch_mode(Mode::Custom);
        engine.adjust_custom_duration(3600);
        engine.adjust_custom_duration(-10);
        assert_eq!(engine.time_left(), 3590);
        engine.switch_mode(Mode::Short);
        engine.switch_mode(Mode::Custom);
        assert_eq!(engine.time_left(), 3590);
        assert_eq!(engine.custom_secs(), 3590);
    }

    #[test]
    fn custom_duration_only_adjusts_when_idle_in_custom() {
        let (mut engine, _) = engine();
        engine.adjust_custom_duration(60);
        assert_eq!(engine.custom_secs(), 0);
        assert_eq!(engine.time_left(), 1500);

        engine.switch_mode(Mode::Custom);
        engine.adjust_custom_duration(60);
        engine.toggle_start(t0());
        engine.adjust_custom_duration(60);
        assert_eq!(engine.custom_secs(), 60);
    }

    #[test]
    fn custom_duration_clamps() {
        let (mut engine, _) = engine();
        engine.switch_mode(Mode::Custom);
        engine.adjust_custom_duration(30);
        engine.adjust_custom_duration(-999_999);
        assert_eq!(engine.custom_secs(), 0);
        engine.adjust_custom_duration(i64::MAX);
        assert_eq!(engine.custom_secs(), MAX_CUSTOM_SECS);
    }

    #[test]
    fn failed_playback_still_rings() {
        let fake = Fake::default();
        let mut engine = TimerEngine::new(Broken, fake.clone());
        engine.switch_mode(Mode::Short);
        engine.toggle_start(t0());
        engine.tick(at(300));
        assert!(engine.is_alarm_ringing());
        assert_eq!(fake.log().notes.len(), 1);
        assert_eq!(engine.toggle_start(at(301)), Some(Event::AlarmDismissed));
    }

    #[test]
    fn dropping_engine_silences_alarm() {
        let (mut engine, fake) = engine();
        engine.switch_mode(Mode::Short);
        engine.toggle_start(t0());
        engine.tick(at(300));
        drop(engine);
        assert_eq!(fake.log().stops, 1);
    }

    #[test]
    fn progress_tracks_remaining() {
        let (mut engine, _) = engine();
        assert!(engine.progress().abs() < f32::EPSILON);
        engine.toggle_start(t0());
        engine.tick(at(750));
        assert!((engine.progress() - 0.5).abs() < 1e-6);
    }
}
