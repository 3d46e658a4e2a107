#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{
    io,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use chrono::Utc;
use clock::{SharedEngine, Ticker};
use config::{AlarmId, SettingsStore};
use eframe::egui::{
    self, Button, CentralPanel, Color32, Layout, RichText, TopBottomPanel, Vec2,
};
use mode::Mode;
use timer::{Event, TimerEngine};
use widgets::ProgressRing;

pub mod alarm;
pub mod audio;
pub mod clock;
pub mod communication;
pub mod config;
pub mod error;
pub mod mode;
/// the settings window for egui
pub mod settings_panel;
pub mod timer;
pub mod widgets;

pub use alarm::{AlarmPlayer, Notifier};

/// How often the window and the clock thread tick the timer.
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);

const STOP_RED: Color32 = Color32::from_rgb(255, 71, 87);

/// Renders remaining seconds as `H:MM:SS` from one hour up, `MM:SS` below.
#[must_use]
pub fn format_time(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Everything the user can ask for from the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SwitchMode(Mode),
    ToggleStart,
    Reset,
    AdjustCustomDuration(i64),
    SelectAlarm(AlarmId),
    ImportAlarm(PathBuf),
    DeleteAlarm(AlarmId),
    OpenSettings,
    CloseSettings,
}

pub struct Tomidoro<P, N> {
    engine: SharedEngine<P, N>,
    clock: Option<Ticker>,
    store: SettingsStore,
    in_settings: bool,
    /// last user-visible problem, shown in the settings window
    status: Option<String>,
    visible: bool,
}

impl<P: AlarmPlayer, N: Notifier> Tomidoro<P, N> {
    #[must_use]
    pub fn new(mut engine: TimerEngine<P, N>, store: SettingsStore) -> Self {
        engine.set_alarm_source(store.selected_source());
        Self {
            engine: Arc::new(Mutex::new(engine)),
            clock: None,
            store,
            in_settings: false,
            status: None,
            visible: true,
        }
    }

    /// Locks the engine, don't hold on to it across [`Self::apply`].
    pub fn engine(&self) -> MutexGuard<'_, TimerEngine<P, N>> {
        clock::lock(&self.engine)
    }

    #[must_use]
    pub const fn store(&self) -> &SettingsStore {
        &self.store
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[must_use]
    pub const fn in_settings(&self) -> bool {
        self.in_settings
    }

    /// Applies one user intent to the engine or the settings.
    pub fn apply(&mut self, intent: Intent) {
        log::debug!("{intent:?}");
        let event = match intent {
            Intent::SwitchMode(mode) => self.engine().switch_mode(mode),
            Intent::ToggleStart => self.engine().toggle_start(Utc::now()),
            Intent::Reset => self.engine().reset(),
            Intent::AdjustCustomDuration(delta) => {
                self.engine().adjust_custom_duration(delta);
                None
            }
            Intent::SelectAlarm(id) => {
                self.store.select_alarm(id);
                let source = self.store.selected_source();
                self.engine().set_alarm_source(source);
                None
            }
            Intent::ImportAlarm(path) => {
                match self.store.import_file(&path) {
                    Ok(id) => {
                        self.status = None;
                        self.apply(Intent::SelectAlarm(id));
                    }
                    Err(err) => {
                        log::warn!("{err}");
                        self.status = Some(err.to_string());
                    }
                }
                None
            }
            Intent::DeleteAlarm(id) => {
                self.store.remove_custom_alarm(&id);
                let source = self.store.selected_source();
                self.engine().set_alarm_source(source);
                None
            }
            Intent::OpenSettings => {
                self.in_settings = true;
                None
            }
            Intent::CloseSettings => {
                self.in_settings = false;
                self.status = None;
                None
            }
        };
        log_event(event.as_ref());
    }

    /// Ticks the engine; a window coming back from minimized gets an explicit resync.
    pub fn on_frame(&mut self, visible: bool, now: chrono::DateTime<Utc>) {
        let event = if visible && !self.visible {
            log::debug!("window restored, resyncing");
            self.engine().resync(now)
        } else {
            self.engine().tick(now)
        };
        log_event(event.as_ref());
        self.visible = visible;
    }
}

impl<P, N> Tomidoro<P, N>
where
    P: AlarmPlayer + Send + 'static,
    N: Notifier + Send + 'static,
{
    /// Starts the clock thread, it ticks the engine every `interval` whether
    /// or not frames are being drawn and calls `wake` when something happened.
    ///
    /// # Errors
    /// If the thread can't be spawned.
    pub fn spawn_clock(
        &mut self,
        interval: Duration,
        wake: impl Fn() + Send + 'static,
    ) -> io::Result<()> {
        let ticker = Ticker::spawn(Arc::clone(&self.engine), interval, move |event| {
            log_event(Some(event));
            wake();
        })?;
        self.clock = Some(ticker);
        Ok(())
    }
}

fn render_tabs<P: AlarmPlayer, N: Notifier>(
    ctx: &egui::Context,
    engine: &TimerEngine<P, N>,
) -> Option<Intent> {
    let mut intent = None;
    TopBottomPanel::top("tabs").show(ctx, |ui| {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            for mode in Mode::ALL {
                let text = RichText::new(mode.label()).size(16.0);
                let tab = if engine.mode() == mode {
                    Button::new(text.strong()).fill(mode.accent())
                } else {
                    Button::new(text)
                };
                if ui.add(tab).clicked() {
                    intent = Some(Intent::SwitchMode(mode));
                }
            }
            ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button(RichText::new("⚙").size(20.0))
                    .on_hover_text("settings")
                    .clicked()
                {
                    intent = Some(Intent::OpenSettings);
                }
            });
        });
        ui.add_space(8.0);
    });
    intent
}

fn render_timer<P: AlarmPlayer, N: Notifier>(
    ui: &mut egui::Ui,
    engine: &TimerEngine<P, N>,
) -> Option<Intent> {
    let mut intent = None;
    let accent = engine.mode().accent();
    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        let label = format_time(engine.time_left());
        ui.add(ProgressRing::new(engine.progress(), &label, accent).radius(180.0));
        ui.add_space(16.0);

        if engine.mode() == Mode::Custom && !engine.is_active() {
            intent = render_custom_controls(ui).or(intent.take());
            ui.add_space(12.0);
        }

        intent = render_controls(ui, engine, accent).or(intent.take());
    });
    intent
}

fn render_controls<P: AlarmPlayer, N: Notifier>(
    ui: &mut egui::Ui,
    engine: &TimerEngine<P, N>,
    accent: Color32,
) -> Option<Intent> {
    let mut intent = None;
    let (icon, hint, fill) = if engine.is_alarm_ringing() {
        ("✖", "Stop Alarm", STOP_RED)
    } else if engine.is_active() {
        ("⏸", "Pause", accent)
    } else {
        ("▶", "Start", accent)
    };
    // two buttons centered as a group
    let width = 96.0 + 56.0 + ui.spacing().item_spacing.x;
    ui.allocate_ui_with_layout(
        Vec2::new(width, 56.0),
        Layout::left_to_right(egui::Align::Center),
        |ui| {
            let primary = Button::new(RichText::new(icon).size(28.0))
                .fill(fill)
                .min_size(Vec2::new(96.0, 56.0));
            if ui.add(primary).on_hover_text(hint).clicked() {
                intent = Some(Intent::ToggleStart);
            }
            let reset = Button::new(RichText::new("↺").size(22.0)).min_size(Vec2::new(56.0, 44.0));
            if ui.add(reset).on_hover_text("Reset").clicked() {
                intent = Some(Intent::Reset);
            }
        },
    );
    intent
}

fn render_custom_controls(ui: &mut egui::Ui) -> Option<Intent> {
    const STEPS: [(&str, &str, i64); 3] = [("-1h", "+1h", 3600), ("-1m", "+1m", 60), ("-10s", "+10s", 10)];
    let mut intent = None;
    ui.allocate_ui_with_layout(
        Vec2::new(330.0, 28.0),
        Layout::left_to_right(egui::Align::Center),
        |ui| {
            for (less, more, step) in STEPS {
                if ui.button(less).clicked() {
                    intent = Some(Intent::AdjustCustomDuration(-step));
                }
                if ui.button(more).clicked() {
                    intent = Some(Intent::AdjustCustomDuration(step));
                }
                ui.add_space(12.0);
            }
        },
    );
    intent
}

fn log_event(event: Option<&Event>) {
    match event {
        Some(Event::Started { mode, ends_at }) => log::info!("{mode} started, ends at {ends_at}"),
        Some(Event::Paused { time_left }) => log::info!("paused with {}", format_time(*time_left)),
        Some(Event::Finished { mode }) => log::info!("{mode} finished"),
        Some(Event::AlarmDismissed) => log::info!("alarm dismissed"),
        None => {}
    }
}

impl<P: AlarmPlayer, N: Notifier> eframe::App for Tomidoro<P, N> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // keep ticking even with no input so the countdown advances
        ctx.request_repaint_after(TICK_INTERVAL);
        let minimized = ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        self.on_frame(!minimized, Utc::now());
        if minimized {
            // nothing to look at, skip the drawing work
            return;
        }

        let mut intents = Vec::new();
        {
            let engine = self.engine();
            intents.extend(render_tabs(ctx, &engine));
            CentralPanel::default().show(ctx, |ui| {
                intents.extend(render_timer(ui, &engine));
            });
        }
        if self.in_settings {
            let mut open = true;
            intents.extend(settings_panel::render_settings(
                ctx,
                &mut open,
                self.store.settings(),
                self.status.as_deref(),
            ));
            if !open {
                intents.push(Intent::CloseSettings);
            }
        }

        for intent in intents {
            self.apply(intent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(5), "00:05");
        assert_eq!(format_time(1500), "25:00");
        assert_eq!(format_time(3599), "59:59");
    }

    #[test]
    fn formats_hours_without_padding() {
        assert_eq!(format_time(3600), "1:00:00");
        assert_eq!(format_time(3661), "1:01:01");
        assert_eq!(format_time(99 * 3600 + 59 * 60 + 59), "99:59:59");
    }
}
