#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use eframe::{egui::ViewportBuilder, run_native};
use tomidoro::{
    alarm::{ChannelPlayer, DesktopNotifier, NotificationPermission},
    audio,
    config::{AlarmId, Settings, SettingsStore},
    mode::Mode,
    timer::TimerEngine,
    Tomidoro, TICK_INTERVAL,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// settings file to use instead of the one in the config directory
    #[clap(long, global = true)]
    settings: Option<PathBuf>,
    /// mode selected at startup
    #[clap(long, default_value_t = Mode::Pomodoro)]
    mode: Mode,
    /// don't show a desktop notification when the timer finishes
    #[clap(long)]
    no_notifications: bool,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write default settings
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// import an audio file (2 MB max) as an alarm sound and select it
    NewSound { path: PathBuf },
    /// delete a custom alarm sound
    RemoveSound { id: String },
    /// select the alarm sound, `default` for the built-in one
    SelectSound { id: String },
    /// list alarm sounds, the selected one is marked with `*`
    ListSounds,
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    if let Err(err) = simple_file_logger::init_logger!("tomidoro") {
        eprintln!("couldn't initialize logger: {err}");
    }

    let args = Args::parse();
    let settings_path = match args.settings {
        Some(path) => path,
        None => Settings::settings_path()?,
    };

    if let Some(command) = args.command {
        return run_command(command, settings_path);
    }

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("Tomidoro")
            .with_inner_size([720.0, 720.0])
            .with_resizable(false)
            .with_maximize_button(false),
        ..Default::default()
    };

    let permission = if args.no_notifications {
        NotificationPermission::Denied
    } else {
        NotificationPermission::Granted
    };
    let player = ChannelPlayer::new(audio::spawn()?);
    let mut engine = TimerEngine::new(player, DesktopNotifier::new(permission));
    engine.switch_mode(args.mode);
    let mut app = Tomidoro::new(engine, SettingsStore::open(settings_path));

    // run the gui
    run_native(
        "Tomidoro",
        native_options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(eframe::egui::Visuals::dark());
            // the countdown has to finish even when no frames are drawn
            let ctx = cc.egui_ctx.clone();
            app.spawn_clock(TICK_INTERVAL, move || ctx.request_repaint())?;
            Ok(Box::new(app))
        }),
    )
    .map_err(Into::into)
}

fn run_command(command: Command, settings_path: PathBuf) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Init { force } => {
            if force || !settings_path.exists() {
                Settings::new().save(&settings_path)?;
                println!("wrote default settings to {}", settings_path.display());
            } else {
                println!(
                    "{} already exists, use --force to overwrite it",
                    settings_path.display()
                );
            }
        }
        Command::NewSound { path } => {
            let mut store = SettingsStore::open(settings_path);
            let id = store.import_file(&path)?;
            store.select_alarm(id.clone());
            println!("added alarm {id}");
        }
        Command::RemoveSound { id } => {
            let mut store = SettingsStore::open(settings_path);
            match store.remove_custom_alarm(&AlarmId::from(id.as_str())) {
                Some(alarm) => println!("removed {}", alarm.name),
                None => return Err(format!("no alarm with id {id}").into()),
            }
        }
        Command::SelectSound { id } => {
            let mut store = SettingsStore::open(settings_path);
            if !store.select_alarm(AlarmId::from(id.as_str())) {
                return Err(format!("no alarm with id {id}").into());
            }
        }
        Command::ListSounds => {
            let store = SettingsStore::open(settings_path);
            let settings = store.settings();
            let mark = |id: &AlarmId| if &settings.selected_alarm == id { "*" } else { " " };
            println!("{} default  Default Alarm", mark(&AlarmId::default()));
            for alarm in &settings.custom_alarms {
                println!(
                    "{} {}  {} ({} KB)",
                    mark(&alarm.id),
                    alarm.id,
                    alarm.name,
                    alarm.data.len() / 1024
                );
            }
        }
    }
    Ok(())
}
