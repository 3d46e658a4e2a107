use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Window};

use crate::{
    config::{AlarmId, Settings},
    Intent,
};

const DANGER: Color32 = Color32::from_rgb(255, 71, 87);

/// Renders the settings window while `open` is set and returns what the user asked for.
pub(crate) fn render_settings(
    ctx: &egui::Context,
    open: &mut bool,
    settings: &Settings,
    status: Option<&str>,
) -> Option<Intent> {
    let mut intent = None;
    Window::new("Settings")
        .open(open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.heading("Choose Alarm Sound");
            ui.add_space(6.0);
            if let Some(chosen) = render_alarm_list(ui, settings) {
                intent = Some(chosen);
            }
            ui.add_space(10.0);
            if let Some(chosen) = render_custom_alarm_picker(ui) {
                intent = Some(chosen);
            }
            if let Some(status) = status {
                ui.label(RichText::new(status).color(DANGER));
            }
        });
    intent
}

fn render_alarm_list(ui: &mut egui::Ui, settings: &Settings) -> Option<Intent> {
    let mut intent = None;
    ScrollArea::vertical()
        .id_salt("alarms")
        .max_height(200.0)
        .show(ui, |ui| {
            let selected = &settings.selected_alarm;
            if ui
                .selectable_label(selected.is_default(), "Default Alarm")
                .clicked()
            {
                intent = Some(Intent::SelectAlarm(AlarmId::default()));
            }
            for alarm in &settings.custom_alarms {
                ui.horizontal(|ui| {
                    if ui
                        .selectable_label(selected == &alarm.id, &alarm.name)
                        .clicked()
                    {
                        intent = Some(Intent::SelectAlarm(alarm.id.clone()));
                    }
                    if ui
                        .button(RichText::new("🗑").color(DANGER))
                        .on_hover_text("delete alarm")
                        .clicked()
                    {
                        intent = Some(Intent::DeleteAlarm(alarm.id.clone()));
                    }
                });
            }
        });
    intent
}

fn render_custom_alarm_picker(ui: &mut egui::Ui) -> Option<Intent> {
    if !ui.button("+ Add Custom Alarm (MP3/WAV)").clicked() {
        return None;
    }
    let file_dialog = rfd::FileDialog::new()
        .set_title("Pick alarm sound")
        .add_filter("audio", &["mp3", "wav", "ogg", "flac"]);
    let file_dialog = match directories::UserDirs::new()
        .and_then(|u| u.audio_dir().map(Path::to_path_buf))
    {
        Some(audio_path) => file_dialog.set_directory(audio_path),
        None => file_dialog,
    };
    file_dialog.pick_file().map(Intent::ImportAlarm)
}
