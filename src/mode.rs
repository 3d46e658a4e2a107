use std::{fmt, str::FromStr};

use eframe::egui::Color32;

/// One of the timer presets shown as tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Pomodoro,
    Short,
    Long,
    Custom,
}

impl Mode {
    pub const ALL: [Self; 4] = [Self::Pomodoro, Self::Short, Self::Long, Self::Custom];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pomodoro => "Pomodoro",
            Self::Short => "Short Break",
            Self::Long => "Long Break",
            Self::Custom => "Custom",
        }
    }

    /// Fixed duration of the preset in seconds, `None` for custom which is user adjusted.
    #[must_use]
    pub const fn base_secs(self) -> Option<u64> {
        match self {
            Self::Pomodoro => Some(25 * 60),
            Self::Short => Some(5 * 60),
            Self::Long => Some(15 * 60),
            Self::Custom => None,
        }
    }

    /// Accent color for the tab, progress ring and primary button.
    #[must_use]
    pub const fn accent(self) -> Color32 {
        match self {
            Self::Pomodoro => Color32::from_rgb(186, 73, 73),
            Self::Short => Color32::from_rgb(56, 133, 138),
            Self::Long => Color32::from_rgb(57, 112, 151),
            Self::Custom => Color32::from_rgb(125, 83, 162),
        }
    }

    const fn key(self) -> &'static str {
        match self {
            Self::Pomodoro => "pomodoro",
            Self::Short => "short",
            Self::Long => "long",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mode `{s}`, expected one of pomodoro, short, long, custom"))
    }
}
