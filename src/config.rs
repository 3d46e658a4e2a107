//! Persisted settings: which alarm is selected and the imported alarm sounds.
//!
//! Everything lives in one toml file in the platform config directory. Reading
//! never fails, a missing or broken file just means defaults.

use std::{
    fmt,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::{
    alarm::AlarmSource,
    error::{ImportError, Result, SettingsError},
};

/// Largest accepted alarm sound, 2 MiB.
pub const MAX_ALARM_BYTES: u64 = 2 * 1024 * 1024;

/// Identifies the built-in alarm or one of the custom alarms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(String);

impl AlarmId {
    const DEFAULT: &'static str = "default";

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Milliseconds since the epoch, bumped until it doesn't collide with `taken`.
    fn fresh(taken: &[CustomAlarm]) -> Self {
        let mut millis = chrono::Utc::now().timestamp_millis();
        loop {
            let id = Self(millis.to_string());
            if !id.is_default() && taken.iter().all(|alarm| alarm.id != id) {
                return id;
            }
            millis += 1;
        }
    }
}

impl Default for AlarmId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl From<&str> for AlarmId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAlarm {
    pub id: AlarmId,
    pub name: String,
    #[serde(with = "payload")]
    pub data: Arc<[u8]>,
}

impl fmt::Debug for CustomAlarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAlarm")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl From<&CustomAlarm> for AlarmSource {
    fn from(alarm: &CustomAlarm) -> Self {
        Self::Custom {
            name: alarm.name.clone(),
            data: Arc::clone(&alarm.data),
        }
    }
}

/// Audio bytes are stored as base64 strings.
mod payload {
    use std::sync::Arc;

    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Arc<[u8]>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&data[..]))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<[u8]>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map(Arc::from)
            .map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub selected_alarm: AlarmId,
    #[serde(default)]
    pub custom_alarms: Vec<CustomAlarm>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from `path`, falling back to defaults on any problem.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(SettingsError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                log::debug!("no settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                log::warn!("{err}, using defaults");
                Self::default()
            }
        }
    }

    /// # Errors
    /// When the file can't be read or isn't valid settings.
    pub fn try_load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Overwrites `path` with these settings.
    ///
    /// # Errors
    /// When serializing or writing fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string(self)?;
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        fs::write(path, contents).map_err(write_err)
    }

    /// `<config dir>/tomidoro/settings.toml`
    ///
    /// # Errors
    /// If the platform has no config directory.
    pub fn settings_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "tomidoro").ok_or(SettingsError::NoConfigDir)?;
        Ok(dirs.config_dir().join("settings.toml"))
    }

    #[must_use]
    pub fn custom_alarm(&self, id: &AlarmId) -> Option<&CustomAlarm> {
        self.custom_alarms.iter().find(|alarm| &alarm.id == id)
    }

    /// Appends a new alarm and returns its id.
    ///
    /// # Errors
    /// [`ImportError::TooLarge`] when `data` is over [`MAX_ALARM_BYTES`].
    pub fn add_custom_alarm(&mut self, name: String, data: Vec<u8>) -> Result<AlarmId, ImportError> {
        let size = data.len() as u64;
        if size > MAX_ALARM_BYTES {
            return Err(ImportError::TooLarge {
                size,
                limit: MAX_ALARM_BYTES,
            });
        }
        let id = AlarmId::fresh(&self.custom_alarms);
        self.custom_alarms.push(CustomAlarm {
            id: id.clone(),
            name,
            data: Arc::from(data),
        });
        Ok(id)
    }

    /// Removes the alarm, falling back to the default one if it was selected.
    pub fn remove_custom_alarm(&mut self, id: &AlarmId) -> Option<CustomAlarm> {
        let index = self.custom_alarms.iter().position(|alarm| &alarm.id == id)?;
        if &self.selected_alarm == id {
            self.selected_alarm = AlarmId::default();
        }
        Some(self.custom_alarms.remove(index))
    }

    /// Selects `id` if it's the default or a known custom alarm.
    pub fn select_alarm(&mut self, id: AlarmId) -> bool {
        if id.is_default() || self.custom_alarm(&id).is_some() {
            self.selected_alarm = id;
            true
        } else {
            false
        }
    }

    /// The selected sound; a selection pointing at nothing plays the default.
    #[must_use]
    pub fn selected_source(&self) -> AlarmSource {
        self.custom_alarm(&self.selected_alarm)
            .map(AlarmSource::from)
            .unwrap_or_default()
    }
}

/// [`Settings`] bound to a file, every change is written straight back.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        let settings = Settings::load(&path);
        Self { path, settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current settings, logging instead of failing.
    pub fn save(&self) {
        if let Err(err) = self.settings.save(&self.path) {
            log::error!("{err}");
        }
    }

    /// # Errors
    /// See [`Settings::add_custom_alarm`].
    pub fn add_custom_alarm(&mut self, name: String, data: Vec<u8>) -> Result<AlarmId, ImportError> {
        let id = self.settings.add_custom_alarm(name, data)?;
        self.save();
        Ok(id)
    }

    /// Reads an audio file into a new custom alarm named after the file.
    ///
    /// The size is checked before reading so oversized files are never loaded.
    ///
    /// # Errors
    /// When the file is too large or can't be read.
    pub fn import_file(&mut self, path: &Path) -> Result<AlarmId, ImportError> {
        let read_err = |source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        };
        let size = fs::metadata(path).map_err(read_err)?.len();
        if size > MAX_ALARM_BYTES {
            return Err(ImportError::TooLarge {
                size,
                limit: MAX_ALARM_BYTES,
            });
        }
        let data = fs::read(path).map_err(read_err)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        let id = self.add_custom_alarm(name, data)?;
        log::info!("imported alarm {id} from {}", path.display());
        Ok(id)
    }

    pub fn remove_custom_alarm(&mut self, id: &AlarmId) -> Option<CustomAlarm> {
        let removed = self.settings.remove_custom_alarm(id)?;
        self.save();
        Some(removed)
    }

    pub fn select_alarm(&mut self, id: AlarmId) -> bool {
        let selected = self.settings.select_alarm(id);
        if selected {
            self.save();
        }
        selected
    }

    #[must_use]
    pub fn selected_source(&self) -> AlarmSource {
        self.settings.selected_source()
    }
}
