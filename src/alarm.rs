//! The side effects of a finished countdown: a looping alarm sound and a
//! desktop notification.
//!
//! Both sit behind small traits so the timer engine can be driven without an
//! audio device or a notification daemon.

use std::{fmt, sync::mpsc::Sender, sync::Arc};

use crate::{communication::Message, error::PlaybackError};

/// The sound played when the countdown reaches zero.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AlarmSource {
    /// synthesized beep pattern
    #[default]
    Builtin,
    Custom { name: String, data: Arc<[u8]> },
}

impl fmt::Debug for AlarmSource {
    // payloads can be megabytes, don't dump them into logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("Builtin"),
            Self::Custom { name, data } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("bytes", &data.len())
                .finish(),
        }
    }
}

impl fmt::Display for AlarmSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("Default Alarm"),
            Self::Custom { name, .. } => f.write_str(name),
        }
    }
}

/// Handle to a playing alarm. Playback stops when this is dropped.
#[must_use = "dropping a Playback stops the alarm"]
pub struct Playback {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl Playback {
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }
}

impl fmt::Debug for Playback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Playback")
            .field("playing", &self.stop.is_some())
            .finish()
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

pub trait AlarmPlayer {
    /// Starts looping `source` from the beginning.
    ///
    /// # Errors
    /// When the audio backend can't accept the request.
    fn play(&mut self, source: &AlarmSource) -> Result<Playback, PlaybackError>;
}

pub trait Notifier {
    fn notify(&mut self, title: &str, body: &str);
}

/// Plays alarms by messaging the audio thread (see [`crate::audio`]).
#[derive(Debug)]
pub struct ChannelPlayer {
    sender: Sender<Message>,
    next_id: u64,
}

impl ChannelPlayer {
    #[must_use]
    pub const fn new(sender: Sender<Message>) -> Self {
        Self { sender, next_id: 0 }
    }
}

impl AlarmPlayer for ChannelPlayer {
    fn play(&mut self, source: &AlarmSource) -> Result<Playback, PlaybackError> {
        self.next_id += 1;
        let id = self.next_id;
        self.sender
            .send(Message::Ring {
                id,
                source: source.clone(),
            })
            .map_err(|_| PlaybackError::Disconnected)?;
        let sender = self.sender.clone();
        Ok(Playback::new(move || {
            // the audio thread going away already silenced everything
            let _ = sender.send(Message::Stop { id });
        }))
    }
}

/// Whether the user allowed desktop notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPermission {
    #[default]
    Granted,
    Denied,
}

#[derive(Debug, Default)]
pub struct DesktopNotifier {
    permission: NotificationPermission,
}

impl DesktopNotifier {
    #[must_use]
    pub const fn new(permission: NotificationPermission) -> Self {
        Self { permission }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&mut self, title: &str, body: &str) {
        if self.permission == NotificationPermission::Denied {
            return;
        }
        if let Err(err) = notify_rust::Notification::new()
            .appname("Tomidoro")
            .summary(title)
            .body(body)
            .show()
        {
            log::warn!("couldn't show notification: {err}");
        }
    }
}
