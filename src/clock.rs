//! A background thread that ticks the timer on its own.
//!
//! Frames stop arriving while the window is minimized on some compositors, so
//! the countdown can't rely on `update` alone to notice it reached zero.

use std::{
    io,
    sync::{
        mpsc::{self, RecvTimeoutError, Sender},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::Utc;

use crate::{
    alarm::{AlarmPlayer, Notifier},
    timer::{Event, TimerEngine},
};

/// The engine as shared between the ui thread and the [`Ticker`].
pub type SharedEngine<P, N> = Arc<Mutex<TimerEngine<P, N>>>;

/// Locks the engine, a panic on the other side doesn't make its state unusable.
pub fn lock<P, N>(engine: &Mutex<TimerEngine<P, N>>) -> MutexGuard<'_, TimerEngine<P, N>> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the ticking thread, it is stopped and joined on drop.
#[derive(Debug)]
pub struct Ticker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Ticks `engine` every `interval`, calling `on_event` after any tick that did something.
    ///
    /// # Errors
    /// If the thread can't be spawned.
    pub fn spawn<P, N>(
        engine: SharedEngine<P, N>,
        interval: Duration,
        on_event: impl Fn(&Event) + Send + 'static,
    ) -> io::Result<Self>
    where
        P: AlarmPlayer + Send + 'static,
        N: Notifier + Send + 'static,
    {
        let (stop, rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("tomidoro-clock".to_string())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let event = lock(&engine).tick(Utc::now());
                        if let Some(event) = event {
                            on_event(&event);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // hanging up wakes the thread
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("clock thread panicked");
            }
        }
    }
}
