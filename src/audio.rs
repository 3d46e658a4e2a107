//! The audio thread.
//!
//! The rodio output stream can't leave the thread that opened it, so it lives
//! here and the ui talks to it through [`Message`]s.

use std::{
    io::Cursor,
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Duration,
};

use rodio::{source::SineWave, Decoder, OutputStream, Sink, Source};

use crate::{alarm::AlarmSource, communication::Message};

const VOLUME: f32 = 0.6;

/// Spawns the audio thread, it exits once every sender is dropped.
///
/// # Errors
/// If the thread can't be spawned.
pub fn spawn() -> std::io::Result<Sender<Message>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("tomidoro-audio".to_string())
        .spawn(move || run(&rx))?;
    Ok(tx)
}

fn run(rx: &Receiver<Message>) {
    let stream = match rodio::OutputStreamBuilder::open_default_stream() {
        Ok(stream) => Some(stream),
        Err(err) => {
            log::error!("couldn't open audio output, alarms will be silent: {err}");
            None
        }
    };
    let mut ringing: Option<(u64, Sink)> = None;
    while let Ok(message) = rx.recv() {
        match message {
            Message::Ring { id, source } => {
                if let Some((_, sink)) = ringing.take() {
                    sink.stop();
                }
                let Some(stream) = &stream else {
                    continue;
                };
                log::info!("ringing alarm {id} with {source}");
                match start(stream, &source) {
                    Ok(sink) => ringing = Some((id, sink)),
                    Err(err) => log::error!("couldn't play alarm {source}: {err}"),
                }
            }
            Message::Stop { id } => {
                if ringing.as_ref().is_some_and(|(current, _)| *current == id) {
                    if let Some((_, sink)) = ringing.take() {
                        log::info!("alarm {id} stopped");
                        sink.stop();
                    }
                }
            }
        }
    }
}

fn start(stream: &OutputStream, source: &AlarmSource) -> Result<Sink, rodio::decoder::DecoderError> {
    let sink = Sink::connect_new(stream.mixer());
    sink.set_volume(VOLUME);
    match source {
        AlarmSource::Builtin => sink.append(beep()),
        AlarmSource::Custom { data, .. } => {
            // create source that repeatedly plays the sound from the start
            sink.append(Decoder::new(Cursor::new(data.clone()))?.repeat_infinite());
        }
    }
    sink.play();
    Ok(sink)
}

/// A 200 ms 880 Hz beep every 600 ms, forever.
fn beep() -> impl Source + Send + 'static {
    SineWave::new(880.0)
        .take_duration(Duration::from_millis(200))
        .delay(Duration::from_millis(400))
        .repeat_infinite()
}
