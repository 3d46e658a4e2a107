use crate::alarm::AlarmSource;

/// Messages sent from the ui thread to the audio thread.
#[derive(Debug)]
pub enum Message {
    /// start looping `source`, replacing whatever is playing
    Ring { id: u64, source: AlarmSource },
    // only stops playback if `id` is the one currently ringing
    Stop { id: u64 },
}
