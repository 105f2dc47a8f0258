/// Music playback backends.
///
/// The real backend streams one music file through rodio, keeping the
/// decoded bytes around so `play()` can restart the track from the top on
/// a replay. Playback state is read straight off the sink: `empty()` means
/// the track ran out.
///
/// Compile with `--no-default-features` or without the "sound" feature to
/// drop the rodio dependency; the show then runs against `SilentTrack`,
/// which pretends to play for a configured number of seconds so the finale
/// still happens.

use std::time::{Duration, Instant};

use crate::sim::audio::{MusicBackend, PlayError};

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

    use crate::sim::audio::{MusicBackend, PlayError};

    pub struct RodioMusic {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        bytes: Arc<Vec<u8>>,
        sink: Option<Sink>,
    }

    impl RodioMusic {
        /// Open the default output device and load the music file whole.
        /// Returns None when either is unavailable — the caller falls back
        /// to the silent track.
        pub fn load(path: &Path) -> Option<Self> {
            let bytes = match std::fs::read(path) {
                Ok(b) => Arc::new(b),
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                    return None;
                }
            };
            let (stream, handle) = OutputStream::try_default().ok()?;
            Some(RodioMusic {
                _stream: stream,
                handle,
                bytes,
                sink: None,
            })
        }
    }

    impl MusicBackend for RodioMusic {
        fn play(&mut self) -> Result<(), PlayError> {
            let sink = Sink::try_new(&self.handle).map_err(|_| PlayError::NoDevice)?;
            let cursor = Cursor::new(self.bytes.as_ref().clone());
            let source = Decoder::new(cursor).map_err(|_| PlayError::BadSource)?;
            sink.append(source);
            self.sink = Some(sink);
            Ok(())
        }

        fn set_volume(&mut self, volume: f32) {
            if let Some(sink) = &self.sink {
                sink.set_volume(volume);
            }
        }

        fn ended(&self) -> bool {
            self.sink.as_ref().map_or(false, |s| s.empty())
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::RodioMusic;

/// Fallback backend: no audio, just a clock. "Plays" for a fixed length
/// so the terminal photo and replay control still arrive.
pub struct SilentTrack {
    length: Duration,
    deadline: Option<Instant>,
}

impl SilentTrack {
    pub fn new(length: Duration) -> Self {
        SilentTrack { length, deadline: None }
    }
}

impl MusicBackend for SilentTrack {
    fn play(&mut self) -> Result<(), PlayError> {
        self.deadline = Some(Instant::now() + self.length);
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn ended(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }
}
