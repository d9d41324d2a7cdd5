//! Audio playback for synthesized speech.
//!
//! Each utterance gets its own rodio `Sink` built from the decoded mp3. The
//! sink is the only resource tied to an utterance; it is dropped when the
//! utterance finishes or fails.

use std::io::Cursor;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::client::SynthesizedAudio;
use crate::error::NarratorError;

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Start playing `audio`. Returns once playback has begun (or, for a
    /// serializing player, once it has finished).
    async fn play(&self, audio: SynthesizedAudio, volume: f32, rate: f32) -> Result<(), NarratorError>;

    /// Wait for utterances still playing after `play` returned.
    async fn finish(&self) {}
}

/// Decode `audio` into a rodio source. Nothing touches the output device.
fn decode(audio: SynthesizedAudio) -> Result<Decoder<Cursor<Vec<u8>>>, NarratorError> {
    if audio.bytes.is_empty() {
        return Err(NarratorError::Playback("refusing to play empty audio".into()));
    }

    let mime_type = audio.mime_type;
    Decoder::new(Cursor::new(audio.bytes))
        .map_err(|e| NarratorError::Playback(format!("cannot decode {mime_type}: {e}")))
}

/// Decode `audio` and queue it on `sink` with volume and rate applied.
fn load(sink: &Sink, audio: SynthesizedAudio, volume: f32, rate: f32) -> Result<(), NarratorError> {
    let source = decode(audio)?;
    sink.set_volume(volume);
    sink.set_speed(rate);
    sink.append(source);
    Ok(())
}

pub struct RodioPlayer {
    // In rodio 0.21, OutputStream is the handle and must outlive every sink
    output_stream: OutputStream,
    serialize: bool,
    play_lock: AsyncMutex<()>,
    background: Mutex<JoinSet<()>>,
}

impl RodioPlayer {
    /// Open the default output device.
    pub fn open(serialize: bool) -> Result<Self, NarratorError> {
        let output_stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| NarratorError::Playback(format!("Failed to open audio output: {e}")))?;

        Ok(Self {
            output_stream,
            serialize,
            play_lock: AsyncMutex::new(()),
            background: Mutex::new(JoinSet::new()),
        })
    }

    fn start_sink(&self, audio: SynthesizedAudio, volume: f32, rate: f32) -> Result<Sink, NarratorError> {
        let sink = Sink::connect_new(self.output_stream.mixer());
        load(&sink, audio, volume, rate)?;
        Ok(sink)
    }

    fn background(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.background.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Block until `sink` drains, then drop it.
async fn wait_and_release(sink: Sink) {
    let t_play = Instant::now();
    if let Err(e) = tokio::task::spawn_blocking(move || sink.sleep_until_end()).await {
        warn!("Playback wait task failed: {e}");
    }
    debug!("Utterance finished after {:.1}s", t_play.elapsed().as_secs_f64());
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn play(&self, audio: SynthesizedAudio, volume: f32, rate: f32) -> Result<(), NarratorError> {
        if self.serialize {
            let _guard = self.play_lock.lock().await;
            let sink = self.start_sink(audio, volume, rate)?;
            wait_and_release(sink).await;
            return Ok(());
        }

        let sink = self.start_sink(audio, volume, rate)?;
        let mut background = self.background();
        while background.try_join_next().is_some() {}
        background.spawn(wait_and_release(sink));
        Ok(())
    }

    async fn finish(&self) {
        let mut background = std::mem::take(&mut *self.background());
        while background.join_next().await.is_some() {}
    }
}
