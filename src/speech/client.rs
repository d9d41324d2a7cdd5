//! Remote text-to-speech over HTTP.
//!
//! POSTs `{"text", "voice"}` to the generation endpoint and expects
//! `{"success": bool, "data"?: base64 mp3, "error"?: string}` back.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::TtsConfig;
use crate::error::NarratorError;

pub const AUDIO_MPEG: &str = "audio/mpeg";

/// Decoded speech, ready for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl SynthesizedAudio {
    pub fn mpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: AUDIO_MPEG,
        }
    }
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Turn `text` into audio. `Ok(None)` when there is nothing to say.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Option<SynthesizedAudio>, NarratorError>;
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct TtsClient {
    endpoint: String,
    client: Client,
}

impl TtsClient {
    pub fn new(config: &TtsConfig) -> Result<Self, NarratorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| NarratorError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Decode the base64 payload of a successful generation response.
fn decode_payload(data: Option<&str>) -> Result<SynthesizedAudio, NarratorError> {
    let data = data.ok_or_else(|| NarratorError::Decode("response carried no audio data".into()))?;
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| NarratorError::Decode(format!("invalid base64 audio: {e}")))?;

    if bytes.is_empty() {
        return Err(NarratorError::Decode("audio payload is empty".into()));
    }

    Ok(SynthesizedAudio::mpeg(bytes))
}

#[async_trait]
impl Synthesizer for TtsClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Option<SynthesizedAudio>, NarratorError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let t_start = Instant::now();
        let body = json!({
            "text": text,
            "voice": voice_id,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NarratorError::transport(format!("request to {} timed out", self.endpoint))
                } else if e.is_connect() {
                    NarratorError::transport(format!("cannot connect to {}", self.endpoint))
                } else {
                    NarratorError::transport(format!("request failed: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NarratorError::Transport {
                status: Some(status.as_u16()),
                message: format!(
                    "TTS API error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
                .trim_end()
                .to_string(),
            });
        }

        let data: GenerationResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                NarratorError::transport(format!("reading response from {} timed out", self.endpoint))
            } else {
                NarratorError::Decode(format!("malformed TTS response: {e}"))
            }
        })?;

        if !data.success {
            return Err(NarratorError::Service(
                data.error.unwrap_or_else(|| "Unknown TTS API error".into()),
            ));
        }

        let audio = decode_payload(data.data.as_deref())?;
        debug!(
            "Synthesized {} chars -> {} bytes ({:.0}ms)",
            text.len(),
            audio.bytes.len(),
            t_start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Some(audio))
    }
}
