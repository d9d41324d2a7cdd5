use thiserror::Error;

/// Everything that can go wrong between a classified transition and the
/// speaker. None of these ever leave the narration boundary.
#[derive(Error, Debug)]
pub enum NarratorError {
    #[error("TTS transport error: {message}")]
    Transport {
        /// HTTP status, when the server answered at all.
        status: Option<u16>,
        message: String,
    },

    #[error("TTS service error: {0}")]
    Service(String),

    #[error("Audio decode error: {0}")]
    Decode(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl NarratorError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Name of the pipeline stage that produced this error, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Transport { .. } | Self::Service(_) => "synthesis",
            Self::Decode(_) => "decode",
            Self::Playback(_) => "playback",
            Self::Config(_) => "config",
        }
    }
}
