//! vc-narrator: announces voice-channel activity through a remote TTS voice.

pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod narrator;
pub mod speech;

pub use error::NarratorError;
