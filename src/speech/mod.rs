//! Speech output: remote synthesis and local playback.
//!
//! - `client`: HTTP text-to-speech, base64 mp3 decoding
//! - `player`: rodio playback with volume/rate and optional serialization
//! - `voices`: voice catalog and voice selection

pub mod client;
pub mod player;
pub mod voices;
