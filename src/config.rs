//! Configuration management for vc-narrator.
//!
//! Loads config from YAML files in standard locations. Every section has
//! defaults, so an empty or missing file yields a working narrator.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::narrator::transition::TransitionKind;

pub const DEFAULT_TTS_ENDPOINT: &str = "https://tiktok-tts.weilnet.workers.dev/api/generation";

/// One spoken template per transition kind. An empty template disables
/// narration for that kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub join: String,
    pub leave: String,
    pub r#move: String,
    pub mute: String,
    pub unmute: String,
    pub deafen: String,
    pub undeafen: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            join: "{{USER}} joined".into(),
            leave: "{{USER}} left".into(),
            r#move: "{{USER}} moved to {{CHANNEL}}".into(),
            mute: "{{USER}} muted".into(),
            unmute: "{{USER}} unmuted".into(),
            deafen: "{{USER}} deafened".into(),
            undeafen: "{{USER}} undeafened".into(),
        }
    }
}

impl MessageTemplates {
    pub fn template(&self, kind: TransitionKind) -> &str {
        match kind {
            TransitionKind::Join => &self.join,
            TransitionKind::Leave => &self.leave,
            TransitionKind::Move => &self.r#move,
            TransitionKind::Mute => &self.mute,
            TransitionKind::Unmute => &self.unmute,
            TransitionKind::Deafen => &self.deafen,
            TransitionKind::Undeafen => &self.undeafen,
        }
    }

    /// Template for `kind`, or `None` when that kind is switched off.
    pub fn enabled(&self, kind: TransitionKind) -> Option<&str> {
        let template = self.template(kind);
        (!template.trim().is_empty()).then_some(template)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    pub voice: String,
    pub custom_voice_id: String,
    pub volume: f32,
    pub rate: f32,
    pub say_own_name: bool,
    pub ignore_self: bool,
    pub latin_only: bool,
    pub messages: MessageTemplates,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            voice: "en_us_001".into(),
            custom_voice_id: String::new(),
            volume: 1.0,
            rate: 1.0,
            say_own_name: false,
            ignore_self: false,
            latin_only: false,
            messages: MessageTemplates::default(),
        }
    }
}

impl NarrationSettings {
    pub fn volume(&self) -> f32 {
        if self.volume.is_nan() {
            return 1.0;
        }
        self.volume.clamp(0.0, 1.0)
    }

    pub fn rate(&self) -> f32 {
        if self.rate.is_nan() {
            return 1.0;
        }
        self.rate.clamp(0.1, 4.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TTS_ENDPOINT.into(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Play utterances one after another instead of letting them overlap.
    pub serialize: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { serialize: true }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub narration: NarrationSettings,
    pub tts: TtsConfig,
    pub playback: PlaybackConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/vc-narrator/config.yaml
    /// 3. /etc/vc-narrator/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/vc-narrator/config.yaml")),
                Some(PathBuf::from("/etc/vc-narrator/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }
}
