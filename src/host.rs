//! The narrator's view of the chat client it runs inside.
//!
//! `VoiceHost` is the set of synchronous lookups the client exposes
//! (identity, channel directory, nicknames, voice states). `VoiceSignals`
//! is the other direction: one method per event the client emits.

use serde::{Deserialize, Serialize};

/// One user's voice-state change as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStateEvent {
    pub user_id: String,
    /// `None` means the user is not in any voice channel.
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub old_channel_id: Option<String>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub self_mute: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    Voice,
    Stage,
    Other(u8),
}

impl From<u8> for ChannelKind {
    fn from(raw: u8) -> Self {
        match raw {
            2 => Self::Voice,
            13 => Self::Stage,
            other => Self::Other(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Voice => 2,
            ChannelKind::Stage => 13,
            ChannelKind::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
}

/// Synchronous queries answered by the host client.
pub trait VoiceHost: Send + Sync {
    fn current_user(&self) -> Option<User>;

    fn user(&self, user_id: &str) -> Option<User>;

    /// Voice channel the local user currently sits in.
    fn voice_channel_id(&self) -> Option<String>;

    /// Guild currently selected in the client.
    fn guild_id(&self) -> Option<String>;

    fn channel(&self, channel_id: &str) -> Option<Channel>;

    fn nickname(&self, guild_id: &str, user_id: &str) -> Option<String>;

    /// The local user's own voice state in `channel_id`.
    fn voice_state_for_channel(&self, channel_id: &str) -> Option<VoiceStateEvent>;
}

/// Host-emitted signals, delivered serially in arrival order.
pub trait VoiceSignals {
    fn voice_state_updates(&self, states: &[VoiceStateEvent]);

    fn self_mute_toggled(&self);

    fn self_deafen_toggled(&self);
}
