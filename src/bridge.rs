//! Host bridge: client events arrive as newline-delimited JSON.
//!
//! The client-side shim forwards its voice events and the bits of its
//! stores the narrator needs (identity, channels, nicknames). `SnapshotHost`
//! mirrors those stores and answers `VoiceHost` queries from the mirror.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::host::{Channel, User, VoiceHost, VoiceSignals, VoiceStateEvent};

/// One line of bridge input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    #[serde(rename_all = "camelCase")]
    Session {
        user: User,
        #[serde(default)]
        guild_id: Option<String>,
        #[serde(default)]
        voice_channel_id: Option<String>,
    },
    UserUpsert {
        user: User,
    },
    ChannelUpsert {
        channel: Channel,
    },
    #[serde(rename_all = "camelCase")]
    MemberNick {
        guild_id: String,
        user_id: String,
        #[serde(default)]
        nick: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    VoiceChannelSelect {
        #[serde(default)]
        guild_id: Option<String>,
        #[serde(default)]
        channel_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    VoiceStateUpdates {
        voice_states: Vec<VoiceStateEvent>,
    },
    AudioToggleSelfMute,
    AudioToggleSelfDeaf,
}

#[derive(Debug, Default)]
struct Snapshot {
    me: Option<User>,
    guild_id: Option<String>,
    voice_channel_id: Option<String>,
    users: HashMap<String, User>,
    channels: HashMap<String, Channel>,
    nicknames: HashMap<(String, String), String>,
    // user id -> latest voice state, only for users currently in a channel
    voice_states: HashMap<String, VoiceStateEvent>,
}

/// Mirror of the client's stores, fed by `HostMessage`s.
#[derive(Debug, Default)]
pub struct SnapshotHost {
    inner: RwLock<Snapshot>,
}

impl SnapshotHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fold a store update into the mirror. Signals are left untouched.
    pub fn apply(&self, message: &HostMessage) {
        let mut snap = self.write();
        match message {
            HostMessage::Session {
                user,
                guild_id,
                voice_channel_id,
            } => {
                info!("Session for {} ({})", user.username, user.id);
                snap.users.insert(user.id.clone(), user.clone());
                snap.me = Some(user.clone());
                snap.guild_id = guild_id.clone();
                snap.voice_channel_id = voice_channel_id.clone();
            }
            HostMessage::UserUpsert { user } => {
                if snap.me.as_ref().is_some_and(|me| me.id == user.id) {
                    snap.me = Some(user.clone());
                }
                snap.users.insert(user.id.clone(), user.clone());
            }
            HostMessage::ChannelUpsert { channel } => {
                snap.channels.insert(channel.id.clone(), channel.clone());
            }
            HostMessage::MemberNick {
                guild_id,
                user_id,
                nick,
            } => {
                let key = (guild_id.clone(), user_id.clone());
                match nick {
                    Some(nick) => {
                        snap.nicknames.insert(key, nick.clone());
                    }
                    None => {
                        snap.nicknames.remove(&key);
                    }
                }
            }
            HostMessage::VoiceChannelSelect {
                guild_id,
                channel_id,
            } => {
                if guild_id.is_some() {
                    snap.guild_id = guild_id.clone();
                }
                snap.voice_channel_id = channel_id.clone();
            }
            HostMessage::VoiceStateUpdates { voice_states } => {
                let my_id = snap.me.as_ref().map(|me| me.id.clone());
                for state in voice_states {
                    if my_id.as_deref() == Some(state.user_id.as_str()) {
                        snap.voice_channel_id = state.channel_id.clone();
                    }
                    if state.channel_id.is_some() {
                        snap.voice_states.insert(state.user_id.clone(), state.clone());
                    } else {
                        snap.voice_states.remove(&state.user_id);
                    }
                }
            }
            HostMessage::AudioToggleSelfMute | HostMessage::AudioToggleSelfDeaf => {}
        }
    }
}

impl VoiceHost for SnapshotHost {
    fn current_user(&self) -> Option<User> {
        self.read().me.clone()
    }

    fn user(&self, user_id: &str) -> Option<User> {
        self.read().users.get(user_id).cloned()
    }

    fn voice_channel_id(&self) -> Option<String> {
        self.read().voice_channel_id.clone()
    }

    fn guild_id(&self) -> Option<String> {
        self.read().guild_id.clone()
    }

    fn channel(&self, channel_id: &str) -> Option<Channel> {
        self.read().channels.get(channel_id).cloned()
    }

    fn nickname(&self, guild_id: &str, user_id: &str) -> Option<String> {
        self.read()
            .nicknames
            .get(&(guild_id.to_string(), user_id.to_string()))
            .cloned()
    }

    fn voice_state_for_channel(&self, channel_id: &str) -> Option<VoiceStateEvent> {
        let snap = self.read();
        let me = snap.me.as_ref()?;
        snap.voice_states
            .get(&me.id)
            .filter(|s| s.channel_id.as_deref() == Some(channel_id))
            .cloned()
    }
}

/// Routes bridge input into the snapshot and the signal handler.
pub struct HostBridge<S> {
    host: Arc<SnapshotHost>,
    signals: S,
}

impl<S: VoiceSignals> HostBridge<S> {
    pub fn new(host: Arc<SnapshotHost>, signals: S) -> Self {
        Self { host, signals }
    }

    pub fn host(&self) -> &Arc<SnapshotHost> {
        &self.host
    }

    pub fn signals(&self) -> &S {
        &self.signals
    }

    /// Update the snapshot first, then raise the matching signal.
    pub fn dispatch(&self, message: &HostMessage) {
        self.host.apply(message);
        match message {
            HostMessage::VoiceStateUpdates { voice_states } => self.signals.voice_state_updates(voice_states),
            HostMessage::AudioToggleSelfMute => self.signals.self_mute_toggled(),
            HostMessage::AudioToggleSelfDeaf => self.signals.self_deafen_toggled(),
            _ => {}
        }
    }

    /// Parse and dispatch one input line. Blank lines are ignored.
    pub fn handle_line(&self, line: &str) -> Result<(), serde_json::Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let message: HostMessage = serde_json::from_str(line)?;
        debug!("Host message: {message:?}");
        self.dispatch(&message);
        Ok(())
    }

    /// Read messages until EOF or Ctrl-C.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, reader: R) -> std::io::Result<()> {
        let mut lines = reader.lines();
        info!("Bridge ready, waiting for host events");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if let Err(e) = self.handle_line(&line) {
                                warn!("Skipping malformed host message: {e}");
                            }
                        }
                        None => {
                            info!("Host input closed");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
