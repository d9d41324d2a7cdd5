//! Voice-state change classification.
//!
//! The host reports remote users' moves with a correct `old_channel_id`,
//! but for the local user `old_channel_id` equals `channel_id` on a move.
//! `LocalChannelTracker` remembers where the local user last was and uses
//! that in place of the host's value.

use std::fmt;
use std::sync::Mutex;

use tracing::debug;

use crate::host::VoiceStateEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Join,
    Leave,
    Move,
    Mute,
    Unmute,
    Deafen,
    Undeafen,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 7] = [
        Self::Join,
        Self::Leave,
        Self::Move,
        Self::Mute,
        Self::Unmute,
        Self::Deafen,
        Self::Undeafen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Move => "move",
            Self::Mute => "mute",
            Self::Unmute => "unmute",
            Self::Deafen => "deafen",
            Self::Undeafen => "undeafen",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reportable transition and the channel it should be announced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub kind: TransitionKind,
    pub channel_id: String,
}

/// Classify a channel change. `None` when nothing reportable happened.
pub fn classify_change(channel_id: Option<&str>, old_channel_id: Option<&str>) -> Option<Transition> {
    if channel_id == old_channel_id {
        return None;
    }

    match (channel_id, old_channel_id) {
        (Some(new), old) => Some(Transition {
            kind: if old.is_some() {
                TransitionKind::Move
            } else {
                TransitionKind::Join
            },
            channel_id: new.to_string(),
        }),
        (None, Some(old)) => Some(Transition {
            kind: TransitionKind::Leave,
            channel_id: old.to_string(),
        }),
        (None, None) => None,
    }
}

/// The local user's last observed voice channel.
///
/// Classification of local-user events must go through the same tracker in
/// arrival order; the lock covers the read and the update together.
#[derive(Debug, Default)]
pub struct LocalChannelTracker {
    last_channel_id: Mutex<Option<String>>,
}

impl LocalChannelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(channel_id: Option<String>) -> Self {
        Self {
            last_channel_id: Mutex::new(channel_id),
        }
    }

    pub fn last_channel_id(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.last_channel_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Classify `event`, correcting `old_channel_id` from tracked state when
    /// the event concerns the local user.
    pub fn classify(&self, event: &VoiceStateEvent, is_local_user: bool) -> Option<Transition> {
        if !is_local_user {
            return classify_change(event.channel_id.as_deref(), event.old_channel_id.as_deref());
        }

        let mut last = self.lock();
        let old_channel_id = if event.channel_id != *last {
            let previous = std::mem::replace(&mut *last, event.channel_id.clone());
            debug!(
                "Local channel {:?} -> {:?} (host said old={:?})",
                previous, event.channel_id, event.old_channel_id
            );
            previous
        } else {
            event.old_channel_id.clone()
        };

        classify_change(event.channel_id.as_deref(), old_channel_id.as_deref())
    }
}
