//! Host signals in, spoken sentences out.
//!
//! Planning (tracker update, classification, template formatting) runs
//! synchronously on the caller, in the order signals arrive. Each planned
//! sentence is then synthesized and played on its own task, which logs
//! instead of failing. The pipeline keeps those tasks in a `JoinSet` so
//! shutdown can let them finish.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::template::{format, Speaker};
use super::transition::{LocalChannelTracker, TransitionKind};
use crate::config::NarrationSettings;
use crate::error::NarratorError;
use crate::host::{ChannelKind, User, VoiceHost, VoiceSignals, VoiceStateEvent};
use crate::speech::client::Synthesizer;
use crate::speech::player::AudioPlayer;
use crate::speech::voices::resolve_voice;

/// Channel name used when previewing templates.
const SAMPLE_CHANNEL: &str = "general";

/// Synthesis plus playback for one sentence at a time.
#[derive(Clone)]
pub struct Narrator {
    synthesizer: Arc<dyn Synthesizer>,
    player: Arc<dyn AudioPlayer>,
    settings: Arc<NarrationSettings>,
}

impl Narrator {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        player: Arc<dyn AudioPlayer>,
        settings: Arc<NarrationSettings>,
    ) -> Self {
        Self {
            synthesizer,
            player,
            settings,
        }
    }

    /// Speak `text`. Returns `Ok(false)` when there was nothing to play.
    pub async fn narrate(&self, text: &str) -> Result<bool, NarratorError> {
        if text.trim().is_empty() {
            return Ok(false);
        }

        let voice = resolve_voice(&self.settings)?;
        let Some(audio) = self.synthesizer.synthesize(text, voice).await? else {
            return Ok(false);
        };

        self.player
            .play(audio, self.settings.volume(), self.settings.rate())
            .await?;
        Ok(true)
    }

    /// Narrate, logging and dropping the sentence on failure.
    pub async fn narrate_or_log(&self, text: &str) {
        match self.narrate(text).await {
            Ok(true) => debug!("Narrated: '{text}'"),
            Ok(false) => {}
            Err(e) => warn!("Narration dropped at {} stage ('{text}'): {e}", e.stage()),
        }
    }

    /// Narrate in the background. Failures are logged and the sentence is dropped.
    pub fn spawn(&self, text: String) -> JoinHandle<()> {
        let narrator = self.clone();
        tokio::spawn(async move { narrator.narrate_or_log(&text).await })
    }

    /// Wait for audio the player is still playing in the background.
    pub async fn finish(&self) {
        self.player.finish().await;
    }
}

/// Format the template for `kind` as if `user` had triggered it in a
/// channel called "general". `None` when that kind is disabled.
pub fn sample_text(
    settings: &NarrationSettings,
    kind: TransitionKind,
    user: &User,
    nickname: Option<&str>,
) -> Option<String> {
    let template = settings.messages.enabled(kind)?;
    let speaker = Speaker {
        user: &user.username,
        channel: SAMPLE_CHANNEL,
        display_name: user.display_name(),
        nickname: nickname.unwrap_or(&user.username),
    };
    Some(format(template, speaker, settings.latin_only))
}

pub struct NarrationPipeline {
    host: Arc<dyn VoiceHost>,
    settings: Arc<NarrationSettings>,
    tracker: LocalChannelTracker,
    narrator: Narrator,
    in_flight: Mutex<JoinSet<()>>,
}

impl NarrationPipeline {
    pub fn new(host: Arc<dyn VoiceHost>, settings: Arc<NarrationSettings>, narrator: Narrator) -> Self {
        Self {
            host,
            settings,
            tracker: LocalChannelTracker::new(),
            narrator,
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    fn in_flight(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Synthesize and play `sentence` on a tracked background task.
    fn dispatch(&self, sentence: String) {
        let narrator = self.narrator.clone();
        let mut in_flight = self.in_flight();
        // Reap finished narrations so the set does not grow for the whole session.
        while in_flight.try_join_next().is_some() {}
        in_flight.spawn(async move { narrator.narrate_or_log(&sentence).await });
    }

    /// Narrations dispatched and not yet finished.
    pub fn pending(&self) -> usize {
        self.in_flight().len()
    }

    /// Let dispatched narrations (and their playback) finish, giving up
    /// after `grace`. Called once the host input has ended.
    pub async fn drain(&self, grace: Duration) {
        let mut in_flight = std::mem::take(&mut *self.in_flight());
        let narrator = self.narrator.clone();
        let waiting = async move {
            while let Some(joined) = in_flight.join_next().await {
                if let Err(e) = joined {
                    warn!("Narration task failed: {e}");
                }
            }
            narrator.finish().await;
        };

        if tokio::time::timeout(grace, waiting).await.is_err() {
            warn!("Gave up on in-flight narrations after {}s", grace.as_secs());
        }
    }

    pub fn tracker(&self) -> &LocalChannelTracker {
        &self.tracker
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    fn in_stage_channel(&self, channel_id: Option<&str>) -> bool {
        channel_id
            .and_then(|id| self.host.channel(id))
            .is_some_and(|c| c.kind == ChannelKind::Stage)
    }

    fn channel_name(&self, channel_id: &str) -> String {
        self.host
            .channel(channel_id)
            .map(|c| c.name)
            .unwrap_or_default()
    }

    /// Sentences to speak for one voice-state batch, in batch order.
    pub fn plan_voice_state_updates(&self, states: &[VoiceStateEvent]) -> Vec<String> {
        let my_channel_id = self.host.voice_channel_id();
        if self.in_stage_channel(my_channel_id.as_deref()) {
            debug!("In a stage channel, not narrating voice state updates");
            return Vec::new();
        }

        let Some(me) = self.host.current_user() else {
            warn!("Current user unknown, skipping {} voice states", states.len());
            return Vec::new();
        };
        let guild_id = self.host.guild_id();

        let mut sentences = Vec::new();
        for state in states {
            let is_me = state.user_id == me.id;
            if !is_me {
                // Only channels we are in are heard about.
                let Some(mine) = my_channel_id.as_deref() else {
                    continue;
                };
                if state.channel_id.as_deref() != Some(mine)
                    && state.old_channel_id.as_deref() != Some(mine)
                {
                    continue;
                }
            }

            let Some(transition) = self.tracker.classify(state, is_me) else {
                continue;
            };

            if is_me && self.settings.ignore_self {
                debug!("Ignoring own {} transition", transition.kind);
                continue;
            }

            let Some(template) = self.settings.messages.enabled(transition.kind) else {
                continue;
            };

            let user = if is_me && !self.settings.say_own_name {
                None
            } else {
                self.host.user(&state.user_id)
            };
            let username = user.as_ref().map(|u| u.username.as_str()).unwrap_or("");
            let display_name = user.as_ref().map(|u| u.display_name()).unwrap_or("");
            let nickname = match (&user, guild_id.as_deref()) {
                (Some(u), Some(guild)) => self.host.nickname(guild, &u.id).unwrap_or_else(|| u.username.clone()),
                (Some(u), None) => u.username.clone(),
                (None, _) => String::new(),
            };
            let channel = self.channel_name(&transition.channel_id);

            let sentence = format(
                template,
                Speaker {
                    user: username,
                    channel: &channel,
                    display_name,
                    nickname: &nickname,
                },
                self.settings.latin_only,
            );
            if !sentence.is_empty() {
                info!("{} ({}): '{sentence}'", transition.kind, state.user_id);
                sentences.push(sentence);
            }
        }

        sentences
    }

    /// Sentence for a self mute/deafen toggle. The host fires the toggle
    /// before applying it, so the current state decides the direction.
    fn plan_self_toggle(&self, kind_for: impl Fn(&VoiceStateEvent) -> TransitionKind) -> Option<String> {
        let channel_id = self.host.voice_channel_id()?;
        let state = self.host.voice_state_for_channel(&channel_id)?;
        let kind = kind_for(&state);

        let template = self.settings.messages.enabled(kind)?;
        let channel = self.channel_name(&channel_id);
        let sentence = format(
            template,
            Speaker {
                channel: &channel,
                ..Default::default()
            },
            self.settings.latin_only,
        );

        if sentence.is_empty() {
            return None;
        }
        info!("{kind} (self): '{sentence}'");
        Some(sentence)
    }

    pub fn plan_self_mute_toggle(&self) -> Option<String> {
        self.plan_self_toggle(|s| {
            if s.mute || s.self_mute {
                TransitionKind::Unmute
            } else {
                TransitionKind::Mute
            }
        })
    }

    pub fn plan_self_deafen_toggle(&self) -> Option<String> {
        self.plan_self_toggle(|s| {
            if s.deaf || s.self_deaf {
                TransitionKind::Undeafen
            } else {
                TransitionKind::Deafen
            }
        })
    }
}

impl VoiceSignals for NarrationPipeline {
    fn voice_state_updates(&self, states: &[VoiceStateEvent]) {
        for sentence in self.plan_voice_state_updates(states) {
            self.dispatch(sentence);
        }
    }

    fn self_mute_toggled(&self) {
        if let Some(sentence) = self.plan_self_mute_toggle() {
            self.dispatch(sentence);
        }
    }

    fn self_deafen_toggled(&self) {
        if let Some(sentence) = self.plan_self_deafen_toggle() {
            self.dispatch(sentence);
        }
    }
}
