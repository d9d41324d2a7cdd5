//! vc-narrator: speaks voice-channel activity from a chat client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vc_narrator::bridge::{HostBridge, SnapshotHost};
use vc_narrator::config::Config;
use vc_narrator::host::User;
use vc_narrator::narrator::pipeline::{sample_text, NarrationPipeline, Narrator};
use vc_narrator::narrator::transition::TransitionKind;
use vc_narrator::speech::client::TtsClient;
use vc_narrator::speech::player::RodioPlayer;
use vc_narrator::speech::voices::{resolve_voice, VOICES};

/// How long in-flight narrations may keep playing after input ends.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(name = "vc-narrator", about = "Voice channel narrator")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read host events from stdin and narrate them (default)
    Run,
    /// Speak arbitrary text with the configured voice
    Speak { text: String },
    /// Preview the message template for a transition kind
    Sample {
        /// join, leave, move, mute, unmute, deafen or undeafen
        kind: String,
        #[arg(long, default_value = "you")]
        user: String,
        #[arg(long)]
        nickname: Option<String>,
    },
    /// List known voices
    Voices,
}

/// `serialize` makes `narrate` return only after the utterance has played,
/// which one-shot commands need so the process outlives the sound.
fn build_narrator(config: &Config, serialize: bool) -> Result<Narrator, Box<dyn std::error::Error>> {
    let settings = Arc::new(config.narration.clone());
    let client = TtsClient::new(&config.tts)?;
    info!("TTS endpoint: {}", client.endpoint());
    let player = RodioPlayer::open(serialize)?;
    Ok(Narrator::new(Arc::new(client), Arc::new(player), settings))
}

async fn speak_now(narrator: &Narrator, text: &str) {
    if let Err(e) = narrator.narrate(text).await {
        tracing::warn!("Failed to speak at {} stage: {e}", e.stage());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug,rodio=info,symphonia=warn,reqwest=info,hyper_util=info")
    } else {
        EnvFilter::new("info,rodio=warn,symphonia=warn,reqwest=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(args.config.as_deref());

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!("vc-narrator starting");
            let narrator = build_narrator(&config, config.playback.serialize)?;
            let host = Arc::new(SnapshotHost::new());
            let pipeline = NarrationPipeline::new(host.clone(), Arc::new(config.narration.clone()), narrator);
            let bridge = HostBridge::new(host, pipeline);
            bridge.run(tokio::io::BufReader::new(tokio::io::stdin())).await?;
            bridge.signals().drain(SHUTDOWN_GRACE).await;
        }
        Command::Speak { text } => {
            let narrator = build_narrator(&config, true)?;
            speak_now(&narrator, &text).await;
        }
        Command::Sample { kind, user, nickname } => {
            let kind = TransitionKind::parse(&kind).ok_or_else(|| format!("unknown transition kind: {kind}"))?;
            let user = User {
                id: String::new(),
                username: user,
                global_name: None,
            };
            match sample_text(&config.narration, kind, &user, nickname.as_deref()) {
                Some(text) => {
                    println!("{text}");
                    let narrator = build_narrator(&config, true)?;
                    speak_now(&narrator, &text).await;
                }
                None => println!("{kind} narration is disabled"),
            }
        }
        Command::Voices => {
            let selected = resolve_voice(&config.narration).ok();
            for voice in VOICES {
                let marker = if selected == Some(voice.id) { "*" } else { " " };
                println!("{marker} {:<22} {}", voice.id, voice.name);
            }
            if let Some(id) = selected.filter(|id| !VOICES.iter().any(|v| v.id == *id)) {
                println!("* {id:<22} (custom)");
            }
        }
    }

    Ok(())
}
