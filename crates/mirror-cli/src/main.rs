//! # scene-mirror
//!
//! Connects to a scene producer, mirrors its state and logs every event.
//! Ctrl-C asks the producer to close and exits once the channel is down.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use mirror_client::{ClientOptions, EventKind, SyncClient, SyncEvent, WebSocketConnector};
use mirror_core::logging::init_subscriber;
use mirror_settings::{MirrorSettings, load_settings, settings_path};
use serde_json::Value;
use tracing::{info, warn};

/// Mirror a remote 3D scene and log its changes.
#[derive(Parser, Debug)]
#[command(name = "scene-mirror", about = "Mirror a remote 3D scene over WebSocket")]
struct Cli {
    /// Producer endpoint (overrides settings).
    #[arg(long)]
    url: Option<String>,

    /// Axis spec applied to inbound positions, e.g. `x-zy`.
    #[arg(long, allow_hyphen_values = true)]
    axes: Option<String>,

    /// Tag of the producer's greeting message.
    #[arg(long)]
    handshake_tag: Option<String>,

    /// Settings file (defaults to `~/.scene-mirror/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level (`RUST_LOG` still wins).
    #[arg(long)]
    log_level: Option<String>,

    /// Frame to set once connected, as `SCENE=N`. Repeatable.
    #[arg(long = "frame", value_name = "SCENE=N")]
    frames: Vec<FrameRequest>,
}

impl Cli {
    fn load_settings(&self) -> Result<MirrorSettings> {
        let path = self.settings.clone().unwrap_or_else(settings_path);
        let mut settings = load_settings(&path)?;
        if let Some(url) = &self.url {
            settings.connection.url.clone_from(url);
        }
        if let Some(axes) = &self.axes {
            settings.connection.axes.clone_from(axes);
        }
        if let Some(tag) = &self.handshake_tag {
            settings.connection.handshake_tag.clone_from(tag);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        settings.validate()?;
        Ok(settings)
    }
}

/// `--frame SCENE=N`
#[derive(Clone, Debug, PartialEq, Eq)]
struct FrameRequest {
    scene: String,
    frame: i64,
}

impl FromStr for FrameRequest {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (scene, frame) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("expected SCENE=N, got `{s}`"))?;
        if scene.is_empty() {
            return Err("scene name must not be empty".into());
        }
        let frame = frame
            .trim()
            .parse()
            .map_err(|e| format!("invalid frame `{frame}`: {e}"))?;
        Ok(Self {
            scene: scene.to_owned(),
            frame,
        })
    }
}

fn log_event(event: &SyncEvent) {
    match event {
        SyncEvent::Open { info } => info!(%info, "producer connected"),
        SyncEvent::Close => info!("producer disconnected"),
        SyncEvent::Error { error } => warn!(error, "transport error"),
        SyncEvent::Context { context } => info!(%context, "context"),
        SyncEvent::Data { store, .. } => {
            let objects: usize = store.values().map(serde_json::Map::len).sum();
            info!(collections = store.len(), objects, "data");
        }
        SyncEvent::Scene { name, scene } => info!(name, scene = %scene.as_ref().unwrap_or(&serde_json::Value::Null), "scene"),
        SyncEvent::Add { scope, name } => info!(scope, name, "add"),
        SyncEvent::Remove { scope, name } => info!(scope, name, "remove"),
        SyncEvent::BadFormat { raw } => warn!(len = raw.len(), "undecodable message"),
        SyncEvent::UnknownMessage { message } => warn!(%message, "unknown message"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = args.load_settings()?;
    init_subscriber(&settings.logging.level);

    let options = ClientOptions::from_settings(&settings).context("Invalid axis spec")?;
    let mut client = SyncClient::with_options(WebSocketConnector::new(), options);
    for kind in EventKind::ALL {
        let _ = client.on(kind, |event| {
            log_event(event);
            Ok(())
        });
    }

    client
        .open(Value::Null)
        .with_context(|| format!("Failed to connect to {}", settings.connection.url))?;

    let mut pending_frames = args.frames;
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());
    let mut closing = false;

    loop {
        tokio::select! {
            result = &mut ctrl_c, if !closing => {
                result.context("Failed to listen for ctrl-c")?;
                info!("Shutting down...");
                closing = true;
                client.close();
            }
            processed = client.process_next() => {
                if !processed? {
                    break;
                }
                if client.is_connected() {
                    for request in pending_frames.drain(..) {
                        let _ = client.send_frame(&request.scene, request.frame)?;
                    }
                }
            }
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["scene-mirror"]);
        assert!(cli.url.is_none());
        assert!(cli.frames.is_empty());
    }

    #[test]
    fn cli_negative_axes() {
        let cli = Cli::parse_from(["scene-mirror", "--axes", "-x-zy"]);
        assert_eq!(cli.axes.as_deref(), Some("-x-zy"));
    }

    #[test]
    fn cli_repeated_frames() {
        let cli = Cli::parse_from([
            "scene-mirror",
            "--frame",
            "Scene=12",
            "--frame",
            "Intro=-3",
        ]);
        assert_eq!(
            cli.frames,
            vec![
                FrameRequest { scene: "Scene".into(), frame: 12 },
                FrameRequest { scene: "Intro".into(), frame: -3 },
            ]
        );
    }

    #[test]
    fn frame_request_rejects_garbage() {
        assert!("Scene".parse::<FrameRequest>().is_err());
        assert!("=4".parse::<FrameRequest>().is_err());
        assert!("Scene=four".parse::<FrameRequest>().is_err());
    }

    #[test]
    fn frame_request_splits_on_last_equals() {
        let request: FrameRequest = "a=b=7".parse().unwrap();
        assert_eq!(request.scene, "a=b");
        assert_eq!(request.frame, 7);
    }

    #[test]
    fn flags_override_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"connection":{"url":"ws://file:1","axes":"xzy"}}"#).unwrap();

        let cli = Cli::parse_from([
            "scene-mirror",
            "--settings",
            path.to_str().unwrap(),
            "--url",
            "ws://flag:2",
            "--handshake-tag",
            "app",
        ]);
        let settings = cli.load_settings().unwrap();
        assert_eq!(settings.connection.url, "ws://flag:2");
        assert_eq!(settings.connection.handshake_tag, "app");
    }

    #[test]
    fn empty_url_flag_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "scene-mirror",
            "--settings",
            dir.path().join("none.json").to_str().unwrap(),
            "--url",
            "",
        ]);
        assert!(cli.load_settings().is_err());
    }

    #[test]
    fn malformed_settings_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{connection").unwrap();

        let cli = Cli::parse_from(["scene-mirror", "--settings", path.to_str().unwrap()]);
        let err = cli.load_settings().unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }
}
