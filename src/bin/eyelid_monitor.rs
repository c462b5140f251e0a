use std::env;
use std::time::Duration;
use eyelid_monitor::utils::logging::{init_tracing, LogConfig};
use eyelid_monitor::{build_engine, latest_frame_slot, EngineConfig, EngineKind, NoFaceDetector};
use tracing::{error, info, warn};

const UI_TICK: Duration = Duration::from_millis(20);

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn load_config() -> anyhow::Result<EngineConfig> {
    match env::var("EYELID_CONFIG") {
        Ok(path) => {
            info!(%path, "loading engine config");
            EngineConfig::from_json_file(path)
        }
        Err(_) => Ok(EngineConfig::new()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG, when set, overrides the default level
    init_tracing(&LogConfig::default());

    let config = load_config()?;
    let kind: EngineKind = env_or("EYELID_ENGINE", "camera").parse()?;
    info!(?kind, "starting eyelid monitor");

    // no landmark model is linked into this binary; camera frames report no face
    let mut engine = build_engine(kind, config, Box::new(NoFaceDetector))?;
    let (publisher, mut reader) = latest_frame_slot();
    engine.start(publisher.into_callback())?;

    let mut ticker = tokio::time::interval(UI_TICK);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut frames: u64 = 0;
    let mut alerting = false;
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                info!("interrupt received");
                break;
            }
            _ = ticker.tick() => {
                if let Some(latest) = reader.take_new() {
                    frames += 1;
                    let [ecr, blg, mar] = latest.labels();
                    if latest.alert != alerting {
                        alerting = latest.alert;
                        warn!(%ecr, %blg, %mar, alert = alerting, "alert state changed");
                    }
                    if frames % 50 == 0 {
                        info!(%ecr, %blg, %mar, bytes = latest.image.len(), "latest frame");
                    }
                } else if !engine.is_running() {
                    error!("engine worker is no longer running");
                    break;
                }
            }
        }
    }

    let outcome = tokio::task::spawn_blocking(move || engine.stop()).await?;
    info!(?outcome, frames, "eyelid monitor stopped");
    Ok(())
}
