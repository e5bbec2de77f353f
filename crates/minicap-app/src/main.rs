//! minicap — pull frames from the active display and hand them to a sink.
//!
//! # Architecture
//!
//! ```text
//! FramebufferCompositor (/sys/class/graphics/fbN + /dev/fbN)
//!   │  resolve_display_info → native geometry (logged as JSON)
//!   ▼
//! CapturePipeline (capture thread: snapshot → RGB888 → Bytes)
//!   │  mpsc
//!   ▼
//! FrameSink (raw RGB888 file, or count only)
//! ```
//!
//! # Configuration
//!
//! `MINICAP_CONFIG` names a JSON [`CaptureConfig`] file; `MINICAP_DISPLAY_ID`,
//! `MINICAP_MAX_FRAMES` and `MINICAP_OUTPUT` override single fields. Log
//! verbosity follows `RUST_LOG` (default `info`).

mod pipeline;
mod sink;

use std::sync::Arc;

use anyhow::{Context, Result};
use minicap_capture::{resolve_display_info, start_thread_pool, Compositor, FramebufferCompositor};
use minicap_core::CaptureConfig;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::pipeline::{CapturePipeline, PipelineState};
use crate::sink::FrameSink;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("minicap v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().await?;
    let compositor: Arc<dyn Compositor> =
        Arc::new(FramebufferCompositor::new(&config.sysfs_root, &config.dev_root));
    start_thread_pool(compositor.as_ref());

    let native = resolve_display_info(compositor.as_ref(), config.display_id)
        .with_context(|| format!("resolving display {}", config.display_id))?;
    info!("Display[{}] {}", config.display_id, serde_json::to_string(&native)?);

    let (frame_tx, frame_rx) = mpsc::channel(2);
    let (status_tx, mut status_rx) = mpsc::channel(16);
    let pipeline = CapturePipeline::spawn(Arc::clone(&compositor), &config, frame_tx, status_tx)?;
    let sink = tokio::spawn(FrameSink::new(config.output.clone()).run(frame_rx));

    let mut failed = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping capture");
                pipeline.stop();
                break;
            }
            maybe_status = status_rx.recv() => {
                let Some(status) = maybe_status else { break };
                match status.state {
                    PipelineState::Capturing => {
                        if status.fps > 0.0 {
                            info!("Display[{}] {:.1} fps ({} frames)", status.display_id, status.fps, status.frames_captured);
                        }
                    }
                    PipelineState::Stopped => break,
                    PipelineState::Failed(reason) => {
                        error!("Display[{}] capture failed: {}", status.display_id, reason);
                        failed = Some(reason);
                        break;
                    }
                }
            }
        }
    }

    let captured = pipeline.frames_captured();
    tokio::task::spawn_blocking(move || pipeline.join())
        .await
        .context("joining capture thread")?;
    let summary = sink.await.context("sink task")??;
    info!("Captured {} frames, sink wrote {} bytes", captured, summary.bytes);

    match failed {
        Some(reason) => anyhow::bail!("capture failed: {reason}"),
        None => Ok(()),
    }
}

async fn load_config() -> Result<CaptureConfig> {
    let mut config = match std::env::var("MINICAP_CONFIG") {
        Ok(path) => {
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {path}"))?;
            CaptureConfig::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        Err(_) => CaptureConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok());
    if config.desired_width > 0 && config.desired_height > 0 {
        warn!(
            "Desired size {}x{} is recorded but frames keep the native geometry",
            config.desired_width, config.desired_height
        );
    }
    Ok(config)
}
