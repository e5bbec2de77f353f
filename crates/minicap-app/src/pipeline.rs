//! `CapturePipeline` — one display's capture loop on a dedicated thread.
//!
//! ```text
//! capture thread                                  tokio runtime
//! ──────────────────────────────────────          ─────────────────────
//! waiter.blocking_wait()
//!   → request_frame()   (blocking snapshot)
//!   → Bytes::copy_from_slice ──── frame_tx ────►  FrameSink::run
//!   → frame.release()   (re-arms waiter)
//!                                 status_tx ────►  main (logs FPS)
//! ```
//!
//! `request_frame()` blocks on the compositor, so it never runs on a runtime
//! worker. Stopping is checked between frames; an in-flight snapshot is not
//! interrupted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use anyhow::{Context, Result};
use bytes::Bytes;
use minicap_capture::{create, frame_signal, Capturer, Compositor};
use minicap_core::{CaptureConfig, DisplayInfo};
use tokio::sync::mpsc;
use tracing::{info, warn};

// ── Messages ──────────────────────────────────────────────────────────────────

/// A frame copied out of the session buffer for the sink.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Packed RGB888, `stride * height * bpp` bytes.
    pub data:   Bytes,
    pub width:  u32,
    pub height: u32,
    pub stride: u32,
    pub bpp:    u32,
    /// Sequence number, from 0.
    pub seq:    u64,
}

/// Live status update sent by the capture thread.
#[derive(Debug, Clone)]
pub struct PipelineStatus {
    pub display_id:      i32,
    pub state:           PipelineState,
    /// Instantaneous frames per second.
    pub fps:             f32,
    pub frames_captured: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Capturing,
    /// Stopped cleanly.
    Stopped,
    /// Failed with an error message.
    Failed(String),
}

// ── CapturePipeline ───────────────────────────────────────────────────────────

/// Handle to a running capture thread.
pub struct CapturePipeline {
    pub display_id: i32,
    stop:           Arc<AtomicBool>,
    frames:         Arc<AtomicU64>,
    thread:         Option<JoinHandle<()>>,
}

impl CapturePipeline {
    /// Bind a session and start pulling frames on a new thread.
    ///
    /// Binding happens before this returns, so a missing display fails here
    /// instead of in the status stream.
    pub fn spawn(
        compositor: Arc<dyn Compositor>,
        config: &CaptureConfig,
        frame_tx: mpsc::Sender<CapturedFrame>,
        status_tx: mpsc::Sender<PipelineStatus>,
    ) -> Result<Self> {
        let display_id = config.display_id;
        let mut capturer = create(compositor, display_id);
        if config.desired_width > 0 && config.desired_height > 0 {
            capturer.set_desired_info(&DisplayInfo::desired(config.desired_width, config.desired_height));
        }

        let (notifier, waiter) = frame_signal();
        capturer.set_frame_available_listener(Arc::new(notifier));
        capturer
            .reconfigure()
            .with_context(|| format!("binding display {display_id}"))?;
        info!("Display[{}] capturing via {}", display_id, capturer.capture_method());

        let stop = Arc::new(AtomicBool::new(false));
        let frames = Arc::new(AtomicU64::new(0));
        let ctx = LoopContext {
            display_id,
            max_frames: config.max_frames,
            stop: Arc::clone(&stop),
            frames: Arc::clone(&frames),
            frame_tx,
            status_tx,
        };

        let thread = std::thread::Builder::new()
            .name(format!("capture-d{display_id}"))
            .spawn(move || run_capture(capturer, waiter, ctx))
            .context("spawning capture thread")?;

        Ok(Self { display_id, stop, frames, thread: Some(thread) })
    }

    /// Request a stop after the current frame (non-blocking).
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Total frames captured so far.
    pub fn frames_captured(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Stop and wait for the capture thread to exit.
    pub fn join(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Display[{}] capture thread panicked", self.display_id);
            }
        }
    }
}

// ── Capture loop ──────────────────────────────────────────────────────────────

struct LoopContext {
    display_id: i32,
    max_frames: Option<u64>,
    stop:       Arc<AtomicBool>,
    frames:     Arc<AtomicU64>,
    frame_tx:   mpsc::Sender<CapturedFrame>,
    status_tx:  mpsc::Sender<PipelineStatus>,
}

impl LoopContext {
    fn send_status(&self, state: PipelineState, fps: f32) {
        let _ = self.status_tx.try_send(PipelineStatus {
            display_id: self.display_id,
            state,
            fps,
            frames_captured: self.frames.load(Ordering::Relaxed),
        });
    }
}

fn run_capture(mut capturer: Box<dyn Capturer>, mut waiter: minicap_capture::FrameWaiter, ctx: LoopContext) {
    let id = ctx.display_id;
    let mut fps_counter = FpsCounter::new();
    ctx.send_status(PipelineState::Capturing, 0.0);

    let outcome = loop {
        if ctx.stop.load(Ordering::Relaxed) {
            info!("Display[{}] stop requested", id);
            break PipelineState::Stopped;
        }
        let seq = ctx.frames.load(Ordering::Relaxed);
        if ctx.max_frames.is_some_and(|max| seq >= max) {
            info!("Display[{}] reached {} frames", id, seq);
            break PipelineState::Stopped;
        }
        if !waiter.blocking_wait() {
            break PipelineState::Stopped;
        }

        let frame = match capturer.request_frame() {
            Ok(f) => f,
            Err(e) => {
                warn!("Display[{}] request_frame: {}", id, e);
                break PipelineState::Failed(e.to_string());
            }
        };
        // The session buffer is overwritten by the next request; copy out.
        let captured = CapturedFrame {
            data:   Bytes::copy_from_slice(frame.data),
            width:  frame.width,
            height: frame.height,
            stride: frame.stride,
            bpp:    frame.bpp,
            seq,
        };
        frame.release();

        if ctx.frame_tx.blocking_send(captured).is_err() {
            info!("Display[{}] sink closed", id);
            break PipelineState::Stopped;
        }
        ctx.frames.fetch_add(1, Ordering::Relaxed);
        fps_counter.tick();
        if let Some(fps) = fps_counter.poll() {
            ctx.send_status(PipelineState::Capturing, fps);
        }
    };

    capturer.release();
    ctx.send_status(outcome, 0.0);
    info!("Display[{}] capture stopped", id);
}

/// Rolling ~1 second FPS counter.
struct FpsCounter {
    count:        u32,
    window_start: Instant,
}

impl FpsCounter {
    fn new() -> Self {
        Self { count: 0, window_start: Instant::now() }
    }

    fn tick(&mut self) {
        self.count += 1;
    }

    /// FPS over the window once it is at least a second old; resets it.
    fn poll(&mut self) -> Option<f32> {
        let elapsed = self.window_start.elapsed().as_secs_f32();
        if elapsed < 1.0 {
            return None;
        }
        let fps = self.count as f32 / elapsed;
        self.count = 0;
        self.window_start = Instant::now();
        Some(fps)
    }
}
