//! Frame sink — the consumer end of the pipeline.
//!
//! Encoding and transport live elsewhere; this sink either appends raw RGB888
//! rows (stride padding removed) to a file or just counts frames.

use std::path::PathBuf;

use anyhow::{Context, Result};
use minicap_capture::unpadded_rows;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::pipeline::CapturedFrame;

pub struct FrameSink {
    output: Option<PathBuf>,
}

/// What the sink saw before the frame channel closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub frames: u64,
    pub bytes:  u64,
}

impl FrameSink {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    /// Drain `frame_rx` until every sender is gone.
    pub async fn run(self, mut frame_rx: mpsc::Receiver<CapturedFrame>) -> Result<SinkSummary> {
        let mut writer = match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .await
                    .with_context(|| format!("creating {}", path.display()))?;
                info!("Writing RGB888 frames to {}", path.display());
                Some(BufWriter::new(file))
            }
            None => None,
        };

        let mut summary = SinkSummary::default();
        while let Some(frame) = frame_rx.recv().await {
            if let Some(w) = writer.as_mut() {
                for row in unpadded_rows(&frame.data, frame.width, frame.stride, frame.bpp) {
                    w.write_all(row).await.context("writing frame")?;
                    summary.bytes += row.len() as u64;
                }
            }
            summary.frames += 1;
            debug!("frame #{} {}x{}", frame.seq, frame.width, frame.height);
        }

        if let Some(mut w) = writer {
            w.flush().await.context("flushing output")?;
        }
        Ok(summary)
    }
}
