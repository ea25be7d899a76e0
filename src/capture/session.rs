use std::sync::Arc;

use crate::capture::sink::{Artifact, CaptureBackend, CaptureConfig, CaptureFactory};
use crate::foundation::core::FrameRGBA;
use crate::foundation::error::OrreryResult;

/// One in-flight recording: an open backend plus the chunks drained so far.
///
/// Owned by the playback driver for the duration of a recording run; dropped
/// (via [`abort`](CaptureSession::abort)) or consumed into an [`Artifact`]
/// when finalization completes.
pub(crate) struct CaptureSession {
    backend: Box<dyn CaptureBackend>,
    cfg: CaptureConfig,
    chunks: Vec<Vec<u8>>,
    stopping: bool,
}

impl CaptureSession {
    #[tracing::instrument(skip(factory), fields(w = cfg.width, h = cfg.height, fps = cfg.fps))]
    pub(crate) fn acquire(
        factory: &mut dyn CaptureFactory,
        cfg: &CaptureConfig,
    ) -> OrreryResult<Self> {
        let backend = factory.acquire(cfg)?;
        tracing::debug!("capture session opened");
        Ok(Self {
            backend,
            cfg: cfg.clone(),
            chunks: Vec::new(),
            stopping: false,
        })
    }

    pub(crate) fn push_frame(&mut self, frame: &FrameRGBA) -> OrreryResult<()> {
        self.backend.push_frame(frame)?;
        self.backend.drain_chunks(&mut self.chunks)
    }

    pub(crate) fn request_finish(&mut self) -> OrreryResult<()> {
        self.stopping = true;
        self.backend.request_finish()
    }

    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Poll the finishing backend. `Some(artifact)` once everything flushed.
    pub(crate) fn poll(&mut self) -> OrreryResult<Option<Artifact>> {
        if !self.backend.poll_finished()? {
            self.backend.drain_chunks(&mut self.chunks)?;
            return Ok(None);
        }
        self.backend.drain_chunks(&mut self.chunks)?;
        let mut bytes = Vec::with_capacity(self.chunks.iter().map(Vec::len).sum());
        for chunk in self.chunks.drain(..) {
            bytes.extend_from_slice(&chunk);
        }
        tracing::debug!(bytes = bytes.len(), "capture session finalized");
        Ok(Some(Artifact {
            bytes: Arc::new(bytes),
            filename: self.cfg.filename.clone(),
            media_type: self.backend.media_type().to_string(),
        }))
    }

    pub(crate) fn abort(mut self) {
        tracing::debug!("capture session aborted");
        self.backend.abort();
    }
}
