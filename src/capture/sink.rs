use std::sync::Arc;

use crate::foundation::core::{Canvas, FrameRGBA};
use crate::foundation::error::{OrreryError, OrreryResult};
use crate::foundation::math::fnv1a64;

/// Parameters a capture backend is opened with.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    /// Nominal frames per second stamped into the container. Frames are pushed
    /// at display cadence, so this is metadata, not a pacing contract.
    pub fps: u32,
    /// Suggested download filename for the finished artifact.
    pub filename: String,
}

impl CaptureConfig {
    pub fn for_canvas(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            fps: 60,
            filename: "orrery-capture.mp4".to_string(),
        }
    }

    pub fn validate(&self) -> OrreryResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(OrreryError::validation("capture dimensions must be > 0"));
        }
        // yuv420p subsampling needs even dimensions.
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(OrreryError::validation(format!(
                "capture dimensions must be even, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(OrreryError::validation("capture fps must be > 0"));
        }
        if self.filename.trim().is_empty() {
            return Err(OrreryError::validation("capture filename must be non-empty"));
        }
        Ok(())
    }
}

/// A finished recording: the encoded bytes plus download metadata.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub bytes: Arc<Vec<u8>>,
    pub filename: String,
    pub media_type: String,
}

impl Artifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// An open encoder accepting frames and yielding encoded chunks.
///
/// Finishing is two-phase: [`request_finish`](CaptureBackend::request_finish)
/// asks the encoder to flush, and [`poll_finished`](CaptureBackend::poll_finished)
/// is called once per tick until it reports completion. Chunks may continue to
/// arrive between the two.
pub trait CaptureBackend {
    fn push_frame(&mut self, frame: &FrameRGBA) -> OrreryResult<()>;

    /// Move any newly encoded chunks into `out`.
    fn drain_chunks(&mut self, out: &mut Vec<Vec<u8>>) -> OrreryResult<()>;

    fn request_finish(&mut self) -> OrreryResult<()>;

    /// `true` once the encoder has flushed everything after a finish request.
    fn poll_finished(&mut self) -> OrreryResult<bool>;

    /// Discard the recording without producing an artifact.
    fn abort(&mut self);

    fn media_type(&self) -> &str;
}

/// Opens capture backends, and reports up front whether capture is possible in
/// this environment at all.
pub trait CaptureFactory {
    fn is_supported(&self) -> bool;

    fn acquire(&mut self, cfg: &CaptureConfig) -> OrreryResult<Box<dyn CaptureBackend>>;
}

/// Deterministic in-process backend for tests and headless runs. Each frame
/// becomes a small digest record, so output length counts frames exactly.
pub struct MemoryBackend {
    width: u32,
    height: u32,
    chunks: Vec<Vec<u8>>,
    frames: u64,
    finish_requested: bool,
    /// Number of additional polls to report "still flushing" after a finish
    /// request, to exercise the stopping phase.
    finish_delay_polls: u32,
}

impl MemoryBackend {
    pub fn new(cfg: &CaptureConfig, finish_delay_polls: u32) -> Self {
        let header = format!("orrery-mem {}x{}@{}\n", cfg.width, cfg.height, cfg.fps);
        Self {
            width: cfg.width,
            height: cfg.height,
            chunks: vec![header.into_bytes()],
            frames: 0,
            finish_requested: false,
            finish_delay_polls,
        }
    }
}

impl CaptureBackend for MemoryBackend {
    fn push_frame(&mut self, frame: &FrameRGBA) -> OrreryResult<()> {
        if self.finish_requested {
            return Err(OrreryError::capture("push after finish request"));
        }
        if frame.width != self.width || frame.height != self.height {
            return Err(OrreryError::capture(format!(
                "frame size {}x{} does not match capture {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        let digest = fnv1a64(&frame.data);
        self.chunks
            .push(format!("frame {} {digest:016x}\n", self.frames).into_bytes());
        self.frames += 1;
        Ok(())
    }

    fn drain_chunks(&mut self, out: &mut Vec<Vec<u8>>) -> OrreryResult<()> {
        out.append(&mut self.chunks);
        Ok(())
    }

    fn request_finish(&mut self) -> OrreryResult<()> {
        self.finish_requested = true;
        Ok(())
    }

    fn poll_finished(&mut self) -> OrreryResult<bool> {
        if !self.finish_requested {
            return Ok(false);
        }
        if self.finish_delay_polls > 0 {
            self.finish_delay_polls -= 1;
            return Ok(false);
        }
        if !self
            .chunks
            .last()
            .is_some_and(|c| c.starts_with(b"end"))
        {
            self.chunks
                .push(format!("end {} frames\n", self.frames).into_bytes());
        }
        Ok(true)
    }

    fn abort(&mut self) {
        self.chunks.clear();
    }

    fn media_type(&self) -> &str {
        "application/octet-stream"
    }
}

/// Factory over [`MemoryBackend`], with failure knobs for driver tests.
pub struct MemoryFactory {
    pub supported: bool,
    pub fail_acquire: bool,
    pub finish_delay_polls: u32,
}

impl Default for MemoryFactory {
    fn default() -> Self {
        Self {
            supported: true,
            fail_acquire: false,
            finish_delay_polls: 0,
        }
    }
}

impl CaptureFactory for MemoryFactory {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn acquire(&mut self, cfg: &CaptureConfig) -> OrreryResult<Box<dyn CaptureBackend>> {
        cfg.validate()?;
        if self.fail_acquire {
            return Err(OrreryError::capture("memory backend unavailable"));
        }
        Ok(Box::new(MemoryBackend::new(cfg, self.finish_delay_polls)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CaptureConfig {
        CaptureConfig {
            width: 64,
            height: 36,
            fps: 60,
            filename: "out.mp4".to_string(),
        }
    }

    fn frame(byte: u8) -> FrameRGBA {
        FrameRGBA {
            width: 64,
            height: 36,
            data: vec![byte; 64 * 36 * 4],
            premultiplied: true,
        }
    }

    #[test]
    fn config_validation() {
        assert!(cfg().validate().is_ok());
        let mut c = cfg();
        c.width = 63;
        assert!(c.validate().is_err());
        let mut c = cfg();
        c.height = 0;
        assert!(c.validate().is_err());
        let mut c = cfg();
        c.fps = 0;
        assert!(c.validate().is_err());
        let mut c = cfg();
        c.filename = " ".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn memory_backend_counts_frames() {
        let mut backend = MemoryBackend::new(&cfg(), 0);
        backend.push_frame(&frame(1)).unwrap();
        backend.push_frame(&frame(2)).unwrap();
        backend.request_finish().unwrap();
        assert!(backend.poll_finished().unwrap());

        let mut chunks = Vec::new();
        backend.drain_chunks(&mut chunks).unwrap();
        // header + 2 frames + trailer
        assert_eq!(chunks.len(), 4);
        assert!(chunks[3].starts_with(b"end 2"));
    }

    #[test]
    fn finish_delay_holds_completion() {
        let mut backend = MemoryBackend::new(&cfg(), 2);
        backend.push_frame(&frame(1)).unwrap();
        backend.request_finish().unwrap();
        assert!(!backend.poll_finished().unwrap());
        assert!(!backend.poll_finished().unwrap());
        assert!(backend.poll_finished().unwrap());
    }

    #[test]
    fn push_after_finish_is_rejected() {
        let mut backend = MemoryBackend::new(&cfg(), 0);
        backend.request_finish().unwrap();
        assert!(backend.push_frame(&frame(0)).is_err());
    }

    #[test]
    fn mismatched_frame_size_is_rejected() {
        let mut backend = MemoryBackend::new(&cfg(), 0);
        let bad = FrameRGBA {
            width: 10,
            height: 10,
            data: vec![0; 400],
            premultiplied: true,
        };
        assert!(backend.push_frame(&bad).is_err());
    }

    #[test]
    fn factory_knobs() {
        let mut f = MemoryFactory::default();
        assert!(f.is_supported());
        assert!(f.acquire(&cfg()).is_ok());
        f.fail_acquire = true;
        assert!(f.acquire(&cfg()).is_err());
        let mut bad = cfg();
        bad.width = 0;
        f.fail_acquire = false;
        assert!(f.acquire(&bad).is_err());
    }
}
