use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::capture::sink::{CaptureBackend, CaptureConfig, CaptureFactory};
use crate::foundation::core::FrameRGBA;
use crate::foundation::error::{OrreryError, OrreryResult};

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Capture backend that spawns the system `ffmpeg`, streams raw frames to its
/// stdin, and reads the finished MP4 back as chunks.
///
/// ffmpeg writes the container to a temp file because MP4 needs a seekable
/// output; chunks therefore only appear after the finish request completes.
pub struct FfmpegBackend {
    width: u32,
    height: u32,
    out_path: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    chunks: Vec<Vec<u8>>,
    finished: bool,
}

impl FfmpegBackend {
    pub fn open(cfg: &CaptureConfig) -> OrreryResult<Self> {
        cfg.validate()?;
        if !is_ffmpeg_on_path() {
            return Err(OrreryError::capture(
                "ffmpeg is required for MP4 capture, but was not found on PATH",
            ));
        }

        let out_path = temp_output_path();
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]);
        cmd.arg(&out_path);

        let mut child = cmd.spawn().map_err(|e| {
            OrreryError::capture(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| OrreryError::capture("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| OrreryError::capture("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        Ok(Self {
            width: cfg.width,
            height: cfg.height,
            out_path,
            child: Some(child),
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            scratch: vec![0u8; (cfg.width * cfg.height * 4) as usize],
            chunks: Vec::new(),
            finished: false,
        })
    }

    fn collect_stderr(&mut self) -> String {
        let bytes = self
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(|r| r.ok())
            .unwrap_or_default();
        String::from_utf8_lossy(&bytes).trim().to_string()
    }

    fn read_back_output(&mut self) -> OrreryResult<()> {
        const CHUNK: usize = 1 << 20;
        let bytes = std::fs::read(&self.out_path).map_err(|e| {
            OrreryError::capture(format!(
                "failed to read encoded output '{}': {e}",
                self.out_path.display()
            ))
        })?;
        for chunk in bytes.chunks(CHUNK) {
            self.chunks.push(chunk.to_vec());
        }
        let _ = std::fs::remove_file(&self.out_path);
        Ok(())
    }
}

impl CaptureBackend for FfmpegBackend {
    fn push_frame(&mut self, frame: &FrameRGBA) -> OrreryResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(OrreryError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(OrreryError::capture(
                "frame.data size mismatch with width*height*4",
            ));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(OrreryError::capture("push after finish request"));
        };

        // ffmpeg does not understand premultiplied alpha; flatten over black.
        if frame.premultiplied {
            flatten_premul_to_opaque_rgba8(&mut self.scratch, &frame.data);
        } else {
            self.scratch.copy_from_slice(&frame.data);
            for px in self.scratch.chunks_exact_mut(4) {
                px[3] = 255;
            }
        }

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            OrreryError::capture(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn drain_chunks(&mut self, out: &mut Vec<Vec<u8>>) -> OrreryResult<()> {
        out.append(&mut self.chunks);
        Ok(())
    }

    fn request_finish(&mut self) -> OrreryResult<()> {
        // Closing stdin signals end-of-stream; ffmpeg then flushes and exits.
        drop(self.stdin.take());
        Ok(())
    }

    fn poll_finished(&mut self) -> OrreryResult<bool> {
        if self.finished {
            return Ok(true);
        }
        let Some(child) = self.child.as_mut() else {
            return Err(OrreryError::capture("ffmpeg backend already closed"));
        };
        let status = child
            .try_wait()
            .map_err(|e| OrreryError::capture(format!("failed to poll ffmpeg: {e}")))?;
        let Some(status) = status else {
            return Ok(false);
        };
        self.child = None;
        if !status.success() {
            let stderr = self.collect_stderr();
            let _ = std::fs::remove_file(&self.out_path);
            return Err(OrreryError::capture(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }
        self.read_back_output()?;
        self.finished = true;
        Ok(true)
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = std::fs::remove_file(&self.out_path);
        self.chunks.clear();
    }

    fn media_type(&self) -> &str {
        "video/mp4"
    }
}

impl Drop for FfmpegBackend {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Factory over [`FfmpegBackend`].
#[derive(Default)]
pub struct FfmpegFactory;

impl CaptureFactory for FfmpegFactory {
    fn is_supported(&self) -> bool {
        is_ffmpeg_on_path()
    }

    fn acquire(&mut self, cfg: &CaptureConfig) -> OrreryResult<Box<dyn CaptureBackend>> {
        Ok(Box::new(FfmpegBackend::open(cfg)?))
    }
}

fn temp_output_path() -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "orrery_capture_{}_{}_{}.mp4",
        std::process::id(),
        nanos,
        NEXT.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Flatten premultiplied RGBA8 over black into opaque RGBA8.
fn flatten_premul_to_opaque_rgba8(dst: &mut [u8], src_premul: &[u8]) {
    debug_assert_eq!(dst.len(), src_premul.len());
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        // Premultiplied color over black is just the color channels.
        d[0] = s[0];
        d[1] = s[1];
        d[2] = s[2];
        d[3] = 255;
    }
}
