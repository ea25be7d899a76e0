use crate::capture::session::CaptureSession;
use crate::capture::sink::{Artifact, CaptureConfig, CaptureFactory};
use crate::catalog::model::Catalog;
use crate::compose::frame::paint_frame;
use crate::foundation::core::Canvas;
use crate::foundation::error::{OrreryError, OrreryResult};
use crate::foundation::math::fnv1a64;
use crate::surface::raster::Surface;
use crate::timeline::resolve::resolve;

/// Public lifecycle of the playback engine.
///
/// `Rendering` is `Playing` with an open capture session; it persists through
/// encoder finalization, so observers see a single state for the whole
/// recording run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    Rendering,
    Completed,
    Error,
}

/// Opaque token for one scheduled tick callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// Host-provided display-refresh scheduling. The engine schedules at most one
/// tick at a time and cancels it when playback stops.
pub trait TickScheduler {
    fn schedule(&mut self) -> TickHandle;
    fn cancel(&mut self, handle: TickHandle);
}

/// Scheduler driven explicitly by the host, for headless runs and tests.
/// Clones share state, so a test can hold one half while the engine owns the
/// other.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: std::rc::Rc<std::cell::RefCell<ManualInner>>,
}

#[derive(Default)]
struct ManualInner {
    next_id: u64,
    pending: Vec<TickHandle>,
    scheduled: usize,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn take_pending(&self) -> Vec<TickHandle> {
        std::mem::take(&mut self.inner.borrow_mut().pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().pending.is_empty()
    }

    pub fn scheduled_count(&self) -> usize {
        self.inner.borrow().scheduled
    }

    pub fn cancelled_count(&self) -> usize {
        self.inner.borrow().cancelled
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self) -> TickHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let handle = TickHandle(inner.next_id);
        inner.pending.push(handle);
        inner.scheduled += 1;
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        let mut inner = self.inner.borrow_mut();
        inner.pending.retain(|h| *h != handle);
        inner.cancelled += 1;
    }
}

/// What one tick did, for hosts that mirror engine activity into UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A frame was painted into the attached surface.
    pub painted: bool,
    /// The active scene index changed to this value.
    pub scene_changed: Option<usize>,
    /// The timeline is exhausted (possibly still finalizing capture).
    pub finished: bool,
}

/// Drives the scene timeline against a host clock, painting into an attached
/// surface each tick and optionally streaming frames into a capture session.
pub struct Engine {
    catalog: Catalog,
    canvas: Canvas,
    scheduler: Box<dyn TickScheduler>,
    capture_factory: Box<dyn CaptureFactory>,
    capture_cfg: CaptureConfig,
    surface: Option<Surface>,
    state: PlaybackState,
    status: Option<String>,
    start_ms: Option<f64>,
    last_elapsed_ms: f64,
    active_scene: Option<usize>,
    pending_tick: Option<TickHandle>,
    session: Option<CaptureSession>,
    /// State to settle into once capture finalization completes.
    settle_to: Option<PlaybackState>,
    artifact: Option<Artifact>,
    seed: u64,
}

impl Engine {
    pub fn new(
        catalog: Catalog,
        canvas: Canvas,
        scheduler: Box<dyn TickScheduler>,
        capture_factory: Box<dyn CaptureFactory>,
    ) -> Self {
        // Stable per-catalog seed so cosmetic detail survives restarts.
        let mut key_bytes = Vec::new();
        for scene in catalog.scenes() {
            key_bytes.extend_from_slice(scene.key.as_bytes());
            key_bytes.push(0);
        }
        Self {
            capture_cfg: CaptureConfig::for_canvas(canvas),
            seed: fnv1a64(&key_bytes),
            catalog,
            canvas,
            scheduler,
            capture_factory,
            surface: None,
            state: PlaybackState::Idle,
            status: None,
            start_ms: None,
            last_elapsed_ms: 0.0,
            active_scene: None,
            pending_tick: None,
            session: None,
            settle_to: None,
            artifact: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_capture_config(mut self, cfg: CaptureConfig) -> Self {
        self.capture_cfg = cfg;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Human-readable detail for the `Error` state.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn active_scene(&self) -> Option<usize> {
        self.active_scene
    }

    /// Total timeline length in milliseconds.
    pub fn total_duration_ms(&self) -> f64 {
        self.catalog.total_duration_ms()
    }

    /// The finished recording from the most recent capture run, if any.
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Remove and return the finished recording, releasing the engine's
    /// reference to it.
    pub fn take_artifact(&mut self) -> Option<Artifact> {
        self.artifact.take()
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut Surface> {
        self.surface.as_mut()
    }

    /// Attach the raster target frames are painted into. Dimensions must match
    /// the engine's canvas. Ticks without an attached surface are no-ops.
    pub fn attach_surface(&mut self, surface: Surface) -> OrreryResult<()> {
        if surface.canvas() != self.canvas {
            return Err(OrreryError::validation(format!(
                "surface is {}x{}, engine canvas is {}x{}",
                surface.canvas().width,
                surface.canvas().height,
                self.canvas.width,
                self.canvas.height
            )));
        }
        self.surface = Some(surface);
        Ok(())
    }

    pub fn detach_surface(&mut self) -> Option<Surface> {
        self.surface.take()
    }

    /// Begin playback from the start of the timeline. With `record`, a capture
    /// session is opened first and every painted frame streams into it.
    ///
    /// Valid from `Idle`, `Completed`, and `Error`. A capture capability or
    /// acquire failure moves the engine to `Error` (with `status` set) and the
    /// error is also returned.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self, record: bool) -> OrreryResult<()> {
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Rendering) {
            return Err(OrreryError::validation(
                "playback is already in progress",
            ));
        }

        self.cancel_pending_tick();
        if let Some(session) = self.session.take() {
            session.abort();
        }
        self.artifact = None;
        self.status = None;
        self.settle_to = None;
        self.reset_clock();
        self.active_scene = None;

        if record {
            if !self.capture_factory.is_supported() {
                let msg = "capture is not supported in this environment";
                self.state = PlaybackState::Error;
                self.status = Some(msg.to_string());
                return Err(OrreryError::capture(msg));
            }
            match CaptureSession::acquire(self.capture_factory.as_mut(), &self.capture_cfg) {
                Ok(session) => {
                    self.session = Some(session);
                    self.state = PlaybackState::Rendering;
                }
                Err(e) => {
                    self.state = PlaybackState::Error;
                    self.status = Some(format!("failed to start capture: {e}"));
                    return Err(e);
                }
            }
        } else {
            self.state = PlaybackState::Playing;
        }

        tracing::info!(state = ?self.state, "playback started");
        self.pending_tick = Some(self.scheduler.schedule());
        Ok(())
    }

    /// Advance playback to host time `now_ms` (any monotonic millisecond
    /// clock). The first tick after `start` anchors the clock; time moving
    /// backwards is clamped so elapsed time never decreases.
    pub fn tick(&mut self, now_ms: f64) -> OrreryResult<TickReport> {
        self.pending_tick = None;
        if !matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Rendering
        ) {
            return Ok(TickReport::default());
        }

        // Finalization phase: the timeline is done, the encoder is flushing.
        if self.session.as_ref().is_some_and(CaptureSession::is_stopping) {
            let done = self.poll_capture()?;
            if !done {
                self.pending_tick = Some(self.scheduler.schedule());
            }
            return Ok(TickReport {
                painted: false,
                scene_changed: None,
                finished: true,
            });
        }

        if self.surface.is_none() {
            self.pending_tick = Some(self.scheduler.schedule());
            return Ok(TickReport::default());
        }

        let start = *self.start_ms.get_or_insert(now_ms);
        let elapsed = (now_ms - start).max(self.last_elapsed_ms).max(0.0);
        self.last_elapsed_ms = elapsed;

        let point = resolve(elapsed, &self.catalog);
        let paint_result = match self.surface.as_mut() {
            Some(surface) => {
                let scene = self.catalog.scene(point.scene_index);
                surface.begin_frame();
                let r = paint_frame(
                    surface,
                    scene,
                    point.scene_progress,
                    point.global_progress,
                    self.seed,
                );
                surface.end_frame();
                r
            }
            None => Ok(()),
        };
        if let Err(e) = paint_result {
            self.fail("frame paint failed", &e);
            return Err(e);
        }

        let scene_changed = if self.active_scene != Some(point.scene_index) {
            self.active_scene = Some(point.scene_index);
            tracing::debug!(scene = point.scene_index, "scene changed");
            Some(point.scene_index)
        } else {
            None
        };

        if self.session.is_some() {
            let frame = self.surface.as_ref().map(Surface::to_frame);
            let push = match (self.session.as_mut(), frame) {
                (Some(session), Some(frame)) => session.push_frame(&frame),
                _ => Ok(()),
            };
            if let Err(e) = push {
                self.fail("capture frame push failed", &e);
                return Err(e);
            }
        }

        if point.finished {
            // End of timeline: the clock re-anchors on the next start. The
            // active scene stays pinned so observers keep the final indicator.
            self.reset_clock();
            if self.session.is_some() {
                let finish = match self.session.as_mut() {
                    Some(session) => session.request_finish(),
                    None => Ok(()),
                };
                if let Err(e) = finish {
                    self.fail("capture finish request failed", &e);
                    return Err(e);
                }
                self.settle_to = Some(PlaybackState::Completed);
                self.pending_tick = Some(self.scheduler.schedule());
            } else {
                self.state = PlaybackState::Completed;
                tracing::debug!("playback completed");
            }
            return Ok(TickReport {
                painted: true,
                scene_changed,
                finished: true,
            });
        }

        self.pending_tick = Some(self.scheduler.schedule());
        Ok(TickReport {
            painted: true,
            scene_changed,
            finished: false,
        })
    }

    /// Drive capture finalization when no tick loop is running (after `stop`
    /// during a recording). A no-op otherwise.
    pub fn poll(&mut self) -> OrreryResult<()> {
        self.poll_capture().map(|_| ())
    }

    /// Halt playback. From a recording run this requests encoder finalization
    /// and keeps the state at `Rendering` until [`poll`](Engine::poll) (or the
    /// tick loop) observes completion; the finished artifact is still kept.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self) -> OrreryResult<()> {
        if self.state == PlaybackState::Idle {
            return Ok(());
        }
        self.cancel_pending_tick();
        self.reset_clock();
        self.active_scene = None;

        if self.state == PlaybackState::Rendering && self.session.is_some() {
            let finish = match self.session.as_mut() {
                Some(session) if !session.is_stopping() => session.request_finish(),
                _ => Ok(()),
            };
            if let Err(e) = finish {
                self.fail("capture finish request failed", &e);
                return Err(e);
            }
            self.settle_to = Some(PlaybackState::Idle);
            self.poll_capture()?;
            return Ok(());
        }

        self.state = PlaybackState::Idle;
        self.status = None;
        tracing::debug!("playback stopped");
        Ok(())
    }

    /// Release everything: cancel ticks, abort any recording, drop the
    /// artifact, return to `Idle`. The attached surface stays attached.
    pub fn teardown(&mut self) {
        self.cancel_pending_tick();
        if let Some(session) = self.session.take() {
            session.abort();
        }
        self.artifact = None;
        self.status = None;
        self.settle_to = None;
        self.reset_clock();
        self.active_scene = None;
        self.state = PlaybackState::Idle;
    }

    fn poll_capture(&mut self) -> OrreryResult<bool> {
        let stopping = self
            .session
            .as_ref()
            .is_some_and(CaptureSession::is_stopping);
        if !stopping {
            return Ok(self.session.is_none());
        }
        let polled = match self.session.as_mut() {
            Some(session) => session.poll(),
            None => Ok(None),
        };
        match polled {
            Ok(Some(artifact)) => {
                self.session = None;
                self.artifact = Some(artifact);
                self.state = self.settle_to.take().unwrap_or(PlaybackState::Idle);
                tracing::info!(state = ?self.state, "capture finalized");
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                self.fail("capture finalization failed", &e);
                Err(e)
            }
        }
    }

    fn fail(&mut self, context: &str, e: &OrreryError) {
        tracing::warn!(error = %e, "{context}");
        self.cancel_pending_tick();
        if let Some(session) = self.session.take() {
            session.abort();
        }
        self.settle_to = None;
        self.state = PlaybackState::Error;
        self.status = Some(format!("{context}: {e}"));
    }

    fn cancel_pending_tick(&mut self) {
        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn reset_clock(&mut self) {
        self.start_ms = None;
        self.last_elapsed_ms = 0.0;
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::sink::MemoryFactory;
    use crate::catalog::model::{Archetype, Palette, Scene};
    use crate::foundation::core::Rgba8;

    fn scene(key: &str, secs: f64, illustration: Archetype) -> Scene {
        let c = Rgba8::rgb(20, 30, 60);
        Scene {
            key: key.to_string(),
            title: format!("Title {key}"),
            subtitle: "sub".to_string(),
            description: "desc".to_string(),
            duration_secs: secs,
            palette: Palette {
                start: c,
                end: Rgba8::rgb(60, 70, 110),
                glow: Rgba8::rgb(120, 180, 255),
                accent: Rgba8::rgb(255, 170, 80),
            },
            illustration,
            facts: vec![],
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            scene("a", 1.0, Archetype::Sunrise),
            scene("b", 1.0, Archetype::Stars),
        ])
        .unwrap()
    }

    fn engine(factory: MemoryFactory) -> (Engine, ManualScheduler) {
        let scheduler = ManualScheduler::default();
        let canvas = Canvas::new(64, 36).unwrap();
        let mut engine = Engine::new(
            catalog(),
            canvas,
            Box::new(scheduler.clone()),
            Box::new(factory),
        )
        .with_seed(7);
        engine.attach_surface(Surface::new(canvas).unwrap()).unwrap();
        (engine, scheduler)
    }

    #[test]
    fn starts_idle_and_rejects_double_start() {
        let (mut e, _s) = engine(MemoryFactory::default());
        assert_eq!(e.state(), PlaybackState::Idle);
        e.start(false).unwrap();
        assert_eq!(e.state(), PlaybackState::Playing);
        assert!(e.start(false).is_err());
    }

    #[test]
    fn tick_anchors_clock_and_reports_scene_changes() {
        let (mut e, s) = engine(MemoryFactory::default());
        e.start(false).unwrap();
        assert!(s.has_pending());

        let r = e.tick(1_000_000.0).unwrap();
        assert!(r.painted);
        assert_eq!(r.scene_changed, Some(0));
        assert!(!r.finished);

        let r = e.tick(1_000_500.0).unwrap();
        assert_eq!(r.scene_changed, None);

        let r = e.tick(1_001_200.0).unwrap();
        assert_eq!(r.scene_changed, Some(1));
        assert_eq!(e.active_scene(), Some(1));
    }

    #[test]
    fn clock_never_runs_backwards() {
        let (mut e, _s) = engine(MemoryFactory::default());
        e.start(false).unwrap();
        e.tick(5000.0).unwrap();
        e.tick(6200.0).unwrap();
        assert_eq!(e.active_scene(), Some(1));
        // An earlier timestamp must not rewind to scene 0.
        e.tick(5100.0).unwrap();
        assert_eq!(e.active_scene(), Some(1));
    }

    #[test]
    fn playback_completes_without_artifact() {
        let (mut e, s) = engine(MemoryFactory::default());
        e.start(false).unwrap();
        e.tick(0.0).unwrap();
        let r = e.tick(2000.0).unwrap();
        assert!(r.finished);
        assert!(r.painted);
        assert_eq!(e.state(), PlaybackState::Completed);
        assert!(e.artifact().is_none());
        // No further tick was scheduled after completion.
        assert!(!s.has_pending());
    }

    #[test]
    fn recording_yields_artifact_on_completion() {
        let (mut e, _s) = engine(MemoryFactory::default());
        e.start(true).unwrap();
        assert_eq!(e.state(), PlaybackState::Rendering);
        assert!(e.is_recording());

        e.tick(0.0).unwrap();
        e.tick(500.0).unwrap();
        let r = e.tick(2000.0).unwrap();
        assert!(r.finished);
        // Finalization resolved synchronously on the next tick.
        let r = e.tick(2016.0).unwrap();
        assert!(r.finished);
        assert_eq!(e.state(), PlaybackState::Completed);

        let artifact = e.artifact().unwrap();
        let text = String::from_utf8(artifact.bytes.as_ref().clone()).unwrap();
        assert!(text.contains("end 3 frames"));
    }

    #[test]
    fn delayed_finalize_keeps_rendering_until_done() {
        let (mut e, s) = engine(MemoryFactory {
            finish_delay_polls: 2,
            ..MemoryFactory::default()
        });
        e.start(true).unwrap();
        e.tick(0.0).unwrap();
        e.tick(2000.0).unwrap();
        assert_eq!(e.state(), PlaybackState::Rendering);
        e.tick(2016.0).unwrap();
        assert_eq!(e.state(), PlaybackState::Rendering);
        e.tick(2032.0).unwrap();
        assert_eq!(e.state(), PlaybackState::Rendering);
        e.tick(2048.0).unwrap();
        assert_eq!(e.state(), PlaybackState::Completed);
        assert!(e.artifact().is_some());
        assert!(!s.has_pending());
    }

    #[test]
    fn completion_pins_active_scene_until_stop() {
        let (mut e, _s) = engine(MemoryFactory::default());
        e.start(false).unwrap();
        e.tick(0.0).unwrap();
        e.tick(2000.0).unwrap();
        assert_eq!(e.state(), PlaybackState::Completed);
        // The final scene indicator survives completion for observers.
        assert_eq!(e.active_scene(), Some(1));
        e.stop().unwrap();
        assert_eq!(e.state(), PlaybackState::Idle);
        assert_eq!(e.active_scene(), None);
    }

    #[test]
    fn completion_resets_the_clock() {
        let (mut e, _s) = engine(MemoryFactory::default());
        e.start(false).unwrap();
        e.tick(0.0).unwrap();
        e.tick(2000.0).unwrap();
        assert_eq!(e.state(), PlaybackState::Completed);
        // Restarting re-anchors on the first tick of the new run even at a
        // much later timestamp.
        e.start(false).unwrap();
        let r = e.tick(500_000.0).unwrap();
        assert_eq!(r.scene_changed, Some(0));
        assert!(!r.finished);
    }

    #[test]
    fn total_duration_and_take_artifact_accessors() {
        let (mut e, _s) = engine(MemoryFactory::default());
        assert_eq!(e.total_duration_ms(), 2000.0);

        e.start(true).unwrap();
        e.tick(0.0).unwrap();
        e.tick(2000.0).unwrap();
        e.tick(2016.0).unwrap();
        assert_eq!(e.state(), PlaybackState::Completed);
        assert!(e.artifact().is_some());

        let taken = e.take_artifact().unwrap();
        assert!(!taken.is_empty());
        assert!(e.artifact().is_none());
        assert!(e.take_artifact().is_none());
    }

    #[test]
    fn stop_from_playing_returns_to_idle() {
        let (mut e, s) = engine(MemoryFactory::default());
        e.start(false).unwrap();
        e.tick(100.0).unwrap();
        e.stop().unwrap();
        assert_eq!(e.state(), PlaybackState::Idle);
        assert!(!s.has_pending());
        // Restart re-anchors the clock.
        e.start(false).unwrap();
        let r = e.tick(900_000.0).unwrap();
        assert_eq!(r.scene_changed, Some(0));
    }

    #[test]
    fn stop_from_rendering_finalizes_and_keeps_artifact() {
        let (mut e, _s) = engine(MemoryFactory {
            finish_delay_polls: 1,
            ..MemoryFactory::default()
        });
        e.start(true).unwrap();
        e.tick(0.0).unwrap();
        e.tick(100.0).unwrap();
        e.stop().unwrap();
        // Still flushing.
        assert_eq!(e.state(), PlaybackState::Rendering);
        e.poll().unwrap();
        assert_eq!(e.state(), PlaybackState::Idle);
        let artifact = e.artifact().unwrap();
        let text = String::from_utf8(artifact.bytes.as_ref().clone()).unwrap();
        assert!(text.contains("end 2 frames"));
    }

    #[test]
    fn unsupported_capture_moves_to_error() {
        let (mut e, _s) = engine(MemoryFactory {
            supported: false,
            ..MemoryFactory::default()
        });
        assert!(e.start(true).is_err());
        assert_eq!(e.state(), PlaybackState::Error);
        assert!(e.status().is_some());
        assert!(!e.is_recording());
    }

    #[test]
    fn failed_acquire_moves_to_error_and_allows_restart() {
        let (mut e, _s) = engine(MemoryFactory {
            fail_acquire: true,
            ..MemoryFactory::default()
        });
        assert!(e.start(true).is_err());
        assert_eq!(e.state(), PlaybackState::Error);
        // Error state accepts a fresh non-recording start.
        e.start(false).unwrap();
        assert_eq!(e.state(), PlaybackState::Playing);
        assert!(e.status().is_none());
    }

    #[test]
    fn second_recording_replaces_prior_artifact() {
        let (mut e, _s) = engine(MemoryFactory::default());
        e.start(true).unwrap();
        e.tick(0.0).unwrap();
        e.tick(2000.0).unwrap();
        e.tick(2016.0).unwrap();
        assert!(e.artifact().is_some());

        e.start(true).unwrap();
        assert!(e.artifact().is_none());
        e.tick(10_000.0).unwrap();
        e.tick(12_000.0).unwrap();
        e.tick(12_016.0).unwrap();
        let text =
            String::from_utf8(e.artifact().unwrap().bytes.as_ref().clone()).unwrap();
        assert!(text.contains("end 2 frames"));
    }

    #[test]
    fn ticks_without_surface_are_noops_that_reschedule() {
        let scheduler = ManualScheduler::default();
        let canvas = Canvas::new(64, 36).unwrap();
        let mut e = Engine::new(
            catalog(),
            canvas,
            Box::new(scheduler.clone()),
            Box::new(MemoryFactory::default()),
        );
        e.start(false).unwrap();
        let r = e.tick(1000.0).unwrap();
        assert!(!r.painted);
        assert_eq!(e.state(), PlaybackState::Playing);
        assert!(scheduler.has_pending());
    }

    #[test]
    fn attach_surface_rejects_mismatched_dimensions() {
        let (mut e, _s) = engine(MemoryFactory::default());
        let wrong = Surface::new(Canvas::new(32, 32).unwrap()).unwrap();
        assert!(e.attach_surface(wrong).is_err());
    }

    #[test]
    fn tick_in_idle_is_a_noop() {
        let (mut e, _s) = engine(MemoryFactory::default());
        let r = e.tick(123.0).unwrap();
        assert_eq!(r, TickReport::default());
        assert_eq!(e.state(), PlaybackState::Idle);
    }

    #[test]
    fn teardown_aborts_recording() {
        let (mut e, s) = engine(MemoryFactory::default());
        e.start(true).unwrap();
        e.tick(0.0).unwrap();
        e.teardown();
        assert_eq!(e.state(), PlaybackState::Idle);
        assert!(e.artifact().is_none());
        assert!(!e.is_recording());
        assert!(!s.has_pending());
    }
}
