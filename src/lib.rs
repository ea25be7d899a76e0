//! Orrery is a real-time procedural scene playback and capture engine.
//!
//! A validated [`Catalog`] of timed scenes is driven against a host clock by
//! the [`Engine`]: each tick resolves elapsed time to a scene and progress,
//! paints a layered frame into an attached [`Surface`], and optionally streams
//! every frame into a capture backend that encodes an MP4 [`Artifact`].
//!
//! - Build a [`Catalog`] (directly or from JSON)
//! - Create an [`Engine`] with a [`TickScheduler`] and a [`CaptureFactory`]
//! - Attach a [`Surface`] and call [`Engine::start`]
#![forbid(unsafe_code)]

mod foundation {
    pub mod core;
    pub mod error;
    pub(crate) mod math;
}

mod catalog {
    pub mod model;
}

mod timeline {
    pub mod resolve;
}

mod surface {
    pub mod raster;
}

mod compose {
    pub mod frame;
    pub mod illustrate;
}

mod capture {
    pub mod ffmpeg;
    pub(crate) mod session;
    pub mod sink;
}

mod engine {
    pub mod driver;
}

pub use crate::foundation::core::{Canvas, FrameRGBA, Rgba8};
pub use crate::foundation::error::{OrreryError, OrreryResult};

pub use crate::catalog::model::{Archetype, Catalog, Palette, Scene};
pub use crate::timeline::resolve::{TimelinePoint, resolve};

pub use crate::compose::frame::paint_frame;
pub use crate::compose::illustrate::illustrate;
pub use crate::surface::raster::Surface;

pub use crate::capture::ffmpeg::{FfmpegBackend, FfmpegFactory, is_ffmpeg_on_path};
pub use crate::capture::sink::{
    Artifact, CaptureBackend, CaptureConfig, CaptureFactory, MemoryBackend, MemoryFactory,
};

pub use crate::engine::driver::{
    Engine, ManualScheduler, PlaybackState, TickHandle, TickReport, TickScheduler,
};
