use crate::foundation::core::Rgba8;
use crate::foundation::error::{OrreryError, OrreryResult};

/// Four colors that drive every layer of a scene's frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Palette {
    /// Top stop of the background gradient.
    pub start: Rgba8,
    /// Bottom stop of the background gradient.
    pub end: Rgba8,
    /// Ambient glow tint.
    pub glow: Rgba8,
    /// Illustration and detail tint.
    pub accent: Rgba8,
}

/// Closed set of illustration styles a scene can select.
///
/// Unrecognized discriminants deserialize to [`Archetype::Unknown`], which the
/// illustration dispatch silently skips.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Sunrise,
    Cities,
    Forest,
    Desert,
    Oceans,
    Stars,
    #[serde(other)]
    Unknown,
}

/// One timed segment of the visual sequence.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub key: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    /// Scene length in seconds, > 0 and finite.
    pub duration_secs: f64,
    pub palette: Palette,
    pub illustration: Archetype,
    /// Short fact strings consumed by external display widgets.
    #[serde(default)]
    pub facts: Vec<String>,
}

impl Scene {
    pub fn duration_ms(&self) -> f64 {
        self.duration_secs * 1000.0
    }

    fn validate(&self, ordinal: usize) -> OrreryResult<()> {
        if self.key.trim().is_empty() {
            return Err(OrreryError::validation(format!(
                "scene {ordinal} must have a non-empty key"
            )));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(OrreryError::validation(format!(
                "scene '{}' duration must be finite and > 0",
                self.key
            )));
        }
        Ok(())
    }
}

/// Validated, immutable ordered sequence of scenes with precomputed timing.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<Scene>", into = "Vec<Scene>")]
pub struct Catalog {
    scenes: Vec<Scene>,
    /// Cumulative start of each scene in ms, same order as `scenes`.
    starts_ms: Vec<f64>,
    total_ms: f64,
}

impl Catalog {
    pub fn new(scenes: Vec<Scene>) -> OrreryResult<Self> {
        if scenes.is_empty() {
            return Err(OrreryError::validation(
                "catalog must contain at least one scene",
            ));
        }
        let mut starts_ms = Vec::with_capacity(scenes.len());
        let mut total_ms = 0.0;
        for (i, scene) in scenes.iter().enumerate() {
            scene.validate(i)?;
            starts_ms.push(total_ms);
            total_ms += scene.duration_ms();
        }
        Ok(Self {
            scenes,
            starts_ms,
            total_ms,
        })
    }

    pub fn from_json_str(json: &str) -> OrreryResult<Self> {
        let scenes: Vec<Scene> = serde_json::from_str(json)
            .map_err(|e| OrreryError::validation(format!("catalog json: {e}")))?;
        Self::new(scenes)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        // Construction rejects empty catalogs; kept for API symmetry.
        self.scenes.is_empty()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, index: usize) -> &Scene {
        &self.scenes[index]
    }

    pub fn start_ms(&self, index: usize) -> f64 {
        self.starts_ms[index]
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.total_ms
    }
}

impl TryFrom<Vec<Scene>> for Catalog {
    type Error = OrreryError;

    fn try_from(scenes: Vec<Scene>) -> OrreryResult<Self> {
        Self::new(scenes)
    }
}

impl From<Catalog> for Vec<Scene> {
    fn from(catalog: Catalog) -> Self {
        catalog.scenes
    }
}
