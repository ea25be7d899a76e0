use crate::catalog::model::Catalog;

/// Position on the timeline for a given elapsed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelinePoint {
    /// 0-based index of the active scene.
    pub scene_index: usize,
    /// Progress within the active scene: `[0, 1)` during playback, exactly `1` at the end.
    pub scene_progress: f64,
    /// Progress across the whole timeline, clamped to `[0, 1]`.
    pub global_progress: f64,
    /// The timeline is exhausted; the point is pinned to the final scene.
    pub finished: bool,
}

/// Map elapsed playback time to the active scene and progress within it.
///
/// Pure and deterministic; callable with synthetic elapsed values. Negative
/// input clamps to zero. Zero-length catalogs are rejected at [`Catalog`]
/// construction, so the walk below always terminates on a scene.
pub fn resolve(elapsed_ms: f64, catalog: &Catalog) -> TimelinePoint {
    let total = catalog.total_duration_ms();
    let elapsed = elapsed_ms.max(0.0);
    let last = catalog.len() - 1;

    if elapsed >= total {
        return TimelinePoint {
            scene_index: last,
            scene_progress: 1.0,
            global_progress: 1.0,
            finished: true,
        };
    }

    let global_progress = (elapsed / total).clamp(0.0, 1.0);
    for (i, scene) in catalog.scenes().iter().enumerate() {
        let start = catalog.start_ms(i);
        let dur = scene.duration_ms();
        if elapsed < start + dur {
            return TimelinePoint {
                scene_index: i,
                scene_progress: ((elapsed - start) / dur).clamp(0.0, 1.0),
                global_progress,
                finished: false,
            };
        }
    }

    // Unreachable unless float accumulation drifts at the very end; pin anyway.
    TimelinePoint {
        scene_index: last,
        scene_progress: 1.0,
        global_progress: 1.0,
        finished: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{Archetype, Palette, Scene};
    use crate::foundation::core::Rgba8;

    fn scene(key: &str, secs: f64) -> Scene {
        let c = Rgba8::rgb(0, 0, 0);
        Scene {
            key: key.to_string(),
            title: String::new(),
            subtitle: String::new(),
            description: String::new(),
            duration_secs: secs,
            palette: Palette {
                start: c,
                end: c,
                glow: c,
                accent: c,
            },
            illustration: Archetype::Stars,
            facts: vec![],
        }
    }

    fn catalog_4_6_2() -> Catalog {
        Catalog::new(vec![scene("a", 4.0), scene("b", 6.0), scene("c", 2.0)]).unwrap()
    }

    #[test]
    fn reference_example_at_5000ms() {
        let p = resolve(5000.0, &catalog_4_6_2());
        assert_eq!(p.scene_index, 1);
        assert!((p.scene_progress - 1000.0 / 6000.0).abs() < 1e-12);
        assert!((p.global_progress - 5000.0 / 12000.0).abs() < 1e-12);
        assert!(!p.finished);
    }

    #[test]
    fn reference_example_at_total() {
        for elapsed in [12000.0, 12001.0, 99999.0] {
            let p = resolve(elapsed, &catalog_4_6_2());
            assert_eq!(p.scene_index, 2);
            assert_eq!(p.scene_progress, 1.0);
            assert_eq!(p.global_progress, 1.0);
            assert!(p.finished);
        }
    }

    #[test]
    fn every_elapsed_maps_to_exactly_one_window() {
        let catalog = catalog_4_6_2();
        for e in 0..12000u32 {
            let p = resolve(f64::from(e), &catalog);
            assert!(!p.finished);
            assert!(p.scene_progress >= 0.0);
            assert!(p.scene_progress < 1.0, "e={e} p={}", p.scene_progress);
            let start = catalog.start_ms(p.scene_index);
            let dur = catalog.scene(p.scene_index).duration_ms();
            assert!(f64::from(e) >= start);
            assert!(f64::from(e) < start + dur);
        }
    }

    #[test]
    fn global_progress_is_monotonic_with_endpoints() {
        let catalog = catalog_4_6_2();
        assert_eq!(resolve(0.0, &catalog).global_progress, 0.0);
        let mut prev = -1.0;
        for e in (0..=12000u32).step_by(25) {
            let g = resolve(f64::from(e), &catalog).global_progress;
            assert!(g >= prev);
            prev = g;
        }
        assert_eq!(prev, 1.0);
    }

    #[test]
    fn scene_boundaries_belong_to_the_next_scene() {
        let catalog = catalog_4_6_2();
        let p = resolve(4000.0, &catalog);
        assert_eq!(p.scene_index, 1);
        assert_eq!(p.scene_progress, 0.0);
        let p = resolve(10000.0, &catalog);
        assert_eq!(p.scene_index, 2);
        assert_eq!(p.scene_progress, 0.0);
    }

    #[test]
    fn negative_elapsed_clamps_to_start() {
        let p = resolve(-250.0, &catalog_4_6_2());
        assert_eq!(p.scene_index, 0);
        assert_eq!(p.scene_progress, 0.0);
        assert_eq!(p.global_progress, 0.0);
    }
}
