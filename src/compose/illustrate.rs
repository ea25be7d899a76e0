use std::f64::consts::TAU;

use kurbo::Shape as _;

use crate::catalog::model::Archetype;
use crate::foundation::core::Rgba8;
use crate::foundation::error::OrreryResult;
use crate::foundation::math::{Rng64, noise01};
use crate::surface::raster::{Surface, circle_path};

/// Probability that a given building window is lit. Tuned by eye.
const LIT_WINDOW_CHANCE: f64 = 0.3;

/// Paint the scene's illustration layer. `p` is scene progress in `[0, 1]`.
///
/// Static geometry (building footprints, star positions, dune shapes) is
/// derived from fixed per-archetype constants so a scene's layout never
/// changes between frames or sessions; `seed` only varies cosmetic detail
/// such as which windows are lit.
pub fn illustrate(
    surface: &mut Surface,
    archetype: Archetype,
    p: f64,
    accent: Rgba8,
    seed: u64,
) -> OrreryResult<()> {
    let p = p.clamp(0.0, 1.0);
    match archetype {
        Archetype::Sunrise => sunrise(surface, p, accent),
        Archetype::Cities => cities(surface, p, accent, seed),
        Archetype::Forest => forest(surface, p, accent),
        Archetype::Desert => desert(surface, p, accent),
        Archetype::Oceans => oceans(surface, p, accent),
        Archetype::Stars => stars(surface, p, accent),
        Archetype::Unknown => {}
    }
    Ok(())
}

fn sunrise(surface: &mut Surface, p: f64, accent: Rgba8) {
    let (w, h) = (surface.width(), surface.height());
    let horizon_y = h * 0.78;

    // The sun climbs fast early, then eases; hold just below the top.
    let rise = p.powf(0.8);
    let sun_r = w.min(h) * 0.07;
    let sun = kurbo::Point::new(w * 0.5, horizon_y + sun_r - rise * h * 0.28);

    surface.fill_radial(
        sun,
        sun_r * 3.0,
        &[(0.0, accent.with_alpha(120)), (1.0, accent.with_alpha(0))],
    );
    surface.fill_path(
        &circle_path(sun, sun_r),
        accent.lerp(Rgba8::WHITE, 0.5),
    );

    // Rolling horizon through jittered anchors, filled to the bottom edge.
    let mut ground = kurbo::BezPath::new();
    ground.move_to((0.0, horizon_y));
    for i in 1..=8u32 {
        let x = w * f64::from(i) / 8.0;
        let y = horizon_y + (f64::from(i) * 1.7).sin() * h * 0.015;
        ground.line_to((x, y));
    }
    ground.line_to((w, h));
    ground.line_to((0.0, h));
    ground.close_path();
    surface.fill_path(&ground, accent.with_alpha(60));
}

fn cities(surface: &mut Surface, p: f64, accent: Rgba8, seed: u64) {
    let (w, h) = (surface.width(), surface.height());
    let baseline = h * 0.88;

    for layer in 0..4u64 {
        let depth = layer as f64 / 3.0;
        let count = 6 + layer as usize * 2;
        let slot = w / count as f64;
        let body = accent.with_alpha((40.0 + depth * 70.0) as u8);
        // Footprints come from a fixed seed so the skyline is identical in
        // every frame and every session.
        let layout_seed = 0xC1_71 + layer;
        let mut lit = Rng64::new(seed ^ (layer.wrapping_mul(0x9E37)));

        for i in 0..count {
            let height = h * (0.10 + 0.22 * depth) * (0.6 + noise01(layout_seed, i as u64));
            let bob = (p * TAU + i as f64 * 0.9 + layer as f64).sin() * h * 0.004;
            let x0 = slot * i as f64 + slot * 0.12;
            let x1 = slot * (i as f64 + 1.0) - slot * 0.12;
            let top = baseline - height + bob;
            let rect = kurbo::Rect::new(x0, top, x1, baseline);
            surface.fill_path(&rect.to_path(0.1), body);

            // Windows only on the nearest layer.
            if layer == 3 {
                let rows = (height / (h * 0.035)).floor() as usize;
                for row in 0..rows.min(8) {
                    for col in 0..2 {
                        if lit.next_f64_01() >= LIT_WINDOW_CHANCE {
                            continue;
                        }
                        let wx = x0 + (x1 - x0) * (0.25 + 0.5 * col as f64);
                        let wy = baseline - h * 0.02 - h * 0.035 * row as f64 + bob;
                        let win = kurbo::Rect::new(
                            wx - w * 0.004,
                            wy - h * 0.008,
                            wx + w * 0.004,
                            wy,
                        );
                        surface.fill_path(&win.to_path(0.1), Rgba8::new(255, 240, 190, 220));
                    }
                }
            }
        }
    }
}

fn forest(surface: &mut Surface, p: f64, accent: Rgba8) {
    let (w, h) = (surface.width(), surface.height());
    let baseline = h * 0.86;

    for i in 0..22u64 {
        let t = noise01(0xF0_7E, i);
        let x = w * (0.02 + 0.96 * (i as f64 + 0.5) / 22.0);
        let size = w.min(h) * (0.03 + 0.05 * t);
        let bob = (p * TAU + i as f64 * 0.5).sin() * h * 0.006;
        let cy = baseline - size * (0.8 + 1.4 * noise01(0xF0_7F, i)) + bob;

        // Canopy blob: a squashed four-lobe bezier ring.
        let mut blob = kurbo::BezPath::new();
        blob.move_to((x - size, cy));
        blob.curve_to(
            (x - size, cy - size * 1.1),
            (x + size, cy - size * 1.1),
            (x + size, cy),
        );
        blob.curve_to(
            (x + size, cy + size * 0.7),
            (x - size, cy + size * 0.7),
            (x - size, cy),
        );
        blob.close_path();
        let shade = accent.with_alpha((70.0 + 80.0 * t) as u8);
        surface.fill_path(&blob, shade);

        // Trunk.
        let trunk = kurbo::Rect::new(x - size * 0.08, cy, x + size * 0.08, baseline);
        surface.fill_path(&trunk.to_path(0.1), shade.with_alpha(120));
    }
}

fn desert(surface: &mut Surface, p: f64, accent: Rgba8) {
    let (w, h) = (surface.width(), surface.height());

    for band in 0..5u32 {
        let k = f64::from(band);
        let base_y = h * (0.64 + 0.07 * k);
        let amp = h * (0.008 + 0.006 * k);
        let freq = 1.5 + 0.7 * k;
        let drift = p * TAU * 0.5 + k;

        let mut dune = kurbo::BezPath::new();
        dune.move_to((0.0, base_y));
        let steps = 24;
        for s in 1..=steps {
            let x = w * f64::from(s) / f64::from(steps);
            let y = base_y + ((x / w) * freq * TAU + drift).sin() * amp;
            dune.line_to((x, y));
        }
        dune.line_to((w, h));
        dune.line_to((0.0, h));
        dune.close_path();
        surface.fill_path(&dune, accent.with_alpha((30 + band * 18) as u8));
    }
}

fn oceans(surface: &mut Surface, p: f64, accent: Rgba8) {
    let (w, h) = (surface.width(), surface.height());

    for wave in 0..6u32 {
        let k = f64::from(wave);
        let base_y = h * (0.60 + 0.055 * k);
        let amp = h * (0.006 + 0.004 * k);
        let phase = p * TAU + k * 0.8;

        let mut path = kurbo::BezPath::new();
        path.move_to((0.0, base_y + phase.sin() * amp));
        let steps = 32;
        for s in 1..=steps {
            let x = w * f64::from(s) / f64::from(steps);
            let y = base_y + ((x / w) * 3.0 * TAU + phase).sin() * amp;
            path.line_to((x, y));
        }
        surface.stroke_path(&path, accent.with_alpha((50 + wave * 25) as u8), 1.2);
    }
}

fn stars(surface: &mut Surface, p: f64, accent: Rgba8) {
    let (w, h) = (surface.width(), surface.height());

    for i in 0..90u64 {
        let x = w * noise01(0x57A0, i);
        let y = h * 0.72 * noise01(0x57A1, i);
        let phase = noise01(0x57A2, i) * TAU;
        let twinkle = 0.5 + 0.5 * (p * TAU * 2.0 + phase).sin();
        let alpha = (40.0 + 180.0 * twinkle) as u8;
        let r = w.min(h) * (0.002 + 0.003 * noise01(0x57A3, i));
        surface.fill_path(
            &circle_path(kurbo::Point::new(x, y), r),
            Rgba8::WHITE.with_alpha(alpha),
        );
    }

    // One bright accent star with a halo.
    let focus = kurbo::Point::new(w * 0.72, h * 0.22);
    let pulse = 0.5 + 0.5 * (p * TAU).sin();
    surface.fill_radial(
        focus,
        w.min(h) * 0.05,
        &[
            (0.0, accent.with_alpha((120.0 + 100.0 * pulse) as u8)),
            (1.0, accent.with_alpha(0)),
        ],
    );
    surface.fill_path(
        &circle_path(focus, w.min(h) * 0.008),
        Rgba8::WHITE,
    );
}
