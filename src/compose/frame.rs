use std::f64::consts::{PI, TAU};

use kurbo::Shape as _;

use crate::catalog::model::Scene;
use crate::compose::illustrate::illustrate;
use crate::foundation::core::Rgba8;
use crate::foundation::error::OrreryResult;
use crate::surface::raster::{Surface, circle_path};

/// Paint one complete frame for `scene` into `surface`.
///
/// Layers back to front: background gradient, ambient glow, planet, orbit
/// rings, scene illustration, title card. Same inputs always paint the same
/// pixels; the only state consulted is `surface`'s registered font.
pub fn paint_frame(
    surface: &mut Surface,
    scene: &Scene,
    scene_progress: f64,
    global_progress: f64,
    seed: u64,
) -> OrreryResult<()> {
    let sp = scene_progress.clamp(0.0, 1.0);
    let gp = global_progress.clamp(0.0, 1.0);
    let (w, h) = (surface.width(), surface.height());
    let palette = scene.palette;

    surface.fill_vertical_gradient(palette.start, palette.end);

    // Ambient glow behind the planet, breathing with global progress.
    let glow_center = kurbo::Point::new(w * 0.5, h * 0.58);
    let glow_radius = w.min(h) * 0.42 * (1.0 + 0.07 * (gp * TAU).sin());
    surface.fill_radial(
        glow_center,
        glow_radius,
        &[
            (0.0, palette.glow.with_alpha(90)),
            (1.0, palette.glow.with_alpha(0)),
        ],
    );

    let planet_radius = w.min(h) * 0.18;
    let planet_center = kurbo::Point::new(
        w * 0.5 + (gp * TAU).sin() * w * 0.03,
        h * 0.52 + (sp * PI).cos() * h * 0.02,
    );
    paint_planet(surface, planet_center, planet_radius, &palette);
    paint_rings(surface, kurbo::Point::new(w * 0.5, h * 0.52), planet_radius, sp, palette.accent);

    illustrate(surface, scene.illustration, sp, palette.accent, seed)?;

    paint_title_card(surface, scene, sp)?;
    Ok(())
}

fn paint_planet(
    surface: &mut Surface,
    center: kurbo::Point,
    radius: f64,
    palette: &crate::catalog::model::Palette,
) {
    let disk = circle_path(center, radius);
    surface.push_clip(&disk);
    surface.fill_radial(
        center,
        radius,
        &[
            (0.0, palette.accent.lerp(Rgba8::WHITE, 0.75)),
            (0.45, palette.accent),
            (1.0, palette.start),
        ],
    );

    // Faint latitude/longitude grid.
    let grid = Rgba8::WHITE.with_alpha(30);
    for k in 1..4 {
        let f = 0.25 * f64::from(k);
        let lat = kurbo::Ellipse::new(center, (radius, radius * f), 0.0).to_path(0.1);
        surface.stroke_path(&lat, grid, 1.0);
        let lon = kurbo::Ellipse::new(center, (radius * f, radius), 0.0).to_path(0.1);
        surface.stroke_path(&lon, grid, 1.0);
    }
    surface.pop_layer();

    surface.stroke_path(&disk, palette.glow.with_alpha(160), 1.5);
}

/// Four concentric dashed rings around the planet's nominal center. Dashes are
/// built as explicit arc segments rather than a stroke dash pattern.
fn paint_rings(surface: &mut Surface, center: kurbo::Point, planet_radius: f64, sp: f64, accent: Rgba8) {
    const DASHES: usize = 32;
    const DASH_FILL: f64 = 0.55;

    for i in 0..4usize {
        let wobble = 1.0 + 0.05 * (sp * TAU + i as f64).sin();
        let radius = planet_radius * (1.4 + 0.24 * i as f64) * wobble;
        let phase = sp * TAU * if i % 2 == 0 { 0.25 } else { -0.25 };

        let mut path = kurbo::BezPath::new();
        let slice = TAU / DASHES as f64;
        for d in 0..DASHES {
            let start = phase + slice * d as f64;
            let arc = kurbo::Arc::new(center, (radius, radius), start, slice * DASH_FILL, 0.0);
            path.extend(arc.path_elements(0.1));
        }
        surface.stroke_path(&path, accent.with_alpha(70), 1.0);
    }
}

fn paint_title_card(surface: &mut Surface, scene: &Scene, sp: f64) -> OrreryResult<()> {
    // Fade in over the first half of the scene, out over the second.
    let alpha = (sp * PI).sin() as f32;
    if alpha <= 0.0 {
        return Ok(());
    }

    let (w, h) = (surface.width(), surface.height());
    let title_px = (h * 0.055) as f32;
    let subtitle_px = (h * 0.032) as f32;
    let body_px = (h * 0.026) as f32;
    let line_gap = h * 0.012;
    let pad = w * 0.025;
    let text_width = w * 0.56;

    // Without a font only the text passes are skipped; the backing panel is
    // still drawn, sized from an approximate per-character advance.
    let has_font = surface.has_font();
    let body_lines = if has_font {
        wrap_greedy(
            |s| {
                Ok(surface
                    .measure_text(s, body_px)?
                    .unwrap_or(0.0))
            },
            &scene.description,
            text_width,
        )?
    } else {
        let approx_advance = f64::from(body_px) * 0.55;
        wrap_greedy(
            |s| Ok(approx_advance * s.chars().count() as f64),
            &scene.description,
            text_width,
        )?
    };

    let title_h = f64::from(title_px) * 1.2;
    let subtitle_h = f64::from(subtitle_px) * 1.2;
    let body_h = f64::from(body_px) * 1.2;
    let panel_h = pad * 2.0
        + title_h
        + subtitle_h
        + line_gap
        + body_h * body_lines.len() as f64;
    let panel = kurbo::RoundedRect::new(
        w * 0.05,
        h * 0.92 - panel_h,
        w * 0.05 + text_width + pad * 2.0,
        h * 0.92,
        h * 0.015,
    );

    surface.push_opacity(alpha);
    surface.fill_path(&panel.to_path(0.1), Rgba8::new(8, 10, 20, 200));

    if has_font {
        let x = w * 0.05 + pad;
        let mut y = h * 0.92 - panel_h + pad;
        surface.draw_text(&scene.title, title_px, Rgba8::WHITE, kurbo::Point::new(x, y))?;
        y += title_h;
        surface.draw_text(
            &scene.subtitle,
            subtitle_px,
            scene.palette.accent,
            kurbo::Point::new(x, y),
        )?;
        y += subtitle_h + line_gap;
        for line in &body_lines {
            surface.draw_text(
                line,
                body_px,
                Rgba8::new(220, 224, 235, 255),
                kurbo::Point::new(x, y),
            )?;
            y += body_h;
        }
    }
    surface.pop_layer();
    Ok(())
}

/// Greedy word wrap: pack words onto a line while the measured width fits,
/// breaking before the word that would overflow. A single word wider than
/// `max_width` gets its own line rather than being split.
pub(crate) fn wrap_greedy<F>(mut measure: F, text: &str, max_width: f64) -> OrreryResult<Vec<String>>
where
    F: FnMut(&str) -> OrreryResult<f64>,
{
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || measure(&candidate)? <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}
