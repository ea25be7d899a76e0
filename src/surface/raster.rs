use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Shape as _;

use crate::foundation::core::{Canvas, FrameRGBA, Rgba8};
use crate::foundation::error::{OrreryError, OrreryResult};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct TextBrush {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// Stateful helper for building Parley text layouts from raw font bytes.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family_name: Option<String>,
}

impl TextLayoutEngine {
    fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            family_name: None,
        }
    }

    fn register(&mut self, font_bytes: &[u8]) -> OrreryResult<()> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            OrreryError::validation("no font families registered from font bytes")
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| OrreryError::validation("registered font family has no name"))?
            .to_string();
        self.family_name = Some(name);
        Ok(())
    }

    fn layout_plain(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrush,
    ) -> OrreryResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(OrreryError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self
            .family_name
            .clone()
            .ok_or_else(|| OrreryError::validation("no font registered"))?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct LinearGradientKey {
    start: [u8; 4],
    end: [u8; 4],
    w: u16,
    h: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RadialGradientKey {
    /// Stops quantized to (t * 1000, straight rgba).
    stops: Vec<(u16, [u8; 4])>,
}

/// Side of the square texture radial gradients are rasterized into before being
/// scaled to their on-screen radius.
const RADIAL_TEXTURE_SIZE: u16 = 256;

/// Fixed-resolution 2D raster target the compositor paints into.
///
/// Wraps a `vello_cpu` render context plus its readback pixmap, and carries the
/// gradient-texture cache and the optional text stack. Allocation is owned by
/// the host; the engine only borrows it per tick.
pub struct Surface {
    canvas: Canvas,
    width_px: u16,
    height_px: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    linear_cache: HashMap<LinearGradientKey, vello_cpu::Image>,
    radial_cache: HashMap<RadialGradientKey, vello_cpu::Image>,
    text: TextLayoutEngine,
    font: Option<vello_cpu::peniko::FontData>,
}

impl Surface {
    pub fn new(canvas: Canvas) -> OrreryResult<Self> {
        let width_px: u16 = canvas
            .width
            .try_into()
            .map_err(|_| OrreryError::surface("surface width exceeds u16"))?;
        let height_px: u16 = canvas
            .height
            .try_into()
            .map_err(|_| OrreryError::surface("surface height exceeds u16"))?;
        Ok(Self {
            canvas,
            width_px,
            height_px,
            ctx: vello_cpu::RenderContext::new(width_px, height_px),
            pixmap: vello_cpu::Pixmap::new(width_px, height_px),
            linear_cache: HashMap::new(),
            radial_cache: HashMap::new(),
            text: TextLayoutEngine::new(),
            font: None,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn width(&self) -> f64 {
        f64::from(self.canvas.width)
    }

    pub fn height(&self) -> f64 {
        f64::from(self.canvas.height)
    }

    /// Register the font used for all text passes. Without a font, text drawing
    /// and measurement are unavailable and callers skip their text passes.
    pub fn set_font(&mut self, font_bytes: Vec<u8>) -> OrreryResult<()> {
        self.text.register(&font_bytes)?;
        self.font = Some(vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes),
            0,
        ));
        Ok(())
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Start a fresh frame. Drops every recorded op from the previous frame.
    pub fn begin_frame(&mut self) {
        self.ctx.reset();
    }

    /// Rasterize the recorded frame into the readback pixmap.
    pub fn end_frame(&mut self) {
        self.ctx.flush();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.pixmap);
    }

    /// Copy out the last rasterized frame as premultiplied RGBA8.
    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    pub fn fill_path(&mut self, path: &kurbo::BezPath, color: Rgba8) {
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    pub fn stroke_path(&mut self, path: &kurbo::BezPath, color: Rgba8, width: f64) {
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx
            .set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.stroke_path(&bezpath_to_cpu(path));
    }

    /// Fill the whole frame with a top-to-bottom gradient from `start` to `end`.
    pub fn fill_vertical_gradient(&mut self, start: Rgba8, end: Rgba8) {
        let (w, h) = (self.width_px, self.height_px);
        let img = self.linear_gradient_image(start, end, w, h);
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(img);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
    }

    /// Fill a disk at `center` with a radial gradient. `stops` run from the
    /// center (`t = 0`) to the rim (`t = 1`); pixels outside the last stop are
    /// transparent, so the filled region is exactly the disk.
    pub fn fill_radial(&mut self, center: kurbo::Point, radius: f64, stops: &[(f64, Rgba8)]) {
        if radius <= 0.0 || stops.is_empty() {
            return;
        }
        let img = self.radial_gradient_image(stops);
        let size = f64::from(RADIAL_TEXTURE_SIZE);
        let scale = (radius * 2.0) / size;
        let transform = kurbo::Affine::translate((center.x - radius, center.y - radius))
            * kurbo::Affine::scale(scale);
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(img);
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, size, size));
    }

    pub fn push_opacity(&mut self, opacity: f32) {
        self.ctx.push_opacity_layer(opacity.clamp(0.0, 1.0));
    }

    pub fn push_clip(&mut self, path: &kurbo::BezPath) {
        // Clips resolve against the current transform; pin it first.
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.push_clip_layer(&bezpath_to_cpu(path));
    }

    pub fn pop_layer(&mut self) {
        self.ctx.pop_layer();
    }

    /// Measured advance width of `text` at `size_px`, or `None` without a font.
    pub fn measure_text(&mut self, text: &str, size_px: f32) -> OrreryResult<Option<f64>> {
        if self.font.is_none() {
            return Ok(None);
        }
        let layout = self.text.layout_plain(text, size_px, TextBrush::default())?;
        Ok(Some(f64::from(layout.width())))
    }

    /// Draw a single line of text with its top-left corner at `origin`.
    /// A no-op when no font is registered.
    pub fn draw_text(
        &mut self,
        text: &str,
        size_px: f32,
        color: Rgba8,
        origin: kurbo::Point,
    ) -> OrreryResult<()> {
        let Some(font) = self.font.clone() else {
            return Ok(());
        };
        let brush = TextBrush {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        };
        let layout = self.text.layout_plain(text, size_px, brush)?;

        self.ctx
            .set_transform(affine_to_cpu(kurbo::Affine::translate((
                origin.x, origin.y,
            ))));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }

    fn linear_gradient_image(
        &mut self,
        start: Rgba8,
        end: Rgba8,
        w: u16,
        h: u16,
    ) -> vello_cpu::Image {
        let key = LinearGradientKey {
            start: [start.r, start.g, start.b, start.a],
            end: [end.r, end.g, end.b, end.a],
            w,
            h,
        };
        if let Some(img) = self.linear_cache.get(&key).cloned() {
            return img;
        }
        let (wu, hu) = (usize::from(w), usize::from(h));
        let mut bytes = vec![0u8; wu * hu * 4];
        let h1 = f64::from(h.max(1) - 1);
        for y in 0..hu {
            let t = if h1 <= 0.0 { 0.0 } else { (y as f64) / h1 };
            let c = start.lerp(end, t).to_premul_bytes();
            for x in 0..wu {
                let idx = (y * wu + x) * 4;
                bytes[idx..idx + 4].copy_from_slice(&c);
            }
        }
        let img = premul_bytes_to_image(&bytes, w, h);
        self.linear_cache.insert(key, img.clone());
        img
    }

    fn radial_gradient_image(&mut self, stops: &[(f64, Rgba8)]) -> vello_cpu::Image {
        let key = RadialGradientKey {
            stops: stops
                .iter()
                .map(|&(t, c)| {
                    (
                        (t.clamp(0.0, 1.0) * 1000.0).round() as u16,
                        [c.r, c.g, c.b, c.a],
                    )
                })
                .collect(),
        };
        if let Some(img) = self.radial_cache.get(&key).cloned() {
            return img;
        }
        let size = usize::from(RADIAL_TEXTURE_SIZE);
        let half = (size as f64) / 2.0;
        let mut bytes = vec![0u8; size * size * 4];
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f64) + 0.5 - half;
                let dy = (y as f64) + 0.5 - half;
                let t = (dx * dx + dy * dy).sqrt() / half;
                if t > 1.0 {
                    continue;
                }
                let c = sample_stops(stops, t).to_premul_bytes();
                let idx = (y * size + x) * 4;
                bytes[idx..idx + 4].copy_from_slice(&c);
            }
        }
        let img = premul_bytes_to_image(&bytes, RADIAL_TEXTURE_SIZE, RADIAL_TEXTURE_SIZE);
        self.radial_cache.insert(key, img.clone());
        img
    }
}

fn sample_stops(stops: &[(f64, Rgba8)], t: f64) -> Rgba8 {
    debug_assert!(!stops.is_empty());
    if t <= stops[0].0 {
        return stops[0].1;
    }
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let span = (t1 - t0).max(f64::EPSILON);
            return c0.lerp(c1, (t - t0) / span);
        }
    }
    stops[stops.len() - 1].1
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn premul_bytes_to_image(bytes: &[u8], width: u16, height: u16) -> vello_cpu::Image {
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        usize::from(width) * usize::from(height),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, width, height, true);
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

/// Convenience for circle fills/strokes at raster resolution.
pub(crate) fn circle_path(center: kurbo::Point, radius: f64) -> kurbo::BezPath {
    kurbo::Circle::new(center, radius).to_path(0.1)
}
