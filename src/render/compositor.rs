use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::assets::raster::{RasterId, RasterImage};
use crate::assets::text::{FontBook, TextLayoutEngine, TextStyle, first_baseline};
use crate::foundation::core::{Affine, BezPath, Vec2};
use crate::foundation::error::{CardError, CardResult};
use crate::render::surface::Surface;
use crate::scene::layers::{CirclePx, Layer, LayerStack, PhotoLayer, TemplateLayer, TextLayer};
use crate::scene::model::TextBaseline;

/// CPU compositor powered by `vello_cpu`, with `parley` for text shaping.
///
/// `compose` is a pure function of the layer stack: identical stacks produce identical pixels.
/// Image paints and fonts are cached across calls; the image cache keeps only rasters used by
/// the most recent composition.
pub struct Compositor {
    fonts: FontBook,
    text_engine: TextLayoutEngine,
    ctx: Option<vello_cpu::RenderContext>,
    image_cache: HashMap<RasterId, vello_cpu::Image>,
    font_cache: HashMap<String, vello_cpu::peniko::FontData>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(FontBook::default())
    }
}

impl Compositor {
    pub fn new(fonts: FontBook) -> Self {
        Self {
            fonts,
            text_engine: TextLayoutEngine::new(),
            ctx: None,
            image_cache: HashMap::new(),
            font_cache: HashMap::new(),
        }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Paint `stack` into `surface`, resizing and clearing it to the stack's canvas first.
    #[tracing::instrument(
        skip_all,
        fields(width = stack.canvas.width, height = stack.canvas.height, layers = stack.layers.len())
    )]
    pub fn compose(&mut self, surface: &mut Surface, stack: &LayerStack) -> CardResult<()> {
        surface.resize_clear(stack.canvas)?;
        let w = u16::try_from(stack.canvas.width)
            .map_err(|_| CardError::render("canvas width exceeds u16"))?;
        let h = u16::try_from(stack.canvas.height)
            .map_err(|_| CardError::render("canvas height exceeds u16"))?;

        self.with_ctx_mut(w, h, |this, ctx| {
            for layer in &stack.layers {
                match layer {
                    Layer::Photo(p) => this.draw_photo(ctx, p)?,
                    Layer::Template(t) => this.draw_template(ctx, t)?,
                    Layer::Text(t) => this.draw_text(ctx, t),
                }
            }
            ctx.flush();
            ctx.render_to_pixmap(surface.pixmap_mut());
            Ok(())
        })?;

        let live: HashSet<RasterId> = stack
            .layers
            .iter()
            .filter_map(|l| match l {
                Layer::Photo(p) => Some(p.image.id()),
                Layer::Template(t) => Some(t.image.id()),
                Layer::Text(_) => None,
            })
            .collect();
        self.image_cache.retain(|id, _| live.contains(id));

        tracing::debug!(digest = surface.digest(), "composed");
        Ok(())
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> CardResult<R>,
    ) -> CardResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn draw_photo(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: &PhotoLayer,
    ) -> CardResult<()> {
        let paint = self.image_paint_for(&layer.image)?;
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if let Some(clip) = layer.clip {
            // Clip geometry lives in canvas space.
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.push_clip_layer(&bezpath_to_cpu(&circle_path(clip)));
        }

        ctx.set_transform(affine_to_cpu(layer.transform()));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(layer.image.width),
            f64::from(layer.image.height),
        ));

        if layer.clip.is_some() {
            ctx.pop_layer();
        }
        Ok(())
    }

    fn draw_template(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: &TemplateLayer,
    ) -> CardResult<()> {
        let paint = self.image_paint_for(&layer.image)?;
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(layer.image.width),
            f64::from(layer.image.height),
        ));
        Ok(())
    }

    // Text problems never fail a composition; the overlay is skipped and logged.
    fn draw_text(&mut self, ctx: &mut vello_cpu::RenderContext, layer: &TextLayer) {
        if layer.text.is_empty() {
            return;
        }
        let Some((family, bytes)) = self.fonts.resolve(&layer.font.family) else {
            tracing::warn!(
                overlay = %layer.overlay_id,
                family = %layer.font.family,
                "no font registered; text overlay skipped"
            );
            return;
        };
        let family = family.to_owned();
        let bytes = Arc::clone(bytes);

        let style = TextStyle {
            size_px: layer.size_px,
            weight: layer.font.weight,
            slant: layer.font.slant,
            brush: layer.color.into(),
        };
        let layout = match self
            .text_engine
            .layout_plain(&layer.text, &family, bytes.as_slice(), style)
        {
            Ok(layout) => layout,
            Err(e) => {
                tracing::warn!(overlay = %layer.overlay_id, error = %e, "text layout failed");
                return;
            }
        };

        let font = self
            .font_cache
            .entry(family)
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                    0,
                )
            })
            .clone();

        let y_shift = match layer.baseline {
            TextBaseline::Top => 0.0,
            TextBaseline::Alphabetic => -f64::from(first_baseline(&layout)),
        };
        let tr = Affine::translate(layer.origin.to_vec2() + Vec2::new(0.0, y_shift));

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(tr));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    fn image_paint_for(&mut self, image: &RasterImage) -> CardResult<vello_cpu::Image> {
        if let Some(paint) = self.image_cache.get(&image.id()) {
            return Ok(paint.clone());
        }

        let pixmap =
            image_premul_bytes_to_pixmap(image.rgba8_premul.as_slice(), image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(image.id(), paint.clone());
        Ok(paint)
    }
}

fn circle_path(c: CirclePx) -> BezPath {
    use kurbo::Shape as _;
    kurbo::Circle::new(c.center, c.radius).to_path(0.1)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> CardResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CardError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CardError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(CardError::render("raster byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
