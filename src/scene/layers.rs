use crate::assets::crop::CropProvider;
use crate::assets::raster::RasterImage;
use crate::foundation::core::{Affine, Canvas, Point, Rgba8};
use crate::scene::geometry::{PhotoPlacement, resolve_photo_placement, resolve_point};
use crate::scene::model::{ClipCircle, FontSpec, Template, TextBaseline, TextOverlay, UserPhoto};

/// Circle in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CirclePx {
    pub center: Point,
    pub radius: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhotoLayer {
    /// Raster actually sampled (already cropped when a crop region is set).
    pub image: RasterImage,
    pub placement: PhotoPlacement,
    pub clip: Option<CirclePx>,
}

impl PhotoLayer {
    pub fn transform(&self) -> Affine {
        self.placement.affine()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TemplateLayer {
    pub image: RasterImage,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLayer {
    pub overlay_id: String,
    /// Content, or the placeholder when the content is empty.
    pub text: String,
    pub origin: Point,
    pub size_px: f32,
    pub font: FontSpec,
    pub color: Rgba8,
    pub baseline: TextBaseline,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Layer {
    Photo(PhotoLayer),
    Template(TemplateLayer),
    Text(TextLayer),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Photo,
    Template,
    Text,
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Photo(_) => LayerKind::Photo,
            Layer::Template(_) => LayerKind::Template,
            Layer::Text(_) => LayerKind::Text,
        }
    }
}

/// Paint-ordered layers plus the canvas they resolve against.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerStack {
    pub canvas: Canvas,
    pub layers: Vec<Layer>,
}

impl LayerStack {
    pub fn kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(Layer::kind).collect()
    }

    pub fn text_layers(&self) -> impl Iterator<Item = &TextLayer> {
        self.layers.iter().filter_map(|l| match l {
            Layer::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn photo_layer(&self) -> Option<&PhotoLayer> {
        self.layers.iter().find_map(|l| match l {
            Layer::Photo(p) => Some(p),
            _ => None,
        })
    }
}

/// Everything the layer model is derived from.
pub struct LayerInputs<'a> {
    pub template: Option<&'a Template>,
    pub photo: Option<&'a UserPhoto>,
    pub overlays: &'a [TextOverlay],
    /// When set, the photo is shown through this circle *above* the template.
    pub clip: Option<ClipCircle>,
    pub crop: &'a dyn CropProvider,
    /// Square output size requested from the crop provider; defaults to the region size.
    pub crop_output_px: Option<u32>,
}

/// Build the ordered layer list, or `None` while no template is loaded.
///
/// Order is `photo → template → overlays` (declaration order). With a clip circle the photo moves
/// above the template: `template → photo → overlays`. Text always stays on top.
pub fn build_layers(inputs: &LayerInputs<'_>) -> Option<LayerStack> {
    let template = inputs.template?;
    let canvas = template.canvas();

    let photo = inputs.photo.and_then(|p| photo_layer(inputs, p, canvas));
    let template_layer = Layer::Template(TemplateLayer {
        image: template.image().clone(),
    });

    let mut layers = Vec::with_capacity(2 + inputs.overlays.len());
    match (photo, inputs.clip.is_some()) {
        (Some(p), false) => {
            layers.push(Layer::Photo(p));
            layers.push(template_layer);
        }
        (Some(p), true) => {
            layers.push(template_layer);
            layers.push(Layer::Photo(p));
        }
        (None, _) => layers.push(template_layer),
    }

    for o in inputs.overlays {
        layers.push(Layer::Text(text_layer(o, canvas)));
    }

    Some(LayerStack { canvas, layers })
}

fn photo_layer(inputs: &LayerInputs<'_>, photo: &UserPhoto, canvas: Canvas) -> Option<PhotoLayer> {
    let image = match photo.transform.crop {
        None => photo.image.clone(),
        Some(region) => {
            let clamped = region.clamp_to(photo.image.width, photo.image.height);
            let Some(clamped) = clamped else {
                tracing::warn!(?region, "crop region misses the photo; photo layer skipped");
                return None;
            };
            let requested = inputs
                .crop_output_px
                .map(|s| (s, s))
                .unwrap_or((clamped.width, clamped.height));
            match inputs.crop.cropped_region(&photo.image, clamped, requested) {
                Ok(img) => img,
                Err(e) => {
                    tracing::warn!(error = %e, "crop provider failed; photo layer skipped");
                    return None;
                }
            }
        }
    };

    let placement = resolve_photo_placement(image.dimensions(), &photo.transform, canvas);
    let clip = inputs.clip.map(|c| CirclePx {
        center: resolve_point(c.center, canvas),
        radius: c.radius * canvas.min_edge(),
    });

    Some(PhotoLayer {
        image,
        placement,
        clip,
    })
}

fn text_layer(o: &TextOverlay, canvas: Canvas) -> TextLayer {
    TextLayer {
        overlay_id: o.id.clone(),
        text: o.display_text().to_owned(),
        origin: resolve_point(o.position, canvas),
        size_px: o.size_px(),
        font: o.font.clone(),
        color: o.color,
        baseline: o.baseline,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/layers.rs"]
mod tests;
