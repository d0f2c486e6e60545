use std::f64::consts::TAU;

use crate::core::{BezPath, Hsla, Point, Rgba8, Vec2, Viewport};
use crate::mapper::{BASE_RADIUS_FACTOR, DrawAttributes, map_attributes};
use crate::settings::RenderSettings;
use crate::signature::Signature;

/// Slate used for the idle glyph.
const IDLE_COLOR: Rgba8 = Rgba8::opaque(100, 116, 139);

/// Violet used for the processing indicator.
const PROCESSING_COLOR: Rgba8 = Rgba8::opaque(139, 92, 246);

const PROCESSING_SPOKES: usize = 8;
const CONTOUR_FILL_ALPHA: f64 = 0.3;
const GLOW_WIDTH_FACTOR: f64 = 3.0;
const GLOW_ALPHA: f64 = 0.25;

/// Which composer path paints the current frame.
///
/// Exactly one state is current at any time; transitions are driven solely
/// by caller inputs, never by internal timers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RenderState {
    /// No signature has ever been supplied.
    #[default]
    Idle,
    /// An analysis request is in flight.
    Processing,
    /// Rendering the supplied signature.
    Active(Signature),
}

/// One 2D drawing command in logical coordinates.
#[derive(Clone, Debug)]
pub enum DrawOp {
    FillPath {
        path: BezPath,
        color: Rgba8,
    },
    StrokePath {
        path: BezPath,
        color: Rgba8,
        width: f64,
    },
    FillCircle {
        center: Point,
        radius: f64,
        color: Rgba8,
    },
    StrokeCircle {
        center: Point,
        radius: f64,
        color: Rgba8,
        width: f64,
    },
    Line {
        from: Point,
        to: Point,
        color: Rgba8,
        width: f64,
    },
}

/// Identifies the visual layer a group of ops belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Idle,
    Processing,
    Contour,
    InnerPattern,
    Particles,
    Glow,
}

/// How a layer combines with what is already painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayerBlend {
    #[default]
    Over,
    /// Saturating per-channel addition on premultiplied pixels.
    Lighten,
}

#[derive(Clone, Debug)]
pub struct Layer {
    pub kind: LayerKind,
    pub blend: LayerBlend,
    pub ops: Vec<DrawOp>,
}

/// Every draw op for one frame, layers in strict z-order.
///
/// Presenting a display list implies clearing the surface first: a frame
/// always repaints everything.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    pub layers: Vec<Layer>,
}

impl DisplayList {
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|l| l.kind == kind)
    }

    pub fn kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(|l| l.kind).collect()
    }

    pub fn op_count(&self) -> usize {
        self.layers.iter().map(|l| l.ops.len()).sum()
    }
}

fn polar(center: Point, angle: f64, radius: f64) -> Point {
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Compose the display list for one frame.
///
/// Pure and deterministic like the mapper: no hidden state, no randomness.
/// The caller clears and repaints the whole surface with the result.
#[tracing::instrument(level = "trace", skip(state, settings))]
pub fn compose_frame(
    state: &RenderState,
    t: f64,
    settings: &RenderSettings,
    viewport: Viewport,
) -> DisplayList {
    let settings = settings.clamped();
    match state {
        RenderState::Idle => DisplayList {
            layers: vec![idle_layer(t, viewport)],
        },
        RenderState::Processing => DisplayList {
            layers: vec![processing_layer(t, viewport)],
        },
        RenderState::Active(signature) => active_list(signature, t, &settings, viewport),
    }
}

/// Low-opacity breathing circle: ready, no input yet.
fn idle_layer(t: f64, viewport: Viewport) -> Layer {
    let center = viewport.center();
    let base = viewport.min_extent() * BASE_RADIUS_FACTOR;
    let radius = base * (1.0 + (t * 0.5).sin() * 0.05);
    let pulse = (t * 0.8).sin() * 0.1;

    Layer {
        kind: LayerKind::Idle,
        blend: LayerBlend::Over,
        ops: vec![
            DrawOp::FillCircle {
                center,
                radius,
                color: IDLE_COLOR.with_alpha(0.2 + pulse),
            },
            DrawOp::StrokeCircle {
                center,
                radius,
                color: IDLE_COLOR.with_alpha(0.5 + pulse),
                width: 2.0,
            },
        ],
    }
}

/// Spinning spokes plus a pulsing central ring. Depends only on time; no
/// signature exists in this state.
fn processing_layer(t: f64, viewport: Viewport) -> Layer {
    let center = viewport.center();
    let base = viewport.min_extent() * BASE_RADIUS_FACTOR;

    let mut ops = Vec::with_capacity(PROCESSING_SPOKES + 1);
    for i in 0..PROCESSING_SPOKES {
        let angle = (i as f64 / PROCESSING_SPOKES as f64) * TAU + t * 3.0;
        let inner = base * 0.5;
        let outer = base * (0.8 + (t * 5.0 + i as f64).sin() * 0.2);
        ops.push(DrawOp::Line {
            from: polar(center, angle, inner),
            to: polar(center, angle, outer),
            color: PROCESSING_COLOR,
            width: 3.0,
        });
    }
    ops.push(DrawOp::StrokeCircle {
        center,
        radius: base * (0.35 + (t * 5.0).sin() * 0.05),
        color: PROCESSING_COLOR.with_alpha(0.8),
        width: 2.0,
    });

    Layer {
        kind: LayerKind::Processing,
        blend: LayerBlend::Over,
        ops,
    }
}

/// The full glyph: contour, then inner pattern, then particles, then glow.
/// Layer order is a strict z-order.
fn active_list(
    signature: &Signature,
    t: f64,
    settings: &RenderSettings,
    viewport: Viewport,
) -> DisplayList {
    let sig = signature.clamped();
    let attrs = map_attributes(&sig, t, settings, viewport);
    let speed = sig.glyph.animation_speed;

    let color = attr_color(&attrs);
    let stroke = color.to_rgba8();
    let fill = color
        .with_alpha((CONTOUR_FILL_ALPHA * settings.intensity).min(1.0))
        .to_rgba8();
    let contour = contour_path(&attrs.vertices);

    let mut layers = vec![Layer {
        kind: LayerKind::Contour,
        blend: LayerBlend::Over,
        ops: vec![
            DrawOp::FillPath {
                path: contour.clone(),
                color: fill,
            },
            DrawOp::StrokePath {
                path: contour.clone(),
                color: stroke,
                width: attrs.stroke_width,
            },
        ],
    }];

    if sig.cognitive_complexity > 0.5 && settings.show_inner_patterns {
        layers.push(inner_pattern_layer(&sig, &attrs, t, speed, settings));
    }

    if sig.energy_level > 0.3 && settings.particle_count > 0 {
        let count = (settings.particle_count as f64 * sig.energy_level).floor() as usize;
        if count > 0 {
            layers.push(particle_layer(&sig, &attrs, t, speed, settings, count));
        }
    }

    if settings.glow_enabled {
        layers.push(Layer {
            kind: LayerKind::Glow,
            blend: LayerBlend::Lighten,
            ops: vec![DrawOp::StrokePath {
                path: contour,
                color: color
                    .with_alpha((GLOW_ALPHA * settings.intensity).min(1.0))
                    .to_rgba8(),
                width: attrs.stroke_width * GLOW_WIDTH_FACTOR,
            }],
        });
    }

    DisplayList { layers }
}

fn contour_path(vertices: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = vertices.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for v in iter {
            path.line_to(*v);
        }
        path.close_path();
    }
    path
}

/// Small arc orbit between 0.3 and 0.7 of the inner radius, advancing with
/// the glyph's animation speed.
fn inner_pattern_layer(
    sig: &Signature,
    attrs: &DrawAttributes,
    t: f64,
    speed: f64,
    settings: &RenderSettings,
) -> Layer {
    let inner_radius = attrs.base_radius * 0.6;
    let count = (sig.cognitive_complexity * 6.0).floor() as usize;
    let color = Rgba8::opaque(255, 255, 255)
        .with_alpha((sig.cognitive_complexity * 0.5 * settings.intensity).min(1.0));

    let mut ops = Vec::with_capacity(count);
    for i in 0..count {
        let frac = i as f64 / count as f64;
        let angle = frac * TAU + t * speed;
        let orbit = inner_radius * (0.3 + frac * 0.4);
        ops.push(DrawOp::StrokeCircle {
            center: polar(attrs.center, angle, orbit * 0.5),
            radius: orbit * 0.3,
            color,
            width: 1.0,
        });
    }

    Layer {
        kind: LayerKind::InnerPattern,
        blend: LayerBlend::Over,
        ops,
    }
}

/// Orbiting points outside the contour, each with its own size and phase.
fn particle_layer(
    sig: &Signature,
    attrs: &DrawAttributes,
    t: f64,
    speed: f64,
    settings: &RenderSettings,
    count: usize,
) -> Layer {
    let orbit = attrs.base_radius * 1.2;
    let color = Hsla::new(
        attrs.hue,
        80.0,
        70.0,
        (sig.energy_level * 0.8 * settings.intensity).min(1.0),
    )
    .to_rgba8();

    let mut ops = Vec::with_capacity(count);
    for i in 0..count {
        let phase = i as f64;
        let angle = (i as f64 / count as f64) * TAU + t * speed * 2.0;
        let distance = orbit + (t * speed * 3.0 + phase).sin() * 20.0;
        // 1 + sin*2 can dip below zero; a radius floor keeps the op valid.
        let size = (1.0 + (t * speed * 4.0 + phase).sin() * 2.0).max(0.1);
        ops.push(DrawOp::FillCircle {
            center: polar(attrs.center, angle, distance),
            radius: size,
            color,
        });
    }

    Layer {
        kind: LayerKind::Particles,
        blend: LayerBlend::Over,
        ops,
    }
}

fn attr_color(attrs: &DrawAttributes) -> Hsla {
    Hsla::new(attrs.hue, attrs.saturation, attrs.lightness, 1.0)
}
